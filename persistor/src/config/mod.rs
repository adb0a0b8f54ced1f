//! Configuration loading for the persistor.
//!
//! An optional JSON file provides the base configuration; environment
//! variables override individual keys.

mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::path::Path;
use std::time::Duration;

use persistor_repository::config::{DEFAULT_HOST, DEFAULT_PORT};
use persistor_repository::TransportConfig;
use persistor_shared::CreateIndexRequest;
use serde::Deserialize;

use crate::bus::{KafkaConfig, DEFAULT_KAFKA_BROKER, DEFAULT_KAFKA_GROUP_ID};
use crate::PersistorError;

/// Which bus the persistor serves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    /// In-process channel bus. Only reachable when the persistor is embedded.
    Local,
    /// Kafka topics.
    #[default]
    Kafka,
}

impl BusKind {
    fn parse(value: &str) -> Result<Self, PersistorError> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "kafka" => Ok(Self::Kafka),
            other => Err(PersistorError::config(format!(
                "invalid BUS_KIND '{}', expected 'local' or 'kafka'",
                other
            ))),
        }
    }
}

/// Message bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Bus implementation.
    pub kind: BusKind,
    /// Kafka broker addresses.
    pub broker: String,
    /// Kafka consumer group ID.
    pub group_id: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            kind: BusKind::default(),
            broker: DEFAULT_KAFKA_BROKER.to_string(),
            group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
        }
    }
}

impl BusConfig {
    /// Kafka connection settings, with SASL credentials read from the environment.
    pub fn kafka(&self) -> KafkaConfig {
        KafkaConfig::new(&self.broker, &self.group_id).with_env_credentials()
    }
}

/// Persistor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistorConfig {
    /// Document-store host.
    pub host: String,
    /// Document-store port.
    pub port: u16,
    /// Bus address the persistor serves.
    pub address: String,
    /// Indices to ensure at startup.
    pub indices: Vec<CreateIndexRequest>,
    /// Per-request timeout for document-store calls.
    pub request_timeout: Option<Duration>,
    /// Bus settings.
    pub bus: BusConfig,
}

/// Shape of the JSON configuration file. Every key is optional here;
/// `address` is checked once overrides are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    address: Option<String>,
    #[serde(default)]
    indices: Vec<CreateIndexRequest>,
    request_timeout_secs: Option<u64>,
}

impl PersistorConfig {
    /// Create a config with default host and port serving `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            address: address.into(),
            indices: Vec::new(),
            request_timeout: None,
            bus: BusConfig::default(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `PERSISTOR_CONFIG`: Path to a JSON config file (optional)
    /// - `DOCUMENT_STORE_HOST`: Document-store host (default: localhost)
    /// - `DOCUMENT_STORE_PORT`: Document-store port (default: 9200)
    /// - `BUS_ADDRESS`: Bus address to serve (required unless set in the file)
    /// - `BUS_KIND`: "kafka" or "local" (default: kafka)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: persistor)
    /// - `REQUEST_TIMEOUT_SECS`: Document-store request timeout (default: none)
    ///
    /// # Returns
    ///
    /// * `Ok(PersistorConfig)` - Loaded configuration
    /// * `Err(PersistorError)` - If the file is unreadable or a value is invalid
    pub fn from_env() -> Result<Self, PersistorError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a JSON file without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PersistorError> {
        let file = read_file(path.as_ref())?;
        Self::resolve(file, |_| None)
    }

    /// Load configuration using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup("PERSISTOR_CONFIG") {
            Some(path) => read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };
        Self::resolve(file, lookup)
    }

    /// Transport settings for the document store.
    pub fn transport(&self) -> TransportConfig {
        let config = TransportConfig::new(&self.host, self.port);
        match self.request_timeout {
            Some(timeout) => config.with_request_timeout(timeout),
            None => config,
        }
    }

    /// Check that the configured bus can receive messages from outside the
    /// process. The in-process bus has no publisher in the standalone binary.
    pub fn ensure_standalone(&self) -> Result<(), PersistorError> {
        match self.bus.kind {
            BusKind::Kafka => Ok(()),
            BusKind::Local => Err(PersistorError::config(
                "local bus is only available when embedding the persistor",
            )),
        }
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, PersistorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("DOCUMENT_STORE_HOST")
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("DOCUMENT_STORE_PORT") {
            Some(value) => value.parse::<u16>().map_err(|e| {
                PersistorError::config(format!("invalid DOCUMENT_STORE_PORT '{}': {}", value, e))
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let address = lookup("BUS_ADDRESS")
            .or(file.address)
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| PersistorError::config("bus address must be specified"))?;

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(value) => Some(value.parse::<u64>().map_err(|e| {
                PersistorError::config(format!("invalid REQUEST_TIMEOUT_SECS '{}': {}", value, e))
            })?),
            None => file.request_timeout_secs,
        };

        let kind = match lookup("BUS_KIND") {
            Some(value) => BusKind::parse(&value)?,
            None => BusKind::default(),
        };

        let bus = BusConfig {
            kind,
            broker: lookup("KAFKA_BROKER").unwrap_or_else(|| DEFAULT_KAFKA_BROKER.to_string()),
            group_id: lookup("KAFKA_GROUP_ID")
                .unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_string()),
        };

        Ok(Self {
            host,
            port,
            address,
            indices: file.indices,
            request_timeout: request_timeout_secs.map(Duration::from_secs),
            bus,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, PersistorError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        PersistorError::config(format!("failed to read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        PersistorError::config(format!("invalid config file {}: {}", path.display(), e))
    })
}
