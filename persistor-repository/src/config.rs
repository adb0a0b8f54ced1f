//! Configuration types for the document-store transport.

use std::time::Duration;

/// Default document-store host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default document-store port.
pub const DEFAULT_PORT: u16 = 9200;

/// Configuration for the document-store transport.
///
/// The transport is bound to a single host and port over plain HTTP with
/// persistent connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Document-store host name.
    pub host: String,
    /// Document-store port.
    pub port: u16,
    /// Per-request timeout.
    ///
    /// `None` (the default) waits indefinitely; a hung response then leaves the
    /// original requester waiting too.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: None,
        }
    }
}

impl TransportConfig {
    /// Create a config for the given host and port with no request timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            request_timeout: None,
        }
    }

    /// Set a per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Base URL of the document store.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
