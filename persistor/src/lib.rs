//! # Persistor
//!
//! Serves document-store requests arriving on a message bus. Each inbound
//! message is validated, translated into one HTTP call against an
//! Elasticsearch-compatible store, and answered with exactly one reply.
//!
//! ## Architecture
//!
//! 1. **Bus**: Delivers inbound messages and carries replies back
//! 2. **Dispatcher**: Validates messages and calls the document-store service
//! 3. **Orchestrator**: Runs the serve loop and handles shutdown
//!
//! ## Modules
//!
//! - [`bus`]: Local and Kafka message buses
//! - [`config`]: Configuration loading and dependency wiring
//! - [`dispatcher`]: Per-message validation and dispatch
//! - [`orchestrator`]: Serve loop
//! - [`errors`]: Bus error types

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod orchestrator;

pub use config::{Dependencies, PersistorConfig};
pub use errors::BusError;

use persistor_repository::DocumentStoreError;
use thiserror::Error;

/// Errors that can occur during persistor initialization or execution.
#[derive(Error, Debug)]
pub enum PersistorError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Message bus error.
    #[error("Bus error: {0}")]
    BusError(#[from] BusError),

    /// Document-store error.
    #[error("Document store error: {0}")]
    DocumentStoreError(#[from] DocumentStoreError),
}

impl PersistorError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
