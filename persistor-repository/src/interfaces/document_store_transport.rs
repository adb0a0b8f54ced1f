//! Document-store transport trait definition.
//!
//! This module defines the abstract interface for sending one HTTP call to the
//! document store, allowing for different client implementations and for
//! scripted fakes in tests.

use async_trait::async_trait;

use crate::errors::DocumentStoreError;
use crate::types::{OutboundCall, TransportResponse};

/// Abstracts the HTTP client bound to the document store.
///
/// Implementations are injected into `DocumentStoreService`. They must be safe
/// for concurrent use: many inbound messages may have a call in flight at once
/// and the service holds no lock around `send`.
///
/// A transport only moves bytes. It returns every response it receives,
/// whatever the status, with the body fully buffered; classification is left
/// to the response interpreter.
#[async_trait]
pub trait DocumentStoreTransport: Send + Sync {
    /// Send one call and wait for the complete response.
    ///
    /// # Returns
    ///
    /// * `Ok(TransportResponse)` - Status, status text and full body
    /// * `Err(DocumentStoreError::ConnectionError)` - If no response was received
    async fn send(&self, call: OutboundCall) -> Result<TransportResponse, DocumentStoreError>;
}
