//! OpenSearch implementation of the document-store transport.
//!
//! This module provides a concrete implementation of `DocumentStoreTransport`
//! using the OpenSearch client's raw request API.

mod transport;

pub use transport::OpenSearchTransport;
