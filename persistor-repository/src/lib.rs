//! # Persistor Repository
//!
//! This crate translates document-store requests into HTTP calls and HTTP
//! responses back into outcomes. It includes the URI builder, the JSON request
//! encoder, the response interpreter, the transport abstraction and a concrete
//! transport built on the OpenSearch client.

pub mod config;
pub mod encoding;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod response;
pub mod service;
pub mod types;
pub mod uri;

pub use config::TransportConfig;
pub use errors::DocumentStoreError;
pub use interfaces::DocumentStoreTransport;
pub use opensearch::OpenSearchTransport;
pub use service::DocumentStoreService;
pub use types::{EncodedBody, HttpMethod, IndexCreation, OutboundCall, TransportResponse};
