//! # Persistor Shared
//!
//! This crate defines the data structures exchanged between the message bus,
//! the dispatcher and the document-store repository: inbound requests,
//! startup index definitions and the reply sent back to a requester.

pub mod types;

pub use types::action::Action;
pub use types::create_index_request::CreateIndexRequest;
pub use types::index_request::IndexRequest;
pub use types::reply::Reply;
