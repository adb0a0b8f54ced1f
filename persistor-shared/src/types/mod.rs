//! This module defines the core data structures shared across the persistor.
//! It re-exports the request, action and reply types.

pub mod action;
pub mod create_index_request;
pub mod index_request;
pub mod reply;

pub use action::Action;
pub use create_index_request::CreateIndexRequest;
pub use index_request::IndexRequest;
pub use reply::Reply;
