//! Interface definitions for the document-store transport.
//!
//! This module defines the abstract `DocumentStoreTransport` trait that allows
//! for dependency injection and scripted fakes in tests.

mod document_store_transport;

pub use document_store_transport::DocumentStoreTransport;
