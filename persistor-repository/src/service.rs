//! Document-store service implementation.
//!
//! This module provides the service that turns requests into outbound calls,
//! sends them through a `DocumentStoreTransport` and interprets the responses.
//! Each operation issues exactly one HTTP call, except `ensure_index` which
//! checks before creating.

use std::sync::Arc;

use persistor_shared::{CreateIndexRequest, IndexRequest};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::errors::DocumentStoreError;
use crate::interfaces::DocumentStoreTransport;
use crate::response;
use crate::types::{HttpMethod, IndexCreation, OutboundCall};
use crate::uri;

/// Failure context for document indexing.
pub const INDEX_CONTEXT: &str = "error indexing object";

/// Failure context for index creation.
pub const CREATE_INDEX_CONTEXT: &str = "error creating index";

/// Failure context for the index existence check.
pub const INDEX_EXISTS_CONTEXT: &str = "error checking index";

/// The service for talking to the document store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use persistor_repository::{DocumentStoreService, OpenSearchTransport, TransportConfig};
/// use persistor_shared::IndexRequest;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = OpenSearchTransport::new(&TransportConfig::default())?;
/// let service = DocumentStoreService::new(Arc::new(transport));
///
/// let request = IndexRequest::upsert("users", "profile", "42", json!({"name": "Ada"}));
/// let stored = service.index_document(&request).await?;
/// println!("{}", stored["_version"]);
/// # Ok(())
/// # }
/// ```
pub struct DocumentStoreService {
    transport: Arc<dyn DocumentStoreTransport>,
}

impl DocumentStoreService {
    /// Create a new service over the given transport.
    pub fn new(transport: Arc<dyn DocumentStoreTransport>) -> Self {
        Self { transport }
    }

    /// Build the call that stores a document.
    ///
    /// `POST {index}/{type}` when the request has no id, `PUT
    /// {index}/{type}/{id}` when it does. The body is the document's JSON.
    pub fn index_call(request: &IndexRequest) -> Result<OutboundCall, DocumentStoreError> {
        let method = if request.is_upsert() {
            HttpMethod::Put
        } else {
            HttpMethod::Post
        };
        let path = uri::document_uri(&request.index, &request.doc_type, request.id.as_deref());

        OutboundCall::new(method, path).with_json_body(&request.object)
    }

    /// Build the call that creates an index: always `POST {index}`.
    ///
    /// The body is the settings document, or `{}` when none is configured.
    pub fn create_index_call(request: &CreateIndexRequest) -> Result<OutboundCall, DocumentStoreError> {
        let call = OutboundCall::new(HttpMethod::Post, uri::index_uri(&request.index));

        match &request.configuration {
            Some(configuration) => call.with_json_body(configuration),
            None => call.with_json_body(&json!({})),
        }
    }

    /// Store one document.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The store's decoded response, typically id and version metadata
    /// * `Err(DocumentStoreError)` - Encoding, connection, transport or decoding failure
    #[instrument(skip(self, request), fields(index = %request.index, doc_type = %request.doc_type, id = ?request.id))]
    pub async fn index_document(&self, request: &IndexRequest) -> Result<Value, DocumentStoreError> {
        let call = Self::index_call(request)?;
        debug!(method = %call.method, path = %call.path, "Indexing document");

        let response = self.transport.send(call).await?;
        response::interpret(INDEX_CONTEXT, &response)
    }

    /// Create an index without checking whether it exists.
    #[instrument(skip(self, request), fields(index = %request.index))]
    pub async fn create_index(&self, request: &CreateIndexRequest) -> Result<Value, DocumentStoreError> {
        let call = Self::create_index_call(request)?;
        debug!(path = %call.path, "Creating index");

        let response = self.transport.send(call).await?;
        response::interpret(CREATE_INDEX_CONTEXT, &response)
    }

    /// Check whether an index exists with `HEAD {index}`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Success status
    /// * `Ok(false)` - 404
    /// * `Err(DocumentStoreError)` - Any other status, or a connection failure
    pub async fn index_exists(&self, index: &str) -> Result<bool, DocumentStoreError> {
        let call = OutboundCall::new(HttpMethod::Head, uri::index_uri(index));
        let response = self.transport.send(call).await?;

        match response.status {
            status if response::is_success(status) => Ok(true),
            404 => Ok(false),
            status => Err(DocumentStoreError::transport(
                INDEX_EXISTS_CONTEXT,
                status,
                response.reason.as_deref(),
            )),
        }
    }

    /// Create an index unless it already exists.
    pub async fn ensure_index(
        &self,
        request: &CreateIndexRequest,
    ) -> Result<IndexCreation, DocumentStoreError> {
        if self.index_exists(&request.index).await? {
            debug!(index = %request.index, "Index already exists");
            return Ok(IndexCreation::AlreadyExists);
        }

        self.create_index(request).await.map(IndexCreation::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransportResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Transport that answers from a script and records every call.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse, DocumentStoreError>>>,
        calls: Mutex<Vec<OutboundCall>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse, DocumentStoreError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn answering(status: u16, reason: &str, body: &str) -> Self {
            Self::new(vec![Ok(TransportResponse::new(
                status,
                Some(reason.to_string()),
                body.as_bytes(),
            ))])
        }
    }

    #[async_trait]
    impl DocumentStoreTransport for ScriptedTransport {
        async fn send(&self, call: OutboundCall) -> Result<TransportResponse, DocumentStoreError> {
            self.calls.lock().await.push(call);
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(DocumentStoreError::connection("script exhausted")))
        }
    }

    #[test]
    fn test_index_call_without_id_posts() {
        let request = IndexRequest::create("users", "profile", json!({"name": "Ada"}));
        let call = DocumentStoreService::index_call(&request).unwrap();

        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.path, "users/profile");
        assert_eq!(call.body.unwrap().bytes, br#"{"name":"Ada"}"#.to_vec());
    }

    #[test]
    fn test_index_call_with_id_puts() {
        let request = IndexRequest::upsert("users", "profile", "42", json!({"name": "Ada"}));
        let call = DocumentStoreService::index_call(&request).unwrap();

        assert_eq!(call.method, HttpMethod::Put);
        assert_eq!(call.path, "users/profile/42");
    }

    #[test]
    fn test_create_index_call_posts_settings() {
        let settings = json!({"settings": {"number_of_shards": 1}});
        let request = CreateIndexRequest::with_configuration("users", settings.clone());
        let call = DocumentStoreService::create_index_call(&request).unwrap();

        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.path, "users");
        let sent: Value = serde_json::from_slice(&call.body.unwrap().bytes).unwrap();
        assert_eq!(sent, settings);
    }

    #[test]
    fn test_create_index_call_without_settings_sends_empty_object() {
        let call = DocumentStoreService::create_index_call(&CreateIndexRequest::new("logs")).unwrap();
        assert_eq!(call.body.unwrap().bytes, b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_index_document_returns_store_body() {
        let transport = Arc::new(ScriptedTransport::answering(
            201,
            "Created",
            r#"{"_id":"42","_version":1}"#,
        ));
        let service = DocumentStoreService::new(transport.clone());

        let request = IndexRequest::upsert("users", "profile", "42", json!({"name": "Ada"}));
        let result = service.index_document(&request).await.unwrap();

        assert_eq!(result, json!({"_id": "42", "_version": 1}));
        let calls = transport.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Put);
    }

    #[tokio::test]
    async fn test_index_document_conflict() {
        let transport = Arc::new(ScriptedTransport::answering(409, "Conflict", "{}"));
        let service = DocumentStoreService::new(transport);

        let request = IndexRequest::upsert("users", "profile", "42", json!({}));
        let err = service.index_document(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "error indexing object: 409 Conflict");
    }

    #[tokio::test]
    async fn test_connection_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(
            DocumentStoreError::connection("connection refused"),
        )]));
        let service = DocumentStoreService::new(transport);

        let request = IndexRequest::create("users", "profile", json!({}));
        let err = service.index_document(&request).await.unwrap_err();

        assert_eq!(err.kind(), "connection");
    }

    #[tokio::test]
    async fn test_index_exists() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(TransportResponse::new(200, Some("OK".to_string()), "")),
            Ok(TransportResponse::new(404, Some("Not Found".to_string()), "")),
            Ok(TransportResponse::new(
                503,
                Some("Service Unavailable".to_string()),
                "",
            )),
        ]));
        let service = DocumentStoreService::new(transport.clone());

        assert!(service.index_exists("users").await.unwrap());
        assert!(!service.index_exists("users").await.unwrap());
        let err = service.index_exists("users").await.unwrap_err();
        assert_eq!(err.to_string(), "error checking index: 503 Service Unavailable");

        let calls = transport.calls.lock().await;
        assert!(calls.iter().all(|c| c.method == HttpMethod::Head && c.body.is_none()));
    }

    #[tokio::test]
    async fn test_ensure_index_skips_existing() {
        let transport = Arc::new(ScriptedTransport::answering(200, "OK", ""));
        let service = DocumentStoreService::new(transport.clone());

        let outcome = service
            .ensure_index(&CreateIndexRequest::new("users"))
            .await
            .unwrap();

        assert_eq!(outcome, IndexCreation::AlreadyExists);
        assert_eq!(transport.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_index_creates_missing() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(TransportResponse::new(404, Some("Not Found".to_string()), "")),
            Ok(TransportResponse::new(
                200,
                Some("OK".to_string()),
                r#"{"acknowledged":true,"index":"users"}"#,
            )),
        ]));
        let service = DocumentStoreService::new(transport.clone());

        let outcome = service
            .ensure_index(&CreateIndexRequest::new("users"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            IndexCreation::Created(json!({"acknowledged": true, "index": "users"}))
        );
        let calls = transport.calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].method, HttpMethod::Post);
        assert_eq!(calls[1].path, "users");
    }
}
