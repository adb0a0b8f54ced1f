//! Dispatcher module for the persistor.
//!
//! Turns one inbound message into at most one document-store call and exactly
//! one reply. Malformed messages are answered without touching the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use persistor_repository::{DocumentStoreError, DocumentStoreService, IndexCreation};
use persistor_shared::{Action, CreateIndexRequest, IndexRequest, Reply};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::bus::InboundMessage;

/// Running totals for messages handled since startup.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    /// Messages received.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Messages answered with a success reply.
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Messages answered with an error reply.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Validates inbound messages and forwards them to the document store.
///
/// Holds no mutable state besides counters, so one instance is shared by
/// every in-flight message.
pub struct Dispatcher {
    service: Arc<DocumentStoreService>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a new dispatcher over the given service.
    pub fn new(service: Arc<DocumentStoreService>) -> Self {
        Self {
            service,
            stats: DispatchStats::default(),
        }
    }

    /// Counters for messages handled so far.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Compute the reply for one message body.
    ///
    /// # Returns
    ///
    /// * `Reply::Ok` - The store's decoded response
    /// * `Reply::Error` - Missing or unsupported action, invalid fields, or a
    ///   failed store call
    pub async fn dispatch(&self, body: &Value) -> Reply {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let reply = match self.route(body).await {
            Ok(result) => Reply::ok(result),
            Err(e) => {
                log_failure(&e);
                Reply::error(e.to_string())
            }
        };

        if reply.is_ok() {
            self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
        }
        reply
    }

    /// Dispatch a message and send its reply.
    #[instrument(skip(self, message))]
    pub async fn handle(&self, message: InboundMessage) {
        let InboundMessage { body, reply_to } = message;
        let reply = self.dispatch(&body).await;

        if let Err(e) = reply_to.send_reply(reply).await {
            warn!(error = %e, "Failed to deliver reply");
        }
    }

    /// Ensure each startup index exists, creating the missing ones.
    ///
    /// Failures are logged and do not stop the remaining indices or startup.
    #[instrument(skip(self, indices), fields(count = indices.len()))]
    pub async fn create_indices(&self, indices: &[CreateIndexRequest]) {
        for request in indices {
            self.create_index(request).await;
        }
    }

    /// Ensure one startup index exists and log the outcome.
    pub async fn create_index(&self, request: &CreateIndexRequest) {
        match self.service.ensure_index(request).await {
            Ok(IndexCreation::AlreadyExists) => {
                info!(index = %request.index, "Index already exists");
            }
            Ok(IndexCreation::Created(response)) => {
                info!(index = %request.index, response = %response, "Created index");
            }
            Err(e) => {
                error!(
                    index = %request.index,
                    kind = e.kind(),
                    error = %e,
                    "Failed to create index"
                );
            }
        }
    }

    async fn route(&self, body: &Value) -> Result<Value, DocumentStoreError> {
        let action = body
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentStoreError::validation("action must be specified"))?;

        match Action::from_name(action) {
            Some(Action::Index) => {
                let request = parse_index_request(body)?;
                debug!(
                    index = %request.index,
                    doc_type = %request.doc_type,
                    id = ?request.id,
                    "Dispatching index request"
                );
                self.service.index_document(&request).await
            }
            None => Err(DocumentStoreError::validation(format!(
                "unsupported action specified: {}",
                action
            ))),
        }
    }
}

fn log_failure(e: &DocumentStoreError) {
    match e {
        DocumentStoreError::ValidationError(_) => {
            warn!(kind = e.kind(), error = %e, "Rejected message");
        }
        DocumentStoreError::DecodingError { status, .. } => {
            error!(kind = e.kind(), status = status, error = %e, "Unreadable document-store response");
        }
        DocumentStoreError::TransportError { status, .. } => {
            error!(kind = e.kind(), status = status, error = %e, "Document-store request failed");
        }
        _ => {
            error!(kind = e.kind(), error = %e, "Document-store request failed");
        }
    }
}

/// Extract an index request from a message body.
///
/// `index`, `type` and `object` are required; `id` is optional and `null` is
/// treated as absent.
fn parse_index_request(body: &Value) -> Result<IndexRequest, DocumentStoreError> {
    let fields = body
        .as_object()
        .ok_or_else(|| DocumentStoreError::validation("message body must be a JSON object"))?;

    let index = required_str(fields, "index")?;
    let doc_type = required_str(fields, "type")?;

    let object = match fields.get("object") {
        Some(object @ Value::Object(_)) => object.clone(),
        Some(Value::Null) | None => {
            return Err(DocumentStoreError::validation("object must be specified"))
        }
        Some(_) => return Err(DocumentStoreError::validation("object must be a JSON object")),
    };

    match fields.get("id") {
        Some(Value::String(id)) => Ok(IndexRequest::upsert(index, doc_type, id.as_str(), object)),
        Some(Value::Null) | None => Ok(IndexRequest::create(index, doc_type, object)),
        Some(_) => Err(DocumentStoreError::validation("id must be a string")),
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str, DocumentStoreError> {
    match fields.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(Value::Null) | None => Err(DocumentStoreError::validation(format!(
            "{} must be specified",
            name
        ))),
        Some(_) => Err(DocumentStoreError::validation(format!(
            "{} must be a string",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use persistor_repository::{DocumentStoreTransport, OutboundCall, TransportResponse};
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport that answers every call with the same response.
    struct FixedTransport {
        status: u16,
        reason: &'static str,
        body: &'static str,
        calls: Mutex<Vec<OutboundCall>>,
    }

    impl FixedTransport {
        fn new(status: u16, reason: &'static str, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                reason,
                body,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DocumentStoreTransport for FixedTransport {
        async fn send(&self, call: OutboundCall) -> Result<TransportResponse, DocumentStoreError> {
            self.calls.lock().unwrap().push(call);
            Ok(TransportResponse::new(
                self.status,
                Some(self.reason.to_string()),
                self.body,
            ))
        }
    }

    fn dispatcher(transport: Arc<FixedTransport>) -> Dispatcher {
        Dispatcher::new(Arc::new(DocumentStoreService::new(transport)))
    }

    #[test]
    fn test_parse_index_request() {
        let request = parse_index_request(&json!({
            "action": "index",
            "index": "users",
            "type": "profile",
            "id": "42",
            "object": {"name": "Ada"}
        }))
        .unwrap();

        assert_eq!(
            request,
            IndexRequest::upsert("users", "profile", "42", json!({"name": "Ada"}))
        );
    }

    #[test]
    fn test_parse_index_request_null_id_is_absent() {
        let request = parse_index_request(&json!({
            "index": "users",
            "type": "profile",
            "id": null,
            "object": {}
        }))
        .unwrap();

        assert!(request.id.is_none());
    }

    #[test]
    fn test_parse_index_request_names_missing_field() {
        let err = parse_index_request(&json!({"type": "profile", "object": {}})).unwrap_err();
        assert_eq!(err.to_string(), "index must be specified");

        let err = parse_index_request(&json!({"index": "users", "object": {}})).unwrap_err();
        assert_eq!(err.to_string(), "type must be specified");

        let err = parse_index_request(&json!({"index": "users", "type": "profile"})).unwrap_err();
        assert_eq!(err.to_string(), "object must be specified");
    }

    #[test]
    fn test_parse_index_request_rejects_wrong_types() {
        let err = parse_index_request(&json!({"index": 7, "type": "t", "object": {}})).unwrap_err();
        assert_eq!(err.to_string(), "index must be a string");

        let err =
            parse_index_request(&json!({"index": "i", "type": "t", "id": 42, "object": {}}))
                .unwrap_err();
        assert_eq!(err.to_string(), "id must be a string");

        let err =
            parse_index_request(&json!({"index": "i", "type": "t", "object": [1, 2]})).unwrap_err();
        assert_eq!(err.to_string(), "object must be a JSON object");
    }

    #[tokio::test]
    async fn test_missing_action() {
        let transport = FixedTransport::new(201, "Created", "{}");
        let dispatcher = dispatcher(transport.clone());

        let reply = dispatcher.dispatch(&json!({"index": "users"})).await;

        assert_eq!(reply, Reply::error("action must be specified"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_object_body() {
        let transport = FixedTransport::new(201, "Created", "{}");
        let dispatcher = dispatcher(transport.clone());

        let reply = dispatcher.dispatch(&Value::Null).await;

        assert_eq!(reply, Reply::error("action must be specified"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let transport = FixedTransport::new(201, "Created", "{}");
        let dispatcher = dispatcher(transport.clone());

        let reply = dispatcher
            .dispatch(&json!({"action": "delete", "index": "users"}))
            .await;

        assert_eq!(reply, Reply::error("unsupported action specified: delete"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_index_success_counts() {
        let transport = FixedTransport::new(201, "Created", r#"{"_id":"42","_version":1}"#);
        let dispatcher = dispatcher(transport.clone());

        let reply = dispatcher
            .dispatch(&json!({
                "action": "index",
                "index": "users",
                "type": "profile",
                "id": "42",
                "object": {"name": "Ada"}
            }))
            .await;

        assert_eq!(reply, Reply::ok(json!({"_id": "42", "_version": 1})));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(dispatcher.stats().received(), 1);
        assert_eq!(dispatcher.stats().succeeded(), 1);
        assert_eq!(dispatcher.stats().failed(), 0);
    }

    #[tokio::test]
    async fn test_decoding_failure_is_error_reply() {
        let transport = FixedTransport::new(200, "OK", "<html></html>");
        let dispatcher = dispatcher(transport);

        let reply = dispatcher
            .dispatch(&json!({
                "action": "index",
                "index": "users",
                "type": "profile",
                "object": {}
            }))
            .await;

        assert!(!reply.is_ok());
        assert!(reply
            .error_message()
            .unwrap()
            .starts_with("error indexing object: invalid JSON in 200 response"));
        assert_eq!(dispatcher.stats().failed(), 1);
    }
}
