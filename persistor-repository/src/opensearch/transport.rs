//! OpenSearch transport implementation.
//!
//! This module provides the concrete implementation of `DocumentStoreTransport`
//! using the OpenSearch Rust crate's raw request API, which works against any
//! Elasticsearch-compatible HTTP document store.

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::{HeaderMap, HeaderName, HeaderValue},
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method,
    },
    OpenSearch,
};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::TransportConfig;
use crate::errors::DocumentStoreError;
use crate::interfaces::DocumentStoreTransport;
use crate::types::{HttpMethod, OutboundCall, TransportResponse};

/// OpenSearch-client transport.
///
/// Holds one client bound to a single node. The client pools keep-alive
/// connections and is shared by every in-flight call.
///
/// # Example
///
/// ```ignore
/// use persistor_repository::{OpenSearchTransport, TransportConfig};
///
/// let transport = OpenSearchTransport::new(&TransportConfig::new("localhost", 9200))?;
/// ```
pub struct OpenSearchTransport {
    client: OpenSearch,
    request_timeout: Option<Duration>,
}

impl OpenSearchTransport {
    /// Create a transport bound to the configured host and port.
    ///
    /// No connection is opened until the first call.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchTransport)` - A new transport instance
    /// * `Err(DocumentStoreError)` - If the URL is invalid or the client cannot be built
    pub fn new(config: &TransportConfig) -> Result<Self, DocumentStoreError> {
        let url = config.base_url();
        let parsed_url =
            Url::parse(&url).map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        info!(
            url = %url,
            request_timeout_ms = config.request_timeout.map(|t| t.as_millis() as u64),
            "Created document-store transport"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            request_timeout: config.request_timeout,
        })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Post => Method::Post,
            HttpMethod::Put => Method::Put,
            HttpMethod::Head => Method::Head,
        }
    }

    fn header_map(call: &OutboundCall) -> Result<HeaderMap, DocumentStoreError> {
        let mut headers = HeaderMap::new();
        for (name, value) in call.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DocumentStoreError::encoding(e.to_string()))?;
            let value =
                HeaderValue::from_str(&value).map_err(|e| DocumentStoreError::encoding(e.to_string()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl DocumentStoreTransport for OpenSearchTransport {
    async fn send(&self, call: OutboundCall) -> Result<TransportResponse, DocumentStoreError> {
        let headers = Self::header_map(&call)?;
        let method = Self::method(call.method);
        let body: Option<Vec<u8>> = call.body.map(|body| body.bytes);

        debug!(method = %call.method, path = %call.path, "Sending document-store request");

        let response = self
            .client
            .send(
                method,
                &call.path,
                headers,
                Option::<&()>::None,
                body,
                self.request_timeout,
            )
            .await
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        let status = response.status_code();
        let reason = status.canonical_reason().map(str::to_string);

        // Buffer the whole body before anything is interpreted.
        let text = response
            .text()
            .await
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        debug!(
            method = %call.method,
            path = %call.path,
            status = status.as_u16(),
            body_len = text.len(),
            "Received document-store response"
        );

        Ok(TransportResponse::new(status.as_u16(), reason, text.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_json;
    use serde_json::json;

    #[test]
    fn test_header_map_for_body() {
        let body = encode_json(&json!({"name": "Zoë"})).unwrap();
        let length = body.content_length();
        let call = OutboundCall::new(HttpMethod::Post, "users/profile").with_body(body);

        let headers = OpenSearchTransport::header_map(&call).unwrap();

        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(
            headers.get("content-length").unwrap(),
            length.to_string().as_str()
        );
    }

    #[test]
    fn test_header_map_without_body() {
        let call = OutboundCall::new(HttpMethod::Head, "users");
        assert!(OpenSearchTransport::header_map(&call).unwrap().is_empty());
    }

    #[test]
    fn test_new_does_not_connect() {
        let transport = OpenSearchTransport::new(&TransportConfig::new("localhost", 1));
        assert!(transport.is_ok());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(OpenSearchTransport::method(HttpMethod::Post), Method::Post);
        assert_eq!(OpenSearchTransport::method(HttpMethod::Put), Method::Put);
        assert_eq!(OpenSearchTransport::method(HttpMethod::Head), Method::Head);
    }
}
