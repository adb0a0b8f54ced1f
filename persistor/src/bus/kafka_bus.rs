//! Kafka message bus.
//!
//! Consumes JSON requests from the topic named by the bus address and produces
//! each reply to the topic named in the request's `reply_to` header, echoing
//! its `correlation_id` header.

use async_trait::async_trait;
use persistor_shared::Reply;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::{Header, Headers, Message as KafkaMessage, OwnedHeaders},
    producer::{BaseProducer, BaseRecord, Producer},
};
use serde_json::Value;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{InboundMessage, MessageSource, ReplyChannel, CORRELATION_ID_HEADER, REPLY_TO_HEADER};
use crate::errors::BusError;

/// Default Kafka broker address.
pub const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
pub const DEFAULT_KAFKA_GROUP_ID: &str = "persistor";

/// How long pending replies may take to flush when the bus is dropped.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings shared by the request consumer and the reply producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    /// Kafka broker addresses (comma-separated)
    pub broker: String,
    /// Consumer group ID
    pub group_id: String,
    /// SASL username (enables SASL/SSL if set)
    pub username: Option<String>,
    /// SASL password (required if username is set)
    pub password: Option<String>,
    /// Custom CA certificate in PEM format
    pub ssl_ca_pem: Option<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_KAFKA_BROKER, DEFAULT_KAFKA_GROUP_ID)
    }
}

impl KafkaConfig {
    /// Create a plaintext config for the given broker and group.
    pub fn new(broker: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            group_id: group_id.into(),
            username: None,
            password: None,
            ssl_ca_pem: None,
        }
    }

    /// Read SASL credentials from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_USERNAME` - SASL username (optional)
    /// - `KAFKA_PASSWORD` - SASL password (optional)
    /// - `KAFKA_SSL_CA_PEM` - Custom CA cert in PEM format (optional)
    pub fn with_env_credentials(mut self) -> Self {
        self.username = env::var("KAFKA_USERNAME").ok();
        self.password = env::var("KAFKA_PASSWORD").ok();
        self.ssl_ca_pem = env::var("KAFKA_SSL_CA_PEM").ok();
        self
    }

    fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config.set("bootstrap.servers", &self.broker);

        // SASL/SSL for managed Kafka, plaintext otherwise
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            client_config
                .set("security.protocol", "SASL_SSL")
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);

            if let Some(ca_pem) = &self.ssl_ca_pem {
                client_config.set("ssl.ca.pem", ca_pem);
            }
        }

        client_config
    }
}

/// Kafka-backed message source.
pub struct KafkaBus {
    consumer: StreamConsumer,
    producer: Arc<BaseProducer>,
    address: String,
}

/// Reply channel that produces to the requester's reply topic.
pub struct KafkaReply {
    producer: Arc<BaseProducer>,
    reply_to: Option<String>,
    correlation_id: Option<String>,
}

impl KafkaBus {
    /// Create a bus serving the topic `address`.
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaBus)` - A new bus, not yet subscribed
    /// * `Err(BusError)` - If the consumer or producer cannot be created
    pub fn new(config: &KafkaConfig, address: impl Into<String>) -> Result<Self, BusError> {
        let address = address.into();

        let consumer: StreamConsumer = config
            .client_config()
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| BusError::kafka(e.to_string()))?;

        let producer: BaseProducer = config
            .client_config()
            .set("client.id", &config.group_id)
            .set("compression.type", "zstd")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| BusError::kafka(e.to_string()))?;

        info!(
            brokers = %config.broker,
            group_id = %config.group_id,
            address = %address,
            sasl = config.username.is_some(),
            "Created Kafka bus"
        );

        Ok(Self {
            consumer,
            producer: Arc::new(producer),
            address,
        })
    }

    /// Subscribe to the request topic.
    pub fn subscribe(&self) -> Result<(), BusError> {
        self.consumer.subscribe(&[self.address.as_str()])?;

        info!(topic = %self.address, "Subscribed to Kafka topic");
        Ok(())
    }
}

#[async_trait]
impl MessageSource for KafkaBus {
    async fn next(&mut self) -> Option<InboundMessage> {
        loop {
            match self.consumer.recv().await {
                Ok(msg) => {
                    let body = decode_payload(msg.payload());
                    let reply_to = header_value(msg.headers(), REPLY_TO_HEADER);
                    let correlation_id = header_value(msg.headers(), CORRELATION_ID_HEADER);

                    debug!(
                        topic = %msg.topic(),
                        partition = msg.partition(),
                        offset = msg.offset(),
                        reply_to = ?reply_to,
                        "Received message from Kafka"
                    );

                    // Committed on handoff; a failed request is never redelivered.
                    if let Err(e) = self.consumer.commit_message(&msg, CommitMode::Async) {
                        error!(
                            topic = %msg.topic(),
                            partition = msg.partition(),
                            offset = msg.offset(),
                            error = %e,
                            "Failed to commit offset"
                        );
                    }

                    let reply = KafkaReply {
                        producer: Arc::clone(&self.producer),
                        reply_to,
                        correlation_id,
                    };
                    return Some(InboundMessage::new(body, Box::new(reply)));
                }
                Err(e) => {
                    error!(error = %e, "Kafka error");
                }
            }
        }
    }
}

impl Drop for KafkaBus {
    fn drop(&mut self) {
        if let Err(e) = self.producer.flush(FLUSH_TIMEOUT) {
            warn!(error = %e, "Failed to flush pending replies");
        }
    }
}

#[async_trait]
impl ReplyChannel for KafkaReply {
    async fn send_reply(self: Box<Self>, reply: Reply) -> Result<(), BusError> {
        let reply = reply.into_json();

        let Some(topic) = self.reply_to.as_deref() else {
            info!(reply = %reply, "Request had no reply_to header, dropping reply");
            return Ok(());
        };

        let payload = serde_json::to_vec(&reply).map_err(|e| BusError::parse(e.to_string()))?;

        let mut headers = OwnedHeaders::new();
        if let Some(correlation_id) = self.correlation_id.as_deref() {
            headers = headers.insert(Header {
                key: CORRELATION_ID_HEADER,
                value: Some(correlation_id),
            });
        }

        let record = BaseRecord::<(), Vec<u8>>::to(topic)
            .payload(&payload)
            .headers(headers);

        self.producer.send(record).map_err(|(e, _)| BusError::from(e))?;
        self.producer.poll(Duration::ZERO);

        debug!(topic = %topic, correlation_id = ?self.correlation_id, "Produced reply");
        Ok(())
    }
}

/// Parse a request payload. Anything that is not JSON becomes `Value::Null`,
/// which the dispatcher answers with a validation error.
fn decode_payload(payload: Option<&[u8]>) -> Value {
    payload
        .and_then(|bytes| serde_json::from_slice(bytes).ok())
        .unwrap_or(Value::Null)
}

fn header_value<H: Headers>(headers: Option<&H>, name: &str) -> Option<String> {
    headers?
        .iter()
        .find(|header| header.key == name)
        .and_then(|header| header.value)
        .map(|value| String::from_utf8_lossy(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payload() {
        assert_eq!(
            decode_payload(Some(br#"{"action":"index"}"#)),
            json!({"action": "index"})
        );
        assert_eq!(decode_payload(Some(b"not json")), Value::Null);
        assert_eq!(decode_payload(None), Value::Null);
    }

    #[test]
    fn test_header_value() {
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: REPLY_TO_HEADER,
                value: Some("persistor.replies"),
            })
            .insert(Header {
                key: CORRELATION_ID_HEADER,
                value: Some("abc-123"),
            });

        assert_eq!(
            header_value(Some(&headers), REPLY_TO_HEADER).as_deref(),
            Some("persistor.replies")
        );
        assert_eq!(
            header_value(Some(&headers), CORRELATION_ID_HEADER).as_deref(),
            Some("abc-123")
        );
        assert_eq!(header_value(Some(&headers), "missing"), None);
        assert_eq!(header_value::<OwnedHeaders>(None, REPLY_TO_HEADER), None);
    }

    #[test]
    fn test_default_config() {
        let config = KafkaConfig::default();
        assert_eq!(config.broker, "localhost:9092");
        assert_eq!(config.group_id, "persistor");
        assert!(config.username.is_none());
    }
}
