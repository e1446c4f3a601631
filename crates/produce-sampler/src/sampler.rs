//! The produce sampler.
//!
//! A [`ProduceSampler`] owns exactly one producer client for the length of a
//! run:
//!
//! ```text
//!  Unconfigured ──configure──▶ Ready ──teardown──▶ Closed
//!                              │  ▲
//!                              └──┘ execute (N times, concurrently)
//! ```
//!
//! `execute` never fails. Every error raised while sending, including a panic
//! inside the client, becomes a failed [`SampleResult`] so the host keeps
//! iterating and gets one result per iteration.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::args::{Arguments, SamplerContext};
use crate::client::{ProducerClient, ProducerConnector};
use crate::config::{
    ProducerSettings, SamplerConfig, PARAMETER_KAFKA_KEY_SERIALIZER, PARAMETER_KAFKA_MESSAGE,
    PARAMETER_KAFKA_TOPIC, PARAMETER_KAFKA_VALUE_SERIALIZER,
};
use crate::error::{Result, SamplerError};
use crate::request::ProduceRequest;
use crate::result::{SampleResult, RESPONSE_CODE_FAILED};
use crate::serializer::Serializer;

/// Label given to results when none is configured.
pub const DEFAULT_LABEL: &str = "kafka-produce";

/// Lifecycle position of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerStatus {
    Unconfigured,
    Ready,
    Closed,
}

enum SamplerState<C> {
    Unconfigured,
    Ready { config: SamplerConfig, client: C },
    Closed,
}

impl<C> SamplerState<C> {
    fn status(&self) -> SamplerStatus {
        match self {
            Self::Unconfigured => SamplerStatus::Unconfigured,
            Self::Ready { .. } => SamplerStatus::Ready,
            Self::Closed => SamplerStatus::Closed,
        }
    }
}

/// Parameters advertised to the host, with their placeholder defaults.
pub fn default_parameters() -> Arguments {
    let mut arguments = Arguments::new();
    arguments.add_argument(PARAMETER_KAFKA_TOPIC, "${PARAMETER_KAFKA_TOPIC}");
    arguments.add_argument(PARAMETER_KAFKA_MESSAGE, "${PARAMETER_KAFKA_MESSAGE}");
    arguments.add_argument(
        PARAMETER_KAFKA_KEY_SERIALIZER,
        Serializer::String.class_name(),
    );
    arguments.add_argument(
        PARAMETER_KAFKA_VALUE_SERIALIZER,
        Serializer::ByteArray.class_name(),
    );
    arguments
}

/// Produces one message per invocation through a long-lived client.
///
/// Share it behind an `Arc` to run invocations from several tasks; sends only
/// take a read lock on the sampler state, so they proceed in parallel, and
/// `teardown` waits for the ones in flight.
pub struct ProduceSampler<K: ProducerConnector> {
    connector: K,
    settings: ProducerSettings,
    label: String,
    state: RwLock<SamplerState<K::Client>>,
}

impl<K: ProducerConnector> ProduceSampler<K> {
    pub fn new(connector: K, settings: ProducerSettings) -> Self {
        Self {
            connector,
            settings,
            label: DEFAULT_LABEL.to_string(),
            state: RwLock::new(SamplerState::Unconfigured),
        }
    }

    /// Set the label attached to every result.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn status(&self) -> SamplerStatus {
        self.state.read().await.status()
    }

    /// Resolve the configuration and open the client.
    ///
    /// Only valid once, on a fresh sampler. Errors are meant to abort the run.
    pub async fn configure(&self, context: &SamplerContext) -> Result<SamplerConfig> {
        let mut state = self.state.write().await;
        match &*state {
            SamplerState::Unconfigured => {}
            SamplerState::Ready { .. } => return Err(SamplerError::AlreadyConfigured),
            SamplerState::Closed => return Err(SamplerError::Closed),
        }

        let config = SamplerConfig::resolve(context, &self.settings)?;
        info!(
            "Configuring sampler '{}': brokers={}, key serializer={}, value serializer={}, retries={}, delivery={}",
            self.label,
            config.bootstrap_servers,
            config.key_serializer,
            config.value_serializer,
            config.retries,
            config.delivery_mode
        );

        let client = self.connector.connect(&config).await?;
        *state = SamplerState::Ready {
            config: config.clone(),
            client,
        };
        Ok(config)
    }

    /// Produce one message and report the outcome.
    pub async fn execute(&self, request: &ProduceRequest) -> SampleResult {
        let mut result = SampleResult::new(&self.label);
        result.sample_start(request.payload_text());

        match AssertUnwindSafe(self.send(request)).catch_unwind().await {
            Ok(Ok(())) => result.mark_success(None),
            Ok(Err(err)) => {
                let err = anyhow::Error::new(err)
                    .context(format!("Failed to send message to topic '{}'", request.topic));
                debug!("{:#}", err);
                result.mark_failed_with(RESPONSE_CODE_FAILED, &err);
            }
            Err(panic) => {
                let err = anyhow::anyhow!(
                    "Producer panicked while sending to topic '{}': {}",
                    request.topic,
                    panic_message(panic.as_ref())
                );
                warn!("{}", err);
                result.mark_failed_with(RESPONSE_CODE_FAILED, &err);
            }
        }

        result
    }

    async fn send(&self, request: &ProduceRequest) -> Result<()> {
        let state = self.state.read().await;
        let (config, client) = match &*state {
            SamplerState::Ready { config, client } => (config, client),
            SamplerState::Unconfigured => return Err(SamplerError::NotConfigured),
            SamplerState::Closed => return Err(SamplerError::Closed),
        };

        if request.topic.is_empty() {
            return Err(SamplerError::MissingParameter(
                PARAMETER_KAFKA_TOPIC.to_string(),
            ));
        }

        let payload = config.value_serializer.serialize(&request.payload)?;
        client
            .send(&request.topic, &payload, config.delivery_mode)
            .await
    }

    /// Close the client. Calling it again, or on a sampler that never
    /// configured, does nothing.
    pub async fn teardown(&self) -> Result<()> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, SamplerState::Closed) {
            SamplerState::Ready { config, client } => {
                client.close(config.close_timeout).await?;
                info!("Sampler '{}' closed", self.label);
                Ok(())
            }
            SamplerState::Unconfigured => {
                debug!("Sampler '{}' torn down before setup", self.label);
                Ok(())
            }
            SamplerState::Closed => {
                warn!("Sampler '{}' is already closed", self.label);
                Ok(())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliveryMode;
    use crate::memory::{MemoryConnector, MemoryHandle, SentRecord};
    use crate::summary::SummaryBuilder;
    use std::time::Duration;

    fn sampler() -> (ProduceSampler<MemoryConnector>, MemoryHandle) {
        let connector = MemoryConnector::new();
        let handle = connector.handle();
        (
            ProduceSampler::new(connector, ProducerSettings::default()),
            handle,
        )
    }

    fn serializers(key: &str, value: &str) -> SamplerContext {
        SamplerContext::default()
            .with_parameter(PARAMETER_KAFKA_KEY_SERIALIZER, key)
            .with_parameter(PARAMETER_KAFKA_VALUE_SERIALIZER, value)
    }

    #[test]
    fn test_default_parameters() {
        let params = default_parameters();
        assert_eq!(
            params.names(),
            vec![
                "kafka_topic",
                "kafka_message",
                "kafka_key_serializer",
                "kafka_value_serializer"
            ]
        );
        assert_eq!(params.get("kafka_topic"), Some("${PARAMETER_KAFKA_TOPIC}"));
        assert_eq!(
            params.get("kafka_message"),
            Some("${PARAMETER_KAFKA_MESSAGE}")
        );
        assert_eq!(
            params.get("kafka_key_serializer"),
            Some("org.apache.kafka.common.serialization.StringSerializer")
        );
        assert_eq!(
            params.get("kafka_value_serializer"),
            Some("org.apache.kafka.common.serialization.ByteArraySerializer")
        );
    }

    #[tokio::test]
    async fn test_execute_success() {
        let (sampler, handle) = sampler();
        sampler
            .configure(&serializers("utf8", "bytes"))
            .await
            .unwrap();

        let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;

        assert!(result.successful);
        assert_eq!(result.response_code, "OK");
        assert_eq!(result.response_data, "No response required");
        assert_eq!(result.sampler_data, "hello");
        assert_eq!(result.label, DEFAULT_LABEL);
        assert!(result.end_time.unwrap() >= result.start_time.unwrap());

        let sent = handle.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "t1");
        assert_eq!(sent[0].payload, b"hello");
    }

    #[tokio::test]
    async fn test_execute_send_failure() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        handle.fail_sends(Some("Local: Queue full"));

        let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;

        assert!(!result.successful);
        assert_eq!(result.response_code, "500");
        assert_eq!(
            result.response_message.as_deref(),
            Some(
                "Exception: Failed to send message to topic 't1': Producer client error: Local: Queue full"
            )
        );
        assert!(result.response_data.contains("Local: Queue full"));
        assert_eq!(result.sampler_data, "hello");
    }

    #[tokio::test]
    async fn test_failure_messages_name_the_cause() {
        let (sampler, handle) = sampler();
        sampler
            .configure(&serializers("string", "long"))
            .await
            .unwrap();

        let rejected = sampler.execute(&ProduceRequest::new("t1", "seven")).await;
        handle.fail_sends(Some("Local: Queue full"));
        let queue_full = sampler.execute(&ProduceRequest::new("t1", "7")).await;

        let rejected_message = rejected.response_message.clone().unwrap();
        let queue_full_message = queue_full.response_message.clone().unwrap();
        assert!(rejected_message.contains("Long serializer rejected payload"));
        assert!(queue_full_message.contains("Local: Queue full"));
        assert_ne!(rejected_message, queue_full_message);

        let mut builder = SummaryBuilder::new();
        builder.record(&rejected);
        builder.record(&queue_full);
        let summary = builder.finish(Duration::from_millis(1));
        assert_eq!(summary.error_breakdown.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_recovers_after_failure() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();

        handle.fail_sends(Some("broker down"));
        assert!(!sampler.execute(&ProduceRequest::new("t1", "a")).await.successful);
        handle.fail_sends(None);
        assert!(sampler.execute(&ProduceRequest::new("t1", "b")).await.successful);
        assert_eq!(handle.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_catches_panics() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        handle.panic_on_send(true);

        let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;

        assert!(!result.successful);
        assert_eq!(result.response_code, "500");
        assert!(result.response_data.contains("asked to panic"));
        assert_eq!(sampler.status().await, SamplerStatus::Ready);
    }

    #[tokio::test]
    async fn test_execute_before_configure_fails() {
        let (sampler, handle) = sampler();

        let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;

        assert!(!result.successful);
        assert_eq!(result.response_code, "500");
        assert!(result.response_data.contains("not configured"));
        assert_eq!(handle.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_after_teardown_fails() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        sampler.teardown().await.unwrap();

        let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;

        assert!(!result.successful);
        assert!(result.response_data.contains("closed"));
        assert_eq!(handle.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_topic_fails() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();

        let result = sampler.execute(&ProduceRequest::new("", "hello")).await;

        assert!(!result.successful);
        assert!(result.response_data.contains("kafka_topic"));
        assert_eq!(handle.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_value_serializer_applies_per_invocation() {
        let (sampler, handle) = sampler();
        sampler
            .configure(&serializers(
                "string",
                "org.apache.kafka.common.serialization.LongSerializer",
            ))
            .await
            .unwrap();

        assert!(sampler.execute(&ProduceRequest::new("t1", "7")).await.successful);
        let result = sampler.execute(&ProduceRequest::new("t1", "seven")).await;
        assert!(!result.successful);
        assert!(result.response_data.contains("Long serializer rejected payload"));
        assert!(result
            .response_message
            .as_deref()
            .unwrap()
            .contains("Long serializer rejected payload"));

        assert_eq!(
            handle.sent(),
            vec![SentRecord {
                topic: "t1".to_string(),
                payload: 7i64.to_be_bytes().to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn test_configure_failure_propagates() {
        let (sampler, handle) = sampler();
        handle.fail_connect(Some("connection refused"));

        let err = sampler
            .configure(&SamplerContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SamplerError::Connect { .. }));
        assert_eq!(sampler.status().await, SamplerStatus::Unconfigured);
        assert_eq!(handle.connects(), 0);
    }

    #[tokio::test]
    async fn test_unknown_serializer_fails_configure() {
        let (sampler, handle) = sampler();
        let err = sampler
            .configure(&serializers("string", "avro"))
            .await
            .unwrap_err();
        assert!(matches!(err, SamplerError::UnknownSerializer(_)));
        assert_eq!(handle.connects(), 0);
    }

    #[tokio::test]
    async fn test_configure_only_once() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();

        let err = sampler
            .configure(&SamplerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SamplerError::AlreadyConfigured));

        sampler.teardown().await.unwrap();
        let err = sampler
            .configure(&SamplerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SamplerError::Closed));
        assert_eq!(handle.connects(), 1);
    }

    #[tokio::test]
    async fn test_teardown_twice() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        for _ in 0..3 {
            assert!(sampler.execute(&ProduceRequest::new("t1", "x")).await.successful);
        }

        sampler.teardown().await.unwrap();
        sampler.teardown().await.unwrap();

        assert_eq!(handle.closes(), 1);
        assert_eq!(sampler.status().await, SamplerStatus::Closed);
    }

    #[tokio::test]
    async fn test_teardown_before_configure() {
        let (sampler, handle) = sampler();
        sampler.teardown().await.unwrap();
        assert_eq!(handle.closes(), 0);
        assert_eq!(sampler.status().await, SamplerStatus::Closed);
    }

    #[tokio::test]
    async fn test_fire_and_forget_ignores_delivery_failures() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        handle.fail_deliveries(Some("not leader for partition"));

        assert!(sampler.execute(&ProduceRequest::new("t1", "x")).await.successful);
    }

    #[tokio::test]
    async fn test_acknowledged_reports_delivery_failures() {
        let connector = MemoryConnector::new();
        let handle = connector.handle();
        let sampler = ProduceSampler::new(
            connector,
            ProducerSettings::default().with_delivery_mode(DeliveryMode::Acknowledged),
        );
        sampler.configure(&SamplerContext::default()).await.unwrap();
        handle.fail_deliveries(Some("not leader for partition"));

        let result = sampler.execute(&ProduceRequest::new("t1", "x")).await;
        assert!(!result.successful);
        assert!(result.response_data.contains("not leader for partition"));
    }

    #[tokio::test]
    async fn test_concurrent_execute() {
        let (sampler, handle) = sampler();
        sampler.configure(&SamplerContext::default()).await.unwrap();
        let sampler = std::sync::Arc::new(sampler);

        let mut tasks = Vec::new();
        for worker in 0..8 {
            let sampler = std::sync::Arc::clone(&sampler);
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    let request = ProduceRequest::new("t1", format!("{worker}-{i}"));
                    assert!(sampler.execute(&request).await.successful);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        sampler.teardown().await.unwrap();
        assert_eq!(handle.sent_count(), 200);
        assert_eq!(handle.closes(), 1);
    }
}
