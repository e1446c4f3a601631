//! rdkafka-backed producer client.

use std::time::Duration;

use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use tracing::{debug, info, warn};

use crate::client::{ProducerClient, ProducerConnector};
use crate::config::{DeliveryMode, SamplerConfig};
use crate::error::{Result, SamplerError};

/// Connects to a Kafka cluster with a [`FutureProducer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaConnector;

impl KafkaConnector {
    /// Build the librdkafka configuration for a sampler.
    ///
    /// Extra properties are applied last and win over the derived ones.
    pub fn client_config(config: &SamplerConfig) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.send.max.retries", config.retries.to_string())
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            );
        for (key, value) in &config.properties {
            client_config.set(key, value);
        }
        client_config
    }
}

#[async_trait::async_trait]
impl ProducerConnector for KafkaConnector {
    type Client = KafkaProducerClient;

    async fn connect(&self, config: &SamplerConfig) -> Result<KafkaProducerClient> {
        let producer: FutureProducer = Self::client_config(config).create()?;

        if config.verify_connection {
            // librdkafka connects lazily; fetching metadata forces a round trip
            let probe = producer.clone();
            let timeout = config.connect_timeout;
            let brokers = tokio::task::spawn_blocking(move || {
                probe
                    .client()
                    .fetch_metadata(None, timeout)
                    .map(|metadata| metadata.brokers().len())
            })
            .await?
            .map_err(|e| SamplerError::Connect {
                brokers: config.bootstrap_servers.clone(),
                reason: e.to_string(),
            })?;

            if brokers == 0 {
                return Err(SamplerError::Connect {
                    brokers: config.bootstrap_servers.clone(),
                    reason: "cluster metadata lists no brokers".to_string(),
                });
            }
            info!(
                "Connected to Kafka at {} ({} brokers)",
                config.bootstrap_servers, brokers
            );
        } else {
            debug!(
                "Created Kafka producer for {} without connection check",
                config.bootstrap_servers
            );
        }

        Ok(KafkaProducerClient { producer })
    }
}

/// Producer handle shared by every invocation of one sampler.
pub struct KafkaProducerClient {
    producer: FutureProducer,
}

#[async_trait::async_trait]
impl ProducerClient for KafkaProducerClient {
    async fn send(&self, topic: &str, payload: &[u8], mode: DeliveryMode) -> Result<()> {
        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(topic).payload(payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(err, _)| SamplerError::Kafka(err))?;

        match mode {
            // Dropping the delivery future leaves the message queued
            DeliveryMode::FireAndForget => Ok(()),
            DeliveryMode::Acknowledged => match delivery.await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err((err, _))) => Err(SamplerError::Delivery(err)),
                Err(_) => Err(SamplerError::DeliveryCanceled),
            },
        }
    }

    async fn close(&self, timeout: Duration) -> Result<()> {
        let in_flight = self.producer.in_flight_count();
        if in_flight > 0 {
            info!("Flushing {} in-flight messages", in_flight);
        }

        let producer = self.producer.clone();
        let flushed = tokio::task::spawn_blocking(move || producer.flush(timeout)).await?;
        if let Err(e) = &flushed {
            warn!(
                "Flush did not complete within {:?}, {} messages still in flight: {}",
                timeout,
                self.producer.in_flight_count(),
                e
            );
        }
        flushed.map_err(SamplerError::from)
    }
}
