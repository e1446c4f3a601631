//! Producer client trait abstraction.
//!
//! The sampler never talks to rdkafka directly. It opens a client through a
//! [`ProducerConnector`] at setup and sends through the resulting
//! [`ProducerClient`], so the same lifecycle runs against a real cluster
//! ([`crate::kafka::KafkaConnector`]) or in memory
//! ([`crate::memory::MemoryConnector`]).

use std::time::Duration;

use crate::config::{DeliveryMode, SamplerConfig};
use crate::error::Result;

/// An open connection to the cluster.
///
/// Implementations must accept concurrent `send` calls from many tasks
/// without external locking.
#[async_trait::async_trait]
pub trait ProducerClient: Send + Sync {
    /// Send one already-encoded message.
    ///
    /// With [`DeliveryMode::FireAndForget`] this returns once the client has
    /// queued the message. With [`DeliveryMode::Acknowledged`] it waits for the
    /// delivery report and returns the delivery error, if any.
    async fn send(&self, topic: &str, payload: &[u8], mode: DeliveryMode) -> Result<()>;

    /// Flush queued messages and release the connection.
    async fn close(&self, timeout: Duration) -> Result<()>;
}

/// Opens [`ProducerClient`]s from a resolved configuration.
#[async_trait::async_trait]
pub trait ProducerConnector: Send + Sync {
    type Client: ProducerClient + 'static;

    /// Open a client. Errors here abort the run.
    async fn connect(&self, config: &SamplerConfig) -> Result<Self::Client>;
}
