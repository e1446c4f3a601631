//! Kafka produce sampler for load testing.
//!
//! This crate lets a load-testing host produce one Kafka message per
//! iteration through a single long-lived producer, and hands every outcome
//! back as a [`SampleResult`] the host can aggregate.
//!
//! # Architecture
//!
//! ```text
//!  host (setup / run × N / teardown)
//!        │
//!        ▼
//! ┌─────────────────┐     ┌──────────────────────┐
//! │  SamplerClient  │────▶│    ProduceSampler    │
//! │  (plugin.rs)    │     │                      │
//! └─────────────────┘     │ - resolves config    │
//!                         │ - serializes value   │
//!                         │ - maps outcome to    │
//!                         │   SampleResult       │
//!                         └──────────┬───────────┘
//!                                    │ ProducerClient
//!                        ┌───────────┴───────────┐
//!                        ▼                       ▼
//!               KafkaProducerClient     MemoryProducerClient
//!                  (rdkafka)              (dry runs, tests)
//! ```
//!
//! # Delivery semantics
//!
//! By default a sample succeeds once rdkafka has queued the message. The
//! broker's acknowledgment is not awaited, so a message that later fails to
//! deliver still counts as a success. Set
//! [`DeliveryMode::Acknowledged`] to wait for the delivery report instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use kafkameter_sampler::{
//!     KafkaConnector, ProduceRequest, ProduceSampler, ProducerSettings, SamplerContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sampler = ProduceSampler::new(KafkaConnector, ProducerSettings::default());
//!     sampler.configure(&SamplerContext::default()).await?;
//!
//!     let result = sampler.execute(&ProduceRequest::new("t1", "hello")).await;
//!     println!("{} {}", result.response_code, result.response_data);
//!
//!     sampler.teardown().await?;
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod client;
pub mod config;
pub mod error;
pub mod kafka;
pub mod memory;
pub mod plugin;
pub mod request;
pub mod result;
pub mod sampler;
pub mod serializer;
pub mod summary;

// Re-exports for convenience
pub use args::{Argument, Arguments, SamplerContext};
pub use client::{ProducerClient, ProducerConnector};
pub use config::{
    DeliveryMode, ProducerSettings, SamplerConfig, PARAMETER_KAFKA_KEY_SERIALIZER,
    PARAMETER_KAFKA_MESSAGE, PARAMETER_KAFKA_TOPIC, PARAMETER_KAFKA_VALUE_SERIALIZER,
};
pub use error::{Result, SamplerError};
pub use kafka::{KafkaConnector, KafkaProducerClient};
pub use memory::{MemoryConnector, MemoryHandle, SentRecord};
pub use plugin::SamplerClient;
pub use request::ProduceRequest;
pub use result::{SampleResult, RESPONSE_CODE_FAILED, RESPONSE_CODE_OK};
pub use sampler::{default_parameters, ProduceSampler, SamplerStatus};
pub use serializer::Serializer;
pub use summary::{RunSummary, SummaryBuilder};
