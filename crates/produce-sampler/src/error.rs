//! Error types for the produce sampler.

use thiserror::Error;

/// Errors that can occur while configuring or driving the sampler.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unknown serializer: '{0}'")]
    UnknownSerializer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to connect to Kafka brokers {brokers}: {reason}")]
    Connect { brokers: String, reason: String },

    #[error("{serializer} serializer rejected payload: {reason}")]
    Serialize {
        serializer: &'static str,
        reason: String,
    },

    #[error("Delivery failed: {0}")]
    Delivery(rdkafka::error::KafkaError),

    #[error("Delivery report was dropped before the message was acknowledged")]
    DeliveryCanceled,

    #[error("Producer client error: {0}")]
    Client(String),

    #[error("Sampler is not configured")]
    NotConfigured,

    #[error("Sampler is already configured")]
    AlreadyConfigured,

    #[error("Sampler is closed")]
    Closed,

    #[error("Producer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = SamplerError> = std::result::Result<T, E>;
