//! Sampler configuration.
//!
//! Two layers feed a [`SamplerConfig`]: the host's per-test parameters (the
//! serializer identifiers) and [`ProducerSettings`], which carry everything the
//! host parameters never mention (brokers, retries, timeouts).

use std::time::Duration;

use crate::args::SamplerContext;
use crate::error::{Result, SamplerError};
use crate::serializer::Serializer;

/// Parameter for setting the Kafka topic name.
pub const PARAMETER_KAFKA_TOPIC: &str = "kafka_topic";

/// Parameter for setting the Kafka message.
pub const PARAMETER_KAFKA_MESSAGE: &str = "kafka_message";

/// Parameter for setting the key serializer.
pub const PARAMETER_KAFKA_KEY_SERIALIZER: &str = "kafka_key_serializer";

/// Parameter for setting the value serializer.
pub const PARAMETER_KAFKA_VALUE_SERIALIZER: &str = "kafka_value_serializer";

pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// What counts as a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// The message was accepted into the client's send queue. The broker may
    /// still reject it later; that outcome is not observed.
    #[default]
    FireAndForget,
    /// The broker acknowledged the message.
    Acknowledged,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FireAndForget => write!(f, "fire-and-forget"),
            Self::Acknowledged => write!(f, "acknowledged"),
        }
    }
}

/// Producer options that do not come from the host parameters.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    /// Broker addresses (e.g., "localhost:9092")
    pub bootstrap_servers: Vec<String>,
    /// Retry count handed to the client
    pub retries: u32,
    /// Upper bound on how long the client keeps trying to deliver a message
    pub message_timeout: Duration,
    /// How long setup waits for cluster metadata
    pub connect_timeout: Duration,
    /// Fetch cluster metadata during setup so unreachable brokers fail fast
    pub verify_connection: bool,
    /// Flush budget for in-flight messages at teardown
    pub close_timeout: Duration,
    pub delivery_mode: DeliveryMode,
    /// Extra librdkafka properties, applied last
    pub properties: Vec<(String, String)>,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec![DEFAULT_BOOTSTRAP_SERVERS.to_string()],
            retries: DEFAULT_RETRIES,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            verify_connection: true,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            delivery_mode: DeliveryMode::default(),
            properties: Vec::new(),
        }
    }
}

impl ProducerSettings {
    pub fn with_bootstrap_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }
}

/// Options resolved once at setup and held unchanged for the sampler's lifetime.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub bootstrap_servers: String,
    pub key_serializer: Serializer,
    pub value_serializer: Serializer,
    pub retries: u32,
    pub message_timeout: Duration,
    pub connect_timeout: Duration,
    pub verify_connection: bool,
    pub close_timeout: Duration,
    pub delivery_mode: DeliveryMode,
    pub properties: Vec<(String, String)>,
}

impl SamplerConfig {
    /// Resolve the configuration from host parameters and producer settings.
    ///
    /// Missing serializer parameters fall back to the advertised defaults
    /// (string keys, byte-array values).
    pub fn resolve(context: &SamplerContext, settings: &ProducerSettings) -> Result<Self> {
        let key_serializer = serializer_parameter(
            context,
            PARAMETER_KAFKA_KEY_SERIALIZER,
            Serializer::String,
        )?;
        let value_serializer = serializer_parameter(
            context,
            PARAMETER_KAFKA_VALUE_SERIALIZER,
            Serializer::ByteArray,
        )?;

        let servers: Vec<&str> = settings
            .bootstrap_servers
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if servers.is_empty() {
            return Err(SamplerError::InvalidConfig(
                "at least one bootstrap server is required".to_string(),
            ));
        }

        Ok(Self {
            bootstrap_servers: servers.join(","),
            key_serializer,
            value_serializer,
            retries: settings.retries,
            message_timeout: settings.message_timeout,
            connect_timeout: settings.connect_timeout,
            verify_connection: settings.verify_connection,
            close_timeout: settings.close_timeout,
            delivery_mode: settings.delivery_mode,
            properties: settings.properties.clone(),
        })
    }
}

fn serializer_parameter(
    context: &SamplerContext,
    name: &str,
    default: Serializer,
) -> Result<Serializer> {
    match context.parameter(name) {
        Some(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(default),
    }
}
