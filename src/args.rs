//! CLI argument definitions for the load-test driver.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use kafkameter_sampler::{
    default_parameters, DeliveryMode, ProducerSettings, SamplerContext, Serializer,
    PARAMETER_KAFKA_KEY_SERIALIZER, PARAMETER_KAFKA_MESSAGE, PARAMETER_KAFKA_TOPIC,
    PARAMETER_KAFKA_VALUE_SERIALIZER,
};

use crate::config::{parse_duration, parse_key_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Arguments for a produce load test.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(
        long,
        env = "KAFKA_BROKERS",
        value_delimiter = ',',
        default_value = "localhost:9092"
    )]
    pub brokers: Vec<String>,

    /// Topic to produce to
    #[arg(long, env = "KAFKA_TOPIC")]
    pub topic: String,

    /// Message payload. `{index}` and `{thread}` are replaced per iteration
    #[arg(long)]
    pub message: String,

    /// Key serializer (Kafka class name or alias such as "string")
    #[arg(long, default_value_t = Serializer::String.class_name().to_string())]
    pub key_serializer: String,

    /// Value serializer (Kafka class name or alias such as "bytes")
    #[arg(long, default_value_t = Serializer::ByteArray.class_name().to_string())]
    pub value_serializer: String,

    /// Total number of messages to produce
    #[arg(long, short = 'n', default_value = "1000")]
    pub iterations: u64,

    /// Number of concurrent workers sharing the producer
    #[arg(long, short = 't', default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Retry count handed to the Kafka client
    #[arg(long, default_value = "1")]
    pub retries: u32,

    /// Wait for the broker to acknowledge each message instead of counting
    /// a queued message as a success
    #[arg(long)]
    pub await_delivery: bool,

    /// How long the client keeps trying to deliver a message
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub message_timeout: Duration,

    /// How long setup waits for cluster metadata
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub connect_timeout: Duration,

    /// How long teardown waits for queued messages to flush
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub close_timeout: Duration,

    /// Skip the metadata request during setup
    #[arg(long)]
    pub skip_connection_check: bool,

    /// Extra librdkafka property (key=value, repeatable)
    #[arg(long = "producer-property", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub producer_properties: Vec<(String, String)>,

    /// Extra sampler parameter (key=value, repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Label attached to every sample
    #[arg(long, default_value = kafkameter_sampler::sampler::DEFAULT_LABEL)]
    pub label: String,

    /// Write every sample as a JSON line to this file
    #[arg(long, value_name = "PATH")]
    pub results_file: Option<PathBuf>,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Record messages in memory instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn producer_settings(&self) -> ProducerSettings {
        ProducerSettings {
            bootstrap_servers: self.brokers.clone(),
            retries: self.retries,
            message_timeout: self.message_timeout,
            connect_timeout: self.connect_timeout,
            verify_connection: !self.skip_connection_check,
            close_timeout: self.close_timeout,
            delivery_mode: if self.await_delivery {
                DeliveryMode::Acknowledged
            } else {
                DeliveryMode::FireAndForget
            },
            properties: self.producer_properties.clone(),
        }
    }

    /// Sampler parameters: the advertised defaults, then the dedicated flags,
    /// then `--param` overrides.
    pub fn context(&self) -> SamplerContext {
        let mut context = SamplerContext::from_arguments(&default_parameters())
            .with_parameter(PARAMETER_KAFKA_TOPIC, &self.topic)
            .with_parameter(PARAMETER_KAFKA_MESSAGE, &self.message)
            .with_parameter(PARAMETER_KAFKA_KEY_SERIALIZER, &self.key_serializer)
            .with_parameter(PARAMETER_KAFKA_VALUE_SERIALIZER, &self.value_serializer);
        for (key, value) in &self.params {
            context.set_parameter(key, value);
        }
        context
    }
}
