//! Host lifecycle contract.
//!
//! A load-testing host drives a sampler through three calls: setup once,
//! run once per iteration (possibly from many workers at once), teardown once.
//! Any driver that follows this order can host a [`SamplerClient`].

use crate::args::{Arguments, SamplerContext};
use crate::client::ProducerConnector;
use crate::error::Result;
use crate::request::ProduceRequest;
use crate::result::{SampleResult, RESPONSE_CODE_FAILED};
use crate::sampler::{self, ProduceSampler};

/// A sampler a load-testing host can drive.
#[async_trait::async_trait]
pub trait SamplerClient: Send + Sync {
    /// Parameters the sampler recognizes, with placeholder defaults.
    fn default_parameters(&self) -> Arguments;

    /// Called once before the first iteration. An error aborts the run.
    async fn setup_test(&self, context: &SamplerContext) -> Result<()>;

    /// Called once per iteration. Never fails; failures are in the result.
    async fn run_test(&self, context: &SamplerContext) -> SampleResult;

    /// Called once after the last iteration.
    async fn teardown_test(&self, context: &SamplerContext) -> Result<()>;
}

#[async_trait::async_trait]
impl<K: ProducerConnector> SamplerClient for ProduceSampler<K> {
    fn default_parameters(&self) -> Arguments {
        sampler::default_parameters()
    }

    async fn setup_test(&self, context: &SamplerContext) -> Result<()> {
        self.configure(context).await.map(|_| ())
    }

    async fn run_test(&self, context: &SamplerContext) -> SampleResult {
        match ProduceRequest::from_context(context) {
            Ok(request) => self.execute(&request).await,
            Err(err) => {
                let mut result = SampleResult::new(self.label());
                result.sample_start(String::new());
                result.mark_failed_with(RESPONSE_CODE_FAILED, &anyhow::Error::new(err));
                result
            }
        }
    }

    async fn teardown_test(&self, _context: &SamplerContext) -> Result<()> {
        self.teardown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ProducerSettings, PARAMETER_KAFKA_KEY_SERIALIZER, PARAMETER_KAFKA_MESSAGE,
        PARAMETER_KAFKA_TOPIC, PARAMETER_KAFKA_VALUE_SERIALIZER,
    };
    use crate::memory::MemoryConnector;

    #[tokio::test]
    async fn test_lifecycle_through_trait_object() {
        let connector = MemoryConnector::new();
        let handle = connector.handle();
        let client: Box<dyn SamplerClient> =
            Box::new(ProduceSampler::new(connector, ProducerSettings::default()));

        let context = SamplerContext::from_arguments(&client.default_parameters())
            .with_parameter(PARAMETER_KAFKA_TOPIC, "t1")
            .with_parameter(PARAMETER_KAFKA_MESSAGE, "hello");

        client.setup_test(&context).await.unwrap();
        let result = client.run_test(&context).await;
        client.teardown_test(&context).await.unwrap();

        assert!(result.successful);
        assert_eq!(result.response_code, "OK");
        assert_eq!(handle.sent_count(), 1);
        assert_eq!(handle.closes(), 1);
    }

    #[tokio::test]
    async fn test_run_without_topic_fails() {
        let sampler = ProduceSampler::new(MemoryConnector::new(), ProducerSettings::default());
        let context = SamplerContext::default()
            .with_parameter(PARAMETER_KAFKA_KEY_SERIALIZER, "string")
            .with_parameter(PARAMETER_KAFKA_VALUE_SERIALIZER, "bytes")
            .with_parameter(PARAMETER_KAFKA_MESSAGE, "hello");
        sampler.setup_test(&context).await.unwrap();

        let result = sampler.run_test(&context).await;

        assert!(!result.successful);
        assert_eq!(result.response_code, "500");
        assert_eq!(
            result.response_message.as_deref(),
            Some("Exception: Missing required parameter: kafka_topic")
        );
    }
}
