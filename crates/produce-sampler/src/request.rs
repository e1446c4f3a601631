//! Per-invocation produce requests.

use crate::args::SamplerContext;
use crate::config::{PARAMETER_KAFKA_MESSAGE, PARAMETER_KAFKA_TOPIC};
use crate::error::{Result, SamplerError};

/// One message to produce, built fresh from the host parameters on every
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceRequest {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl ProduceRequest {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Read `kafka_topic` and `kafka_message` from the context.
    pub fn from_context(context: &SamplerContext) -> Result<Self> {
        let topic = context
            .parameter(PARAMETER_KAFKA_TOPIC)
            .ok_or_else(|| SamplerError::MissingParameter(PARAMETER_KAFKA_TOPIC.to_string()))?;
        let message = context
            .parameter(PARAMETER_KAFKA_MESSAGE)
            .ok_or_else(|| SamplerError::MissingParameter(PARAMETER_KAFKA_MESSAGE.to_string()))?;
        Ok(Self::new(topic, message))
    }

    /// The payload as text, for recording on the sample result.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
