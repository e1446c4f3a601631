//! Per-iteration sample results.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Encoding used for all string data attached to a result.
pub const ENCODING: &str = "UTF-8";

pub const RESPONSE_CODE_OK: &str = "OK";
pub const RESPONSE_CODE_FAILED: &str = "500";

/// Body recorded when a successful sample has no application-level response.
pub const NO_RESPONSE_REQUIRED: &str = "No response required";

/// Requests and responses are always recorded as text.
pub const DATA_TYPE_TEXT: &str = "text";

/// Outcome of one sampler invocation, as a load-testing host aggregates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub label: String,
    /// The request, as sent
    pub sampler_data: String,
    pub data_encoding: String,
    pub data_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Wall time between start and end, measured on a monotonic clock
    #[serde(with = "duration_micros")]
    pub elapsed: Duration,
    pub successful: bool,
    pub response_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,
    pub response_data: String,
    #[serde(skip)]
    started: Option<Instant>,
}

impl SampleResult {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sampler_data: String::new(),
            data_encoding: ENCODING.to_string(),
            data_type: DATA_TYPE_TEXT.to_string(),
            start_time: None,
            end_time: None,
            elapsed: Duration::ZERO,
            successful: false,
            response_code: String::new(),
            response_message: None,
            response_data: String::new(),
            started: None,
        }
    }

    /// Start the sample and record `data` as the request.
    pub fn sample_start(&mut self, data: impl Into<String>) {
        self.sampler_data = data.into();
        self.start_time = Some(Utc::now());
        self.started = Some(Instant::now());
    }

    /// End the sample. End time is derived from the monotonic elapsed time so
    /// it never precedes the start time. Only the first call counts.
    pub fn sample_end(&mut self) {
        if self.end_time.is_some() {
            return;
        }
        let start = *self.start_time.get_or_insert_with(Utc::now);
        self.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        let elapsed =
            chrono::Duration::from_std(self.elapsed).unwrap_or_else(|_| chrono::Duration::zero());
        self.end_time = Some(start + elapsed);
    }

    /// Mark the sample ended and successful with an "OK" code. Without a
    /// response the body notes that none was required.
    pub fn mark_success(&mut self, response: Option<&str>) {
        self.sample_end();
        self.successful = true;
        self.response_code = RESPONSE_CODE_OK.to_string();
        self.response_data = response.unwrap_or(NO_RESPONSE_REQUIRED).to_string();
    }

    /// Mark the sample ended and failed with `reason` as the response code.
    pub fn mark_failed(&mut self, reason: &str) {
        self.sample_end();
        self.successful = false;
        self.response_code = reason.to_string();
    }

    /// Mark the sample failed and attach the error and its full chain.
    ///
    /// The message carries every cause on one line, so failures with
    /// different root causes stay distinguishable.
    pub fn mark_failed_with(&mut self, reason: &str, error: &anyhow::Error) {
        self.mark_failed(reason);
        self.response_message = Some(format!("Exception: {error:#}"));
        self.response_data = failure_trace(error);
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }
}

/// Render an error the way a stack trace reads: the error, each cause, and
/// the captured backtrace when `RUST_BACKTRACE` enabled one.
pub fn failure_trace(error: &anyhow::Error) -> String {
    format!("{error:?}")
}

mod duration_micros {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_micros() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_without_response() {
        let mut result = SampleResult::new("produce");
        result.sample_start("hello");
        result.mark_success(None);

        assert!(result.is_successful());
        assert_eq!(result.response_code, "OK");
        assert_eq!(result.response_data, NO_RESPONSE_REQUIRED);
        assert_eq!(result.sampler_data, "hello");
        assert_eq!(result.data_encoding, "UTF-8");
        assert!(result.end_time.unwrap() >= result.start_time.unwrap());
    }

    #[test]
    fn test_failure_carries_error_chain() {
        let err = anyhow::anyhow!("queue full").context("Failed to send message");

        let mut result = SampleResult::new("produce");
        result.sample_start("hello");
        result.mark_failed_with(RESPONSE_CODE_FAILED, &err);

        assert!(!result.is_successful());
        assert_eq!(result.response_code, "500");
        assert_eq!(
            result.response_message.as_deref(),
            Some("Exception: Failed to send message: queue full")
        );
        assert!(result.response_data.contains("Failed to send message"));
        assert!(result.response_data.contains("queue full"));
    }

    #[test]
    fn test_sample_end_is_idempotent() {
        let mut result = SampleResult::new("produce");
        result.sample_start("x");
        result.sample_end();
        let end = result.end_time;
        std::thread::sleep(Duration::from_millis(2));
        result.sample_end();
        assert_eq!(result.end_time, end);
    }

    #[test]
    fn test_end_without_start() {
        let mut result = SampleResult::new("produce");
        result.mark_failed(RESPONSE_CODE_FAILED);
        assert_eq!(result.start_time, result.end_time);
        assert_eq!(result.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut result = SampleResult::new("produce");
        result.sample_start("hello");
        result.mark_success(None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["response_code"], "OK");
        assert_eq!(json["data_type"], "text");
        assert!(json.get("response_message").is_none());
        assert!(json["elapsed"].is_u64());
    }
}
