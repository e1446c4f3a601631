//! Aggregate statistics over a run's sample results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::SampleResult;

/// Summary of a run, in the shape load-testing reports usually take.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub samples: u64,
    pub errors: u64,
    /// Fraction of failed samples, 0.0 to 1.0
    pub error_rate: f64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Wall time of the whole run
    pub duration_ms: u64,
    pub samples_per_second: f64,
    /// Failure counts by response message
    pub error_breakdown: Vec<(String, u64)>,
}

/// Collects results as they arrive.
#[derive(Debug, Default)]
pub struct SummaryBuilder {
    elapsed_us: Vec<u64>,
    errors: u64,
    error_breakdown: Vec<(String, u64)>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &SampleResult) {
        self.elapsed_us.push(result.elapsed.as_micros() as u64);
        if !result.successful {
            self.errors += 1;
            let message = result
                .response_message
                .clone()
                .unwrap_or_else(|| format!("response code {}", result.response_code));
            match self.error_breakdown.iter_mut().find(|(m, _)| *m == message) {
                Some((_, count)) => *count += 1,
                None => self.error_breakdown.push((message, 1)),
            }
        }
    }

    pub fn finish(mut self, wall_time: Duration) -> RunSummary {
        let samples = self.elapsed_us.len() as u64;
        if samples == 0 {
            return RunSummary {
                duration_ms: wall_time.as_millis() as u64,
                ..RunSummary::default()
            };
        }

        self.elapsed_us.sort_unstable();
        let to_ms = |us: u64| us as f64 / 1000.0;
        let total: u64 = self.elapsed_us.iter().sum();
        self.error_breakdown.sort_by(|a, b| b.1.cmp(&a.1));

        let secs = wall_time.as_secs_f64();
        RunSummary {
            samples,
            errors: self.errors,
            error_rate: self.errors as f64 / samples as f64,
            min_ms: to_ms(self.elapsed_us[0]),
            mean_ms: to_ms(total) / samples as f64,
            max_ms: to_ms(self.elapsed_us[self.elapsed_us.len() - 1]),
            p50_ms: to_ms(percentile(&self.elapsed_us, 50.0)),
            p90_ms: to_ms(percentile(&self.elapsed_us, 90.0)),
            p95_ms: to_ms(percentile(&self.elapsed_us, 95.0)),
            p99_ms: to_ms(percentile(&self.elapsed_us, 99.0)),
            duration_ms: wall_time.as_millis() as u64,
            samples_per_second: if secs > 0.0 {
                samples as f64 / secs
            } else {
                0.0
            },
            error_breakdown: self.error_breakdown,
        }
    }
}

/// Nearest-rank percentile over sorted values.
fn percentile(sorted: &[u64], pct: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
