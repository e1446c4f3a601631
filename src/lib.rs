//! kafkameter
//!
//! Drives a Kafka produce sampler through a load test from the command line:
//! setup once, produce one message per iteration across a pool of workers,
//! tear down, and summarize the samples the way a load-testing host would.
//!
//! The sampler itself lives in the `kafkameter-sampler` crate and can be
//! hosted by anything that calls its three lifecycle methods in order; this
//! crate is one such host.
//!
//! # CLI Usage
//!
//! ```bash
//! # 10k messages over 4 workers, fire-and-forget
//! kafkameter run --brokers localhost:9092 --topic t1 \
//!   --message 'event-{index}' --iterations 10000 --threads 4
//!
//! # Wait for broker acknowledgments and keep every sample
//! kafkameter run --topic t1 --message hello --await-delivery \
//!   --results-file samples.jsonl --output json
//!
//! # List the sampler parameters and their defaults
//! kafkameter params
//! ```

pub mod args;
pub mod config;
pub mod harness;
pub mod report;

pub use args::{OutputFormat, RunArgs};
pub use harness::{run_load_test, HarnessOptions, RunOutcome};
pub use report::RunReport;
