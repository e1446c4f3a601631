//! Load-test driver.
//!
//! Plays the host's part of the sampler lifecycle: one setup, `iterations`
//! runs spread over `threads` workers that share the sampler, one teardown.
//! Workers pull iteration numbers from a shared counter, so the total is exact
//! regardless of how fast each worker goes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use kafkameter_sampler::{
    RunSummary, SampleResult, SamplerClient, SamplerContext, SummaryBuilder,
    PARAMETER_KAFKA_MESSAGE,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-iteration placeholders substituted into the message.
const INDEX_PLACEHOLDER: &str = "{index}";
const THREAD_PLACEHOLDER: &str = "{thread}";

/// How many iterations between progress log lines.
const PROGRESS_INTERVAL: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub iterations: u64,
    pub threads: usize,
    pub results_file: Option<PathBuf>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            threads: 1,
            results_file: None,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Teardown failure, if any. The samples are still valid.
    pub teardown_error: Option<String>,
    /// Why the results file is incomplete, if it is.
    pub results_error: Option<String>,
}

/// Build the context for one iteration.
fn iteration_context(base: &SamplerContext, index: u64, thread: usize) -> SamplerContext {
    match base.parameter(PARAMETER_KAFKA_MESSAGE) {
        Some(message)
            if message.contains(INDEX_PLACEHOLDER) || message.contains(THREAD_PLACEHOLDER) =>
        {
            let message = message
                .replace(INDEX_PLACEHOLDER, &index.to_string())
                .replace(THREAD_PLACEHOLDER, &thread.to_string());
            base.clone().with_parameter(PARAMETER_KAFKA_MESSAGE, message)
        }
        _ => base.clone(),
    }
}

/// Run a full load test against `sampler`.
///
/// A setup failure, or a results file that cannot be created, aborts before
/// any iteration and is returned as an error. Iteration failures are counted
/// in the summary. Teardown and results file write failures are reported in
/// the outcome next to the summary.
pub async fn run_load_test(
    sampler: Arc<dyn SamplerClient>,
    context: SamplerContext,
    options: &HarnessOptions,
) -> anyhow::Result<RunOutcome> {
    let threads = options.threads.max(1);

    // Opened before setup so a bad path never leaves a client open
    let mut writer = match &options.results_file {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create results file {}", path.display())
        })?)),
        None => None,
    };

    sampler
        .setup_test(&context)
        .await
        .context("Sampler setup failed")?;

    info!(
        "Running {} iterations on {} worker(s)",
        options.iterations, threads
    );

    let started = Instant::now();
    let next = Arc::new(AtomicU64::new(0));
    let context = Arc::new(context);
    let (tx, mut rx) = mpsc::unbounded_channel::<SampleResult>();

    let mut workers = Vec::with_capacity(threads);
    for thread in 0..threads {
        let sampler = Arc::clone(&sampler);
        let next = Arc::clone(&next);
        let context = Arc::clone(&context);
        let tx = tx.clone();
        let iterations = options.iterations;
        workers.push(tokio::spawn(async move {
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= iterations {
                    break;
                }
                let result = sampler
                    .run_test(&iteration_context(&context, index, thread))
                    .await;
                if tx.send(result).is_err() {
                    break;
                }
            }
            debug!("Worker {} finished", thread);
        }));
    }
    drop(tx);

    let mut builder = SummaryBuilder::new();
    let mut recorded = 0u64;
    let mut write_error = None;
    while let Some(result) = rx.recv().await {
        builder.record(&result);
        recorded += 1;
        if write_error.is_none() {
            if let Some(w) = writer.as_mut() {
                if let Err(e) = write_result(w, &result) {
                    warn!("Stopped writing results file: {:#}", e);
                    write_error = Some(e);
                }
            }
        }
        if recorded % PROGRESS_INTERVAL == 0 {
            info!("{}/{} samples", recorded, options.iterations);
        }
    }

    for worker in workers {
        if let Err(e) = worker.await {
            warn!("Worker task failed: {}", e);
        }
    }
    let wall_time = started.elapsed();

    let teardown_error = match sampler.teardown_test(&context).await {
        Ok(()) => None,
        Err(e) => {
            warn!("Sampler teardown failed: {}", e);
            Some(e.to_string())
        }
    };

    if let Some(mut w) = writer {
        if write_error.is_none() {
            if let Err(e) = w.flush().context("Failed to flush results file") {
                warn!("{:#}", e);
                write_error = Some(e);
            }
        }
    }

    let summary = builder.finish(wall_time);
    info!(
        "Run complete: {} samples, {} errors in {:?} ({:.2} samples/sec)",
        summary.samples,
        summary.errors,
        Duration::from_millis(summary.duration_ms),
        summary.samples_per_second
    );

    Ok(RunOutcome {
        summary,
        teardown_error,
        results_error: write_error.map(|e| format!("{e:#}")),
    })
}

fn write_result(writer: &mut impl Write, result: &SampleResult) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *writer, result).context("Failed to encode sample")?;
    writer
        .write_all(b"\n")
        .context("Failed to write results file")?;
    Ok(())
}
