//! Command-line interface for kafkameter
//!
//! # Usage Examples
//!
//! ```bash
//! # Produce 1000 messages to t1 on the local broker
//! kafkameter run --topic t1 --message hello
//!
//! # Numeric values, 8 workers, acknowledged delivery
//! kafkameter run --topic counters --message '{index}' \
//!   --value-serializer org.apache.kafka.common.serialization.LongSerializer \
//!   --threads 8 --iterations 100000 --await-delivery
//!
//! # Validate parameters without a cluster
//! kafkameter run --topic t1 --message hello --dry-run
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use kafkameter::report::{format_parameters, format_table};
use kafkameter::{run_load_test, HarnessOptions, OutputFormat, RunArgs, RunReport};
use kafkameter_sampler::{
    default_parameters, KafkaConnector, MemoryConnector, ProduceSampler, SamplerClient,
};

#[derive(Parser)]
#[command(name = "kafkameter")]
#[command(about = "Produce load against a Kafka cluster, one message per iteration")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a produce load test
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// List the sampler parameters and their defaults
    Params,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => run_command(args).await,
        Commands::Params => {
            println!("{}", format_parameters(&default_parameters()));
            Ok(())
        }
    }
}

async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let settings = args.producer_settings();
    let delivery = settings.delivery_mode;

    let sampler: Arc<dyn SamplerClient> = if args.dry_run {
        tracing::info!("[DRY-RUN] Messages are recorded in memory, not sent");
        Arc::new(ProduceSampler::new(MemoryConnector::new(), settings).with_label(&args.label))
    } else {
        Arc::new(ProduceSampler::new(KafkaConnector, settings).with_label(&args.label))
    };

    let options = HarnessOptions {
        iterations: args.iterations,
        threads: usize::from(args.threads),
        results_file: args.results_file.clone(),
    };

    let started_at = Utc::now();
    let outcome = run_load_test(sampler, args.context(), &options)
        .await
        .with_context(|| format!("Load test against topic '{}' failed", args.topic))?;

    let report = RunReport::new(
        &args.label,
        &args.topic,
        &args.brokers,
        delivery,
        options.threads,
        args.dry_run,
        started_at,
        outcome,
    );

    match args.output {
        OutputFormat::Table => println!("{}", format_table(&report)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        ),
    }

    Ok(())
}
