//! Run summary formatting.

use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use kafkameter_sampler::{Arguments, DeliveryMode, RunSummary};
use serde::Serialize;

use crate::harness::RunOutcome;

/// Everything printed at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub label: String,
    pub topic: String,
    pub brokers: String,
    pub delivery: String,
    pub threads: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_error: Option<String>,
}

impl RunReport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: &str,
        topic: &str,
        brokers: &[String],
        delivery: DeliveryMode,
        threads: usize,
        dry_run: bool,
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
    ) -> Self {
        Self {
            label: label.to_string(),
            topic: topic.to_string(),
            brokers: brokers.join(","),
            delivery: delivery.to_string(),
            threads,
            dry_run,
            started_at,
            completed_at: Utc::now(),
            summary: outcome.summary,
            teardown_error: outcome.teardown_error,
            results_error: outcome.results_error,
        }
    }
}

/// Format the report as tables.
pub fn format_table(report: &RunReport) -> String {
    let s = &report.summary;
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Label", "Samples", "Errors", "Error %", "Min ms", "Mean ms", "p50 ms", "p90 ms",
        "p95 ms", "p99 ms", "Max ms", "Samples/s",
    ]);

    let error_cell = if s.errors > 0 {
        Cell::new(s.errors).fg(Color::Red)
    } else {
        Cell::new(s.errors).fg(Color::Green)
    };
    table.add_row(vec![
        Cell::new(&report.label),
        Cell::new(s.samples),
        error_cell,
        Cell::new(format!("{:.2}", s.error_rate * 100.0)),
        Cell::new(format!("{:.3}", s.min_ms)),
        Cell::new(format!("{:.3}", s.mean_ms)),
        Cell::new(format!("{:.3}", s.p50_ms)),
        Cell::new(format!("{:.3}", s.p90_ms)),
        Cell::new(format!("{:.3}", s.p95_ms)),
        Cell::new(format!("{:.3}", s.p99_ms)),
        Cell::new(format!("{:.3}", s.max_ms)),
        Cell::new(format!("{:.1}", s.samples_per_second)),
    ]);

    output.push_str(&format!(
        "Topic '{}' on {} ({} delivery, {} worker(s){})\n",
        report.topic,
        report.brokers,
        report.delivery,
        report.threads,
        if report.dry_run { ", dry run" } else { "" }
    ));
    output.push_str(&table.to_string());
    output.push('\n');

    if !s.error_breakdown.is_empty() {
        let mut errors = Table::new();
        errors.load_preset(UTF8_FULL);
        errors.set_header(vec!["Error", "Count"]);
        for (message, count) in &s.error_breakdown {
            errors.add_row(vec![Cell::new(message), Cell::new(count)]);
        }
        output.push_str(&errors.to_string());
        output.push('\n');
    }

    if let Some(e) = &report.teardown_error {
        output.push_str(&format!("Teardown failed: {e}\n"));
    }
    if let Some(e) = &report.results_error {
        output.push_str(&format!("Results file incomplete: {e}\n"));
    }

    output
}

/// Format advertised sampler parameters.
pub fn format_parameters(arguments: &Arguments) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Parameter", "Default"]);
    for argument in arguments.iter() {
        table.add_row(vec![&argument.name, &argument.value]);
    }
    table.to_string()
}
