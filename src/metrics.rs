//! Pipeline Metrics
//!
//! Counters and histograms for each stage of a run: fetching, grouping,
//! normalization, the quality gate and table loads. Only the `metrics` facade
//! is used here; whoever embeds the pipeline decides whether to install a
//! recorder.

use crate::pipeline::processing::quality_gate::GateStats;

/// Build a metric name with the crate prefix and the right suffix for its kind.
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("baseball_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("baseball_", $phase, "_", $name)
    };
}

pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn record_fetch(url_kind: &str, page_bytes: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "pages"), "source" => url_kind.to_string())
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "fetch", "page_bytes")).record(page_bytes as f64);
        ::metrics::histogram!(phase_metric!(histogram, "fetch", "duration_seconds")).record(duration_secs);
    }

    pub fn record_fetch_error(url_kind: &str) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "errors"), "source" => url_kind.to_string())
            .increment(1);
    }

    pub fn record_grouped(table: &str, records: usize) {
        ::metrics::counter!(phase_metric!(counter, "grouper", "records"), "table" => table.to_string())
            .increment(records as u64);
    }

    pub fn record_structural_failure(table: &str) {
        ::metrics::counter!(phase_metric!(counter, "grouper", "structural_errors"), "table" => table.to_string())
            .increment(1);
    }

    pub fn record_gate(table: &str, stats: &GateStats) {
        let table = table.to_string();
        ::metrics::counter!(phase_metric!(counter, "gate", "input_records"), "table" => table.clone())
            .increment(stats.input_count as u64);
        ::metrics::counter!(phase_metric!(counter, "gate", "duplicates"), "table" => table.clone())
            .increment(stats.duplicate_count as u64);
        ::metrics::counter!(phase_metric!(counter, "gate", "rejections"), "table" => table.clone())
            .increment(stats.rejected_count as u64);
        ::metrics::counter!(phase_metric!(counter, "gate", "output_records"), "table" => table)
            .increment(stats.output_count as u64);
    }

    pub fn record_table_load(table: &str, rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "loader", "rows"), "table" => table.to_string())
            .increment(rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "loader", "duration_seconds")).record(duration_secs);
    }

    pub fn record_table_failure(table: &str) {
        ::metrics::counter!(phase_metric!(counter, "loader", "failures"), "table" => table.to_string())
            .increment(1);
    }
}
