//! Extraction-and-normalization pipeline
//!
//! ```text
//! cells ──grouper──▶ raw records ──normalize──▶ clean records ──quality gate──▶ table store
//! ```
//!
//! Every stage finishes before the next one starts.

pub mod grouper;
pub mod importer;
pub mod processing;

use crate::metrics::PipelineMetrics;
use processing::normalize::schema::Schema;
use processing::normalize::SchemaNormalizer;
use processing::quality_gate::{GateOutcome, QualityGate};
use crate::types::RawRecord;

/// Normalize then gate one table's raw records.
pub fn process_records(normalizer: &SchemaNormalizer, schema: &Schema, raws: &[RawRecord]) -> GateOutcome {
    let cleaned = normalizer.normalize_all(schema, raws);
    let outcome = QualityGate::new(schema).filter(cleaned);
    PipelineMetrics::record_gate(schema.table, &outcome.stats);
    outcome
}
