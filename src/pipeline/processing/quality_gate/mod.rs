use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::pipeline::processing::normalize::schema::Schema;
use crate::pipeline::processing::normalize::{CleanRecord, FieldValue};

/// Quality Gate decision for a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QualityDecision {
    /// Record meets every schema constraint
    Accept,
    /// Record breaks at least one constraint and is dropped
    Reject(Vec<QualityIssue>),
}

/// Individual reason a record was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub issue_type: QualityIssueType,
    pub field: &'static str,
    pub description: String,
}

/// Types of quality issues that can be detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityIssueType {
    /// Required text is empty after cleaning
    MissingData,
    /// Integer outside its declared bounds
    OutOfRange,
}

/// Counters for one pass of the gate.
///
/// `input_count == duplicate_count + rejected_count + output_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateStats {
    pub input_count: usize,
    pub duplicate_count: usize,
    pub rejected_count: usize,
    pub output_count: usize,
}

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub records: Vec<CleanRecord>,
    pub stats: GateStats,
}

/// Validation and deduplication against a schema.
pub struct QualityGate<'a> {
    schema: &'a Schema,
}

impl<'a> QualityGate<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Check one record against the schema's required fields and ranges.
    pub fn assess(&self, record: &CleanRecord) -> QualityDecision {
        let mut issues = Vec::new();

        for field in self.schema.fields {
            match record.get(field.name) {
                Some(FieldValue::Text(text)) if field.required && text.trim().is_empty() => {
                    issues.push(QualityIssue {
                        issue_type: QualityIssueType::MissingData,
                        field: field.name,
                        description: format!("{} is required", field.name),
                    });
                }
                Some(FieldValue::Integer(value)) => {
                    if let Some((min, max)) = field.range {
                        if *value < min || *value > max {
                            issues.push(QualityIssue {
                                issue_type: QualityIssueType::OutOfRange,
                                field: field.name,
                                description: format!("{} = {} outside [{}, {}]", field.name, value, min, max),
                            });
                        }
                    }
                }
                None if field.required => {
                    issues.push(QualityIssue {
                        issue_type: QualityIssueType::MissingData,
                        field: field.name,
                        description: format!("{} is absent", field.name),
                    });
                }
                _ => {}
            }
        }

        if issues.is_empty() {
            QualityDecision::Accept
        } else {
            QualityDecision::Reject(issues)
        }
    }

    /// Drop invalid records, then exact duplicates; the first copy of a record wins.
    #[instrument(skip(self, records), fields(table = self.schema.table))]
    pub fn filter(&self, records: Vec<CleanRecord>) -> GateOutcome {
        let mut stats = GateStats {
            input_count: records.len(),
            ..GateStats::default()
        };
        let mut seen: HashSet<CleanRecord> = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if let QualityDecision::Reject(issues) = self.assess(&record) {
                for issue in &issues {
                    debug!("Rejected {} record: {}", self.schema.table, issue.description);
                }
                stats.rejected_count += 1;
                continue;
            }
            if seen.contains(&record) {
                stats.duplicate_count += 1;
                continue;
            }
            seen.insert(record.clone());
            kept.push(record);
        }

        stats.output_count = kept.len();
        info!(
            "Quality gate for {}: {} in, {} duplicates, {} rejected, {} out",
            self.schema.table, stats.input_count, stats.duplicate_count, stats.rejected_count, stats.output_count
        );
        GateOutcome { records: kept, stats }
    }
}
