//! Record grouping
//!
//! Turns a flat stream of table cells into keyed records. Record boundaries are
//! not explicit in the markup: a cell of the boundary class whose text is a
//! plain index (`"12."`) opens a new record, and every non-empty cell of the
//! field class contributes one value to the record currently open.
//!
//! The grouper is a two-state machine driven only by the `(class, text)` of
//! each cell, so the whole thing is a fold over the stream:
//!
//! ```text
//! NoAccumulator --boundary--> Accumulating(key, [])
//! Accumulating  --field-----> Accumulating(key, fields + text)
//! Accumulating  --boundary--> emit if fields non-empty, Accumulating(new key, [])
//! end of stream             : emit if fields non-empty
//! ```
//!
//! A cell without a class attribute means the table structure is not what we
//! expect, and grouping of that table stops with a structural error.

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::types::{Cell, RawRecord};
use tracing::{debug, error, warn};

/// Which cell classes open a record and which carry its values.
#[derive(Debug, Clone)]
pub struct GroupingRule {
    pub boundary_class: String,
    pub field_class: String,
}

impl GroupingRule {
    pub fn new(boundary_class: &str, field_class: &str) -> Self {
        Self {
            boundary_class: boundary_class.to_string(),
            field_class: field_class.to_string(),
        }
    }
}

/// A record assembled from one boundary cell and the field cells after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedRecord {
    pub key: u64,
    pub fields: Vec<String>,
}

impl GroupedRecord {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Flatten into a raw record with the key under `key_field` and the
    /// values joined by `delimiter` under `list_field`.
    pub fn into_raw_record(self, key_field: &str, list_field: &str, delimiter: char) -> RawRecord {
        let joined = self.fields.join(&delimiter.to_string());
        RawRecord::new()
            .with(key_field, &self.key.to_string())
            .with(list_field, &joined)
    }
}

/// The digits of a boundary index such as `"7."` or `"7"`.
///
/// Only a run of ASCII digits, optionally followed by a single period, counts.
pub fn boundary_digits(text: &str) -> Option<&str> {
    let text = text.trim();
    let digits = text.strip_suffix('.').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// Parse a boundary index. `Ok(None)` means the text is not an index at all.
///
/// An index too large for a `u64` is a structural error rather than a
/// non-boundary, since treating it as a field would merge two records.
pub fn boundary_key(text: &str) -> Result<Option<u64>> {
    match boundary_digits(text) {
        None => Ok(None),
        Some(digits) => digits.parse().map(Some).map_err(|_| {
            PipelineError::StructuralExtraction(format!("boundary index {:?} out of range", digits))
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GrouperState {
    NoAccumulator,
    Accumulating { key: u64, fields: Vec<String> },
}

impl GrouperState {
    /// Consume one cell, returning the next state and any completed record.
    fn step(self, cell: &Cell, rule: &GroupingRule) -> Result<(GrouperState, Option<GroupedRecord>)> {
        if cell.class_tag.is_none() {
            return Err(PipelineError::StructuralExtraction(format!(
                "cell without class attribute (text: {:?})",
                cell.text
            )));
        }

        if cell.has_class(&rule.boundary_class) {
            if let Some(key) = boundary_key(&cell.text)? {
                let next = GrouperState::Accumulating { key, fields: Vec::new() };
                return Ok((next, self.finish()));
            }
        }

        if cell.has_class(&rule.field_class) {
            let text = cell.text.trim();
            if !text.is_empty() {
                if let GrouperState::Accumulating { key, mut fields } = self {
                    fields.push(text.to_string());
                    return Ok((GrouperState::Accumulating { key, fields }, None));
                }
            }
        }

        Ok((self, None))
    }

    /// Close the open accumulator. One that never received a field is dropped.
    fn finish(self) -> Option<GroupedRecord> {
        match self {
            GrouperState::Accumulating { key, fields } if !fields.is_empty() => {
                Some(GroupedRecord { key, fields })
            }
            GrouperState::Accumulating { key, .. } => {
                debug!("Dropping index {} with no fields", key);
                None
            }
            GrouperState::NoAccumulator => None,
        }
    }
}

/// Lazy, one-shot grouping over a cell iterator.
///
/// Yields `Err` at most once, after which the iterator is exhausted.
pub struct GroupRecords<I> {
    cells: I,
    rule: GroupingRule,
    state: GrouperState,
    done: bool,
}

impl<I: Iterator<Item = Cell>> GroupRecords<I> {
    pub fn new(cells: I, rule: GroupingRule) -> Self {
        Self {
            cells,
            rule,
            state: GrouperState::NoAccumulator,
            done: false,
        }
    }
}

impl<I: Iterator<Item = Cell>> Iterator for GroupRecords<I> {
    type Item = Result<GroupedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let state = std::mem::replace(&mut self.state, GrouperState::NoAccumulator);
            match self.cells.next() {
                Some(cell) => match state.step(&cell, &self.rule) {
                    Ok((next, emitted)) => {
                        self.state = next;
                        if let Some(record) = emitted {
                            return Some(Ok(record));
                        }
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                None => {
                    self.done = true;
                    return state.finish().map(Ok);
                }
            }
        }
    }
}

/// Group a whole table. Any structural error discards everything grouped so far.
pub fn group_cells<I>(cells: I, rule: &GroupingRule) -> Result<Vec<GroupedRecord>>
where
    I: IntoIterator<Item = Cell>,
{
    GroupRecords::new(cells.into_iter(), rule.clone()).collect()
}

/// Group the cells of `table`, logging and absorbing structural errors.
///
/// An empty result always needs a look: it means either the page had no data or
/// its structure changed.
pub fn extract_records(table: &str, cells: Vec<Cell>, rule: &GroupingRule) -> Vec<GroupedRecord> {
    let cell_count = cells.len();
    match group_cells(cells, rule) {
        Ok(records) => {
            if records.is_empty() {
                warn!("No records extracted for {} from {} cells", table, cell_count);
            } else {
                debug!("Grouped {} cells into {} records for {}", cell_count, records.len(), table);
            }
            PipelineMetrics::record_grouped(table, records.len());
            records
        }
        Err(e) => {
            error!("Extraction aborted for {}: {} (0 records extracted)", table, e);
            PipelineMetrics::record_structural_failure(table);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> GroupingRule {
        GroupingRule::new("idx", "box")
    }

    fn idx(text: &str) -> Cell {
        Cell::new("idx", text)
    }

    fn field(text: &str) -> Cell {
        Cell::new("box", text)
    }

    #[test]
    fn test_boundary_key_is_strict() {
        assert_eq!(boundary_key("1.").unwrap(), Some(1));
        assert_eq!(boundary_key("42").unwrap(), Some(42));
        assert_eq!(boundary_key(" 7. ").unwrap(), Some(7));
        for text in ["1..", "1a.", "-3.", "+3", ".", "", "Set"] {
            assert_eq!(boundary_key(text).unwrap(), None, "{:?}", text);
            assert_eq!(boundary_digits(text), None);
        }
    }

    #[test]
    fn test_large_boundary_index_still_opens_a_record() {
        let cells = vec![idx("1."), field("A"), idx("99999999999."), field("B")];

        let records = group_cells(cells, &rule()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, vec!["A".to_string()]);
        assert_eq!(records[1].key, 99_999_999_999);
        assert_eq!(records[1].fields, vec!["B".to_string()]);
    }

    #[test]
    fn test_unrepresentable_boundary_index_aborts_the_table() {
        let huge = "123456789012345678901234567890.";
        assert_eq!(boundary_digits(huge), Some("123456789012345678901234567890"));
        assert!(matches!(boundary_key(huge), Err(PipelineError::StructuralExtraction(_))));

        let cells = vec![idx("1."), field("A"), idx(huge), field("B")];

        let result = group_cells(cells.clone(), &rule());
        assert!(matches!(result, Err(PipelineError::StructuralExtraction(_))));
        assert!(extract_records("brothers", cells, &rule()).is_empty());
    }

    #[test]
    fn test_one_record_per_boundary_when_every_boundary_has_fields() {
        let cells = vec![
            idx("1."),
            field("Hank Aaron"),
            field("Tommie Aaron"),
            idx("2."),
            field("Joe DiMaggio"),
            field("Dom DiMaggio"),
            field("Vince DiMaggio"),
        ];

        let records = group_cells(cells, &rule()).unwrap();

        assert_eq!(
            records,
            vec![
                GroupedRecord {
                    key: 1,
                    fields: vec!["Hank Aaron".into(), "Tommie Aaron".into()],
                },
                GroupedRecord {
                    key: 2,
                    fields: vec!["Joe DiMaggio".into(), "Dom DiMaggio".into(), "Vince DiMaggio".into()],
                },
            ]
        );
        assert_eq!(records[1].field_count(), 3);
    }

    #[test]
    fn test_boundary_without_fields_is_dropped() {
        let cells = vec![idx("1."), idx("2."), field("Only Child"), idx("3.")];

        let records = group_cells(cells, &rule()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, 2);
        assert_eq!(records[0].fields, vec!["Only Child".to_string()]);
    }

    #[test]
    fn test_emitted_records_never_exceed_boundaries() {
        let streams = vec![
            vec![],
            vec![idx("1.")],
            vec![field("orphan"), idx("1."), field("a")],
            vec![idx("1."), field(""), field("  "), idx("2."), field("b")],
            vec![idx("1."), idx("2."), idx("3.")],
        ];
        for cells in streams {
            let boundaries = cells
                .iter()
                .filter(|c| c.has_class("idx") && boundary_digits(&c.text).is_some())
                .count();
            let records = group_cells(cells, &rule()).unwrap();
            assert!(records.len() <= boundaries);
            assert!(records.iter().all(|r| r.field_count() > 0));
        }
    }

    #[test]
    fn test_non_numeric_boundary_text_is_not_a_boundary() {
        let cells = vec![idx("1."), field("A"), idx("Notes"), field("B")];

        let records = group_cells(cells, &rule()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_decorative_and_leading_fields_are_ignored() {
        let cells = vec![
            field("before any index"),
            Cell::new("spacer", "   "),
            idx("1."),
            Cell::new("banner", "Brothers"),
            field("  Paul Waner "),
            field(""),
            field("Lloyd Waner"),
        ];

        let records = group_cells(cells, &rule()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields, vec!["Paul Waner".to_string(), "Lloyd Waner".to_string()]);
    }

    #[test]
    fn test_missing_class_aborts_the_table() {
        let cells = vec![
            idx("1."),
            field("A"),
            idx("2."),
            field("B"),
            Cell::unclassed("broken"),
            idx("3."),
            field("C"),
        ];

        let result = group_cells(cells.clone(), &rule());
        assert!(matches!(result, Err(PipelineError::StructuralExtraction(_))));

        assert!(extract_records("brothers", cells, &rule()).is_empty());
    }

    #[test]
    fn test_iterator_is_lazy_and_stops_after_error() {
        let cells = vec![idx("1."), field("A"), idx("2."), Cell::unclassed("x"), field("B")];
        let mut grouped = GroupRecords::new(cells.into_iter(), rule());

        assert_eq!(grouped.next().unwrap().unwrap().key, 1);
        assert!(grouped.next().unwrap().is_err());
        assert!(grouped.next().is_none());
    }

    #[test]
    fn test_into_raw_record_joins_fields() {
        let record = GroupedRecord {
            key: 4,
            fields: vec!["Felipe Alou".into(), "Matty Alou".into(), "Jesus Alou".into()],
        };

        let raw = record.into_raw_record("set_number", "brothers_names", ';');

        assert_eq!(raw.get("set_number"), Some("4"));
        assert_eq!(raw.get("brothers_names"), Some("Felipe Alou;Matty Alou;Jesus Alou"));
    }
}
