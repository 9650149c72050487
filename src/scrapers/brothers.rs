//! Brothers-in-baseball sets: a numbered index cell followed by one cell per brother.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{fetch_or_skip, CellSource};
use crate::constants::{
    BROTHERS_CELL_SELECTOR, BROTHERS_INDEX_CLASS, BROTHERS_NAME_CLASS, BROTHERS_SETS_TABLE, BROTHERS_SOURCE,
    BROTHERS_URL, LIST_DELIMITER,
};
use crate::pipeline::grouper::{extract_records, GroupedRecord, GroupingRule};
use crate::types::Cell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrothersSetRow {
    pub set_number: u64,
    pub brothers_names: String,
}

impl From<GroupedRecord> for BrothersSetRow {
    fn from(record: GroupedRecord) -> Self {
        Self {
            set_number: record.key,
            brothers_names: record.fields.join(&LIST_DELIMITER.to_string()),
        }
    }
}

pub fn grouping_rule() -> GroupingRule {
    GroupingRule::new(BROTHERS_INDEX_CLASS, BROTHERS_NAME_CLASS)
}

/// Group the page's cells into one row per set. A structurally broken page yields no rows.
pub fn rows_from_cells(cells: Vec<Cell>) -> Vec<BrothersSetRow> {
    extract_records(BROTHERS_SETS_TABLE, cells, &grouping_rule())
        .into_iter()
        .map(BrothersSetRow::from)
        .collect()
}

pub async fn scrape(source: &dyn CellSource) -> Vec<BrothersSetRow> {
    let Some(page) = fetch_or_skip(source, BROTHERS_SOURCE, BROTHERS_URL).await else {
        return Vec::new();
    };
    let cells = match page.cells(BROTHERS_CELL_SELECTOR) {
        Ok(cells) => cells,
        Err(e) => {
            tracing::warn!("Could not select brothers cells: {}", e);
            return Vec::new();
        }
    };
    info!("Found {} cells on brothers page", cells.len());
    rows_from_cells(cells)
}
