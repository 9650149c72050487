use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{extraction_date, fetch_or_skip, CellSource, TableCells};
use crate::constants::{MVP_AWARDS_SOURCE, MVP_AWARDS_URL};

const MIN_CELLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpAwardRow {
    pub year: String,
    pub player_name: String,
    pub league: String,
    pub team: String,
    pub position: String,
    pub source_url: String,
    pub extraction_date: String,
}

/// One row per award from the first table; the header row and short rows are skipped.
pub fn rows_from_table(table: &TableCells, source_url: &str, date: &str) -> Vec<MvpAwardRow> {
    table
        .rows
        .iter()
        .skip(1)
        .filter(|cells| cells.len() >= MIN_CELLS)
        .map(|cells| MvpAwardRow {
            year: cells[0].text.clone(),
            player_name: cells[1].text.clone(),
            league: cells[2].text.clone(),
            team: cells[3].text.clone(),
            position: cells[4].text.clone(),
            source_url: source_url.to_string(),
            extraction_date: date.to_string(),
        })
        .collect()
}

pub async fn scrape(source: &dyn CellSource) -> Vec<MvpAwardRow> {
    let Some(page) = fetch_or_skip(source, MVP_AWARDS_SOURCE, MVP_AWARDS_URL).await else {
        return Vec::new();
    };
    let tables = match page.tables("table.boxed") {
        Ok(tables) => tables,
        Err(e) => {
            warn!("Could not select MVP table: {}", e);
            return Vec::new();
        }
    };
    let Some(table) = tables.first() else {
        warn!("No MVP table on {}", MVP_AWARDS_URL);
        return Vec::new();
    };

    let rows = rows_from_table(table, MVP_AWARDS_URL, &extraction_date());
    info!("Extracted {} MVP award rows", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::fixtures::FixtureSource;

    const PAGE: &str = r#"<table class="boxed">
        <tr><td>Year</td><td>Player</td><td>League</td><td>Team</td><td>Position</td></tr>
        <tr><td>1931</td><td>Lefty Grove</td><td>A.L.</td><td>Philadelphia Athletics</td><td>P</td></tr>
        <tr><td colspan="5">Notes</td></tr>
        <tr><td>1931</td><td>Frankie Frisch</td><td>N.L.</td><td>St. Louis Cardinals</td><td>2B</td></tr>
    </table>"#;

    #[tokio::test]
    async fn test_scrape_skips_header_and_short_rows() {
        let source = FixtureSource::default().with_page(MVP_AWARDS_URL, PAGE);

        let rows = scrape(&source).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_name, "Lefty Grove");
        assert_eq!(rows[0].league, "A.L.");
        assert_eq!(rows[1].position, "2B");
        assert_eq!(rows[1].source_url, MVP_AWARDS_URL);
    }

    #[tokio::test]
    async fn test_page_without_table_is_empty() {
        let source = FixtureSource::default().with_page(MVP_AWARDS_URL, "<p>moved</p>");
        assert!(scrape(&source).await.is_empty());
    }
}
