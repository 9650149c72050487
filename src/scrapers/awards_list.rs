use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{extraction_date, fetch_or_skip, CellSource};
use crate::constants::{AWARDS_LIST_SOURCE, AWARDS_LIST_URL};
use crate::types::Cell;

/// One award per block: the link names it, the `small` text holds its years.
const BLOCK_SELECTOR: &str = "td.datacolBox";
const AWARD_SELECTOR: &str = "a[href]";
const YEARS_SELECTOR: &str = "small";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardListRow {
    pub award: String,
    pub years: String,
    pub link: String,
    pub source_url: String,
    pub extraction_date: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AwardBlocks {
    pub rows: Vec<AwardListRow>,
    pub malformed: usize,
}

fn absolute_link(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Build one row per block from its first award link and first `small`.
///
/// A block missing either part counts as malformed.
pub fn rows_from_blocks(blocks: &[Vec<Option<Cell>>], page_url: &str, date: &str) -> AwardBlocks {
    let mut result = AwardBlocks::default();
    for block in blocks {
        match block.as_slice() {
            [Some(award), Some(years)] => result.rows.push(AwardListRow {
                award: award.text.clone(),
                years: years.text.clone(),
                link: absolute_link(page_url, award.href.as_deref().unwrap_or_default()),
                source_url: page_url.to_string(),
                extraction_date: date.to_string(),
            }),
            _ => result.malformed += 1,
        }
    }
    result
}

pub async fn scrape(source: &dyn CellSource) -> Vec<AwardListRow> {
    let Some(page) = fetch_or_skip(source, AWARDS_LIST_SOURCE, AWARDS_LIST_URL).await else {
        return Vec::new();
    };
    let blocks = match page.blocks(BLOCK_SELECTOR, &[AWARD_SELECTOR, YEARS_SELECTOR]) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!("Could not select award blocks: {}", e);
            return Vec::new();
        }
    };

    let blocks = rows_from_blocks(&blocks, AWARDS_LIST_URL, &extraction_date());
    if blocks.malformed > 0 {
        debug!("Skipped {} malformed award blocks", blocks.malformed);
    }
    info!("Extracted {} awards", blocks.rows.len());
    blocks.rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::fixtures::FixtureSource;

    #[tokio::test]
    async fn test_scrape_pairs_links_with_years() {
        let html = r#"<table><tr>
            <td class="datacolBox"><a href="/awards/aw_mvpa.shtml">Most Valuable Player</a><br><small>1931-2024</small></td>
            <td class="datacolBox"><a href="/awards/broken.shtml">No Years Award</a></td>
            <td class="datacolBox"><a href="https://other.example/cy.shtml">Cy Young</a> <small>1956-2024</small></td>
        </tr></table>"#;
        let source = FixtureSource::default().with_page(AWARDS_LIST_URL, html);

        let rows = scrape(&source).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].award, "Most Valuable Player");
        assert_eq!(rows[0].years, "1931-2024");
        assert_eq!(rows[0].link, "https://www.baseball-almanac.com/awards/aw_mvpa.shtml");
        assert_eq!(rows[1].award, "Cy Young");
        assert_eq!(rows[1].link, "https://other.example/cy.shtml");
    }

    #[tokio::test]
    async fn test_blocks_pair_by_element_kind() {
        let html = r#"<table><tr>
            <td class="datacolBox"><a name="gg"></a><a href="/awards/gg.shtml">Gold Glove</a> <small>1957-2024</small></td>
            <td class="datacolBox"><a href="/awards/roy.shtml">Rookie of the Year</a> <small><a href="/notes.shtml">1947-2024</a></small></td>
        </tr></table>"#;
        let source = FixtureSource::default().with_page(AWARDS_LIST_URL, html);

        let rows = scrape(&source).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].award, "Gold Glove");
        assert_eq!(rows[0].years, "1957-2024");
        assert_eq!(rows[0].link, "https://www.baseball-almanac.com/awards/gg.shtml");
        assert_eq!(rows[1].award, "Rookie of the Year");
        assert_eq!(rows[1].years, "1947-2024");
        assert_eq!(rows[1].link, "https://www.baseball-almanac.com/awards/roy.shtml");
    }

    #[test]
    fn test_malformed_blocks_are_counted() {
        let mut link = Cell::unclassed("Gold Glove");
        link.href = Some("/gg.shtml".into());
        let years = Cell::unclassed("1957-2024");
        let blocks = vec![
            vec![Some(link.clone()), Some(years.clone())],
            vec![Some(link), None],
            vec![None, Some(years)],
            vec![None, None],
        ];

        let result = rows_from_blocks(&blocks, AWARDS_LIST_URL, "2024-01-01");

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].link, "https://www.baseball-almanac.com/gg.shtml");
        assert_eq!(result.malformed, 3);
    }
}
