//! Page fetching and the per-page scrapers that turn fetched cells into raw CSV files.

pub mod awards_list;
pub mod brothers;
pub mod mvp_awards;
pub mod yearly;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::ScrapeConfig;
use crate::constants;
use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::types::Cell;

/// A fetched HTML document. Parsing happens on demand, so the page can cross await points.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub url: String,
    body: String,
}

/// Cells of one `<table>`: its caption and, per `<tr>`, the `<td>` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCells {
    pub caption: Option<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl HtmlPage {
    pub fn new(url: &str, body: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            body: body.into(),
        }
    }

    /// Every element matching `selector`, in document order.
    pub fn cells(&self, selector: &str) -> Result<Vec<Cell>> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.body);
        Ok(document.select(&selector).map(cell_from_element).collect())
    }

    /// Tables matching `table_selector`, split into rows of `td` cells.
    pub fn tables(&self, table_selector: &str) -> Result<Vec<TableCells>> {
        let table_selector = parse_selector(table_selector)?;
        let caption_selector = parse_selector("caption")?;
        let row_selector = parse_selector("tr")?;
        let cell_selector = parse_selector("td")?;
        let document = Html::parse_document(&self.body);

        let tables = document
            .select(&table_selector)
            .map(|table| TableCells {
                caption: table.select(&caption_selector).next().map(element_text),
                rows: table
                    .select(&row_selector)
                    .map(|row| row.select(&cell_selector).map(cell_from_element).collect())
                    .collect(),
            })
            .collect();
        Ok(tables)
    }

    /// For each element matching `block_selector`, the first descendant matching
    /// each of `child_selectors`, in the order given.
    pub fn blocks(&self, block_selector: &str, child_selectors: &[&str]) -> Result<Vec<Vec<Option<Cell>>>> {
        let block_selector = parse_selector(block_selector)?;
        let child_selectors = child_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        let document = Html::parse_document(&self.body);

        let blocks = document
            .select(&block_selector)
            .map(|block| {
                child_selectors
                    .iter()
                    .map(|child| block.select(child).next().map(cell_from_element))
                    .collect()
            })
            .collect();
        Ok(blocks)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PipelineError::Selector(format!("{}: {:?}", selector, e)))
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn cell_from_element(element: ElementRef) -> Cell {
    let href = element.value().attr("href").map(str::to_string).or_else(|| {
        element
            .descendants()
            .filter_map(ElementRef::wrap)
            .find_map(|e| e.value().attr("href"))
            .map(str::to_string)
    });
    Cell {
        class_tag: element.value().attr("class").map(str::to_string),
        text: element_text(element),
        href,
    }
}

/// The page-fetch capability the pipeline depends on.
#[async_trait]
pub trait CellSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<HtmlPage>;

    /// Cells selected from the page at `url`.
    async fn fetch(&self, url: &str, selector: &str) -> Result<Vec<Cell>> {
        self.fetch_page(url).await?.cells(selector)
    }
}

/// Fetches over HTTP, waiting the configured politeness delay between requests.
pub struct HttpCellSource {
    client: reqwest::Client,
    delay: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl HttpCellSource {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            delay: config.delay(),
            last_fetch: Mutex::new(None),
        })
    }

    async fn pace(&self) {
        let mut last = self.last_fetch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                let wait = self.delay - elapsed;
                debug!("Waiting {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl CellSource for HttpCellSource {
    #[instrument(skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<HtmlPage> {
        self.pace().await;
        info!("🌐 Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(HtmlPage::new(url, body))
    }
}

/// Fetch a page, treating any failure as a page with nothing on it.
pub async fn fetch_or_skip(source: &dyn CellSource, kind: &str, url: &str) -> Option<HtmlPage> {
    let started = Instant::now();
    match source.fetch_page(url).await {
        Ok(page) => {
            PipelineMetrics::record_fetch(kind, page.body.len(), started.elapsed().as_secs_f64());
            Some(page)
        }
        Err(e) => {
            warn!("Failed to fetch {} ({}): {}; treating as empty page", url, kind, e);
            PipelineMetrics::record_fetch_error(kind);
            None
        }
    }
}

/// Today's date as stamped on scraped rows.
pub fn extraction_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Rows written for one destination table during a scrape
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub source: String,
    pub table: &'static str,
    pub rows: usize,
    pub output_file: Option<PathBuf>,
}

fn save<T: Serialize>(source: &str, table: &'static str, rows: &[T], raw_dir: &Path) -> Result<ScrapeReport> {
    if rows.is_empty() {
        warn!("No records extracted for {}; leaving any previous file in place", table);
        return Ok(ScrapeReport {
            source: source.to_string(),
            table,
            rows: 0,
            output_file: None,
        });
    }
    let path = raw_dir.join(format!("{}.csv", table));
    write_csv(&path, rows)?;
    info!("💾 Saved {} {} rows to {}", rows.len(), table, path.display());
    Ok(ScrapeReport {
        source: source.to_string(),
        table,
        rows: rows.len(),
        output_file: Some(path),
    })
}

/// Run the named scrapers one after another, writing one CSV per table into `raw_dir`.
pub async fn run_sources(
    source: &dyn CellSource,
    names: &[String],
    config: &ScrapeConfig,
    raw_dir: &Path,
) -> Result<Vec<ScrapeReport>> {
    let mut reports = Vec::new();
    for name in names {
        let span = tracing::info_span!("Running source", source = %name);
        let _enter = span.enter();

        match name.as_str() {
            constants::BROTHERS_SOURCE => {
                let rows = brothers::scrape(source).await;
                reports.push(save(name, constants::BROTHERS_SETS_TABLE, &rows, raw_dir)?);
            }
            constants::MVP_AWARDS_SOURCE => {
                let rows = mvp_awards::scrape(source).await;
                reports.push(save(name, constants::MVP_AWARDS_TABLE, &rows, raw_dir)?);
            }
            constants::AWARDS_LIST_SOURCE => {
                let rows = awards_list::scrape(source).await;
                reports.push(save(name, constants::AWARDS_LIST_TABLE, &rows, raw_dir)?);
            }
            constants::YEARLY_SOURCE => {
                let data = yearly::scrape(source, config).await;
                reports.push(save(name, constants::EVENTS_TABLE, &data.events, raw_dir)?);
                reports.push(save(name, constants::PLAYERS_TABLE, &data.players, raw_dir)?);
                reports.push(save(name, constants::STATISTICS_TABLE, &data.statistics, raw_dir)?);
            }
            other => warn!(
                "Unknown source {}; available: {}",
                other,
                constants::get_supported_sources().join(", ")
            ),
        }
    }
    Ok(reports)
}


#[cfg(test)]
mod tests {
    use super::fixtures::FixtureSource;
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table class="boxed">
            <caption> Home  Runs </caption>
            <tr><th>Rank</th><th>Player</th></tr>
            <tr><td class="datacolBlue">1.</td><td class="datacolBox"><a href="/p/aaron">Hank
                Aaron</a></td></tr>
            <tr><td>2.</td><td class="datacolBox middle">Tommie Aaron</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_cells_keep_class_text_and_href() {
        let page = HtmlPage::new("https://example.com", PAGE);

        let cells = page.cells("table.boxed td").unwrap();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], Cell::new("datacolBlue", "1."));
        assert_eq!(cells[1].text, "Hank Aaron");
        assert_eq!(cells[1].href.as_deref(), Some("/p/aaron"));
        assert_eq!(cells[2].class_tag, None);
        assert!(cells[3].has_class("datacolBox"));
    }

    #[test]
    fn test_tables_split_rows() {
        let page = HtmlPage::new("https://example.com", PAGE);

        let tables = page.tables("table.boxed").unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].caption.as_deref(), Some("Home Runs"));
        assert_eq!(tables[0].rows.len(), 3);
        assert!(tables[0].rows[0].is_empty());
        assert_eq!(tables[0].rows[2][1].text, "Tommie Aaron");
    }

    #[test]
    fn test_blocks_pick_first_child_of_each_kind() {
        let page = HtmlPage::new(
            "https://example.com",
            r#"<table><tr>
                <td class="datacolBox"><small>early</small><a href="/a">First</a><a href="/b">Second</a></td>
                <td class="datacolBox"><a href="/c">Alone</a></td>
            </tr></table>"#,
        );

        let blocks = page.blocks("td.datacolBox", &["a", "small"]).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0][0].as_ref().map(|c| c.text.as_str()), Some("First"));
        assert_eq!(blocks[0][1].as_ref().map(|c| c.text.as_str()), Some("early"));
        assert_eq!(blocks[1][0].as_ref().and_then(|c| c.href.as_deref()), Some("/c"));
        assert!(blocks[1][1].is_none());
        assert!(page.blocks("td", &["a[[["]).is_err());
    }

    #[test]
    fn test_bad_selector_is_an_error() {
        let page = HtmlPage::new("https://example.com", PAGE);
        assert!(matches!(page.cells("td[[["), Err(PipelineError::Selector(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_no_page() {
        let source = FixtureSource::default();
        assert!(fetch_or_skip(&source, "test", "https://example.com/missing").await.is_none());
        assert!(source.fetch("https://example.com/missing", "td").await.is_err());
    }

    #[tokio::test]
    async fn test_politeness_delay_between_fetches() {
        let config = ScrapeConfig {
            delay_ms: 50,
            ..ScrapeConfig::default()
        };
        let source = HttpCellSource::new(&config).unwrap();

        let started = Instant::now();
        source.pace().await;
        source.pace().await;

        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
