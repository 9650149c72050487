//! Season pages and the career leaders page: events, players and team statistics.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{fetch_or_skip, CellSource, HtmlPage, TableCells};
use crate::config::ScrapeConfig;
use crate::constants::{season_url, CAREER_LEADERS_URL, YEARLY_SOURCE};
use crate::types::Cell;

const SECTION_KEYWORDS: [&str; 3] = ["award", "leader", "champion"];
const LEADER_TABLES: usize = 3;
const LEADERS_PER_TABLE: usize = 5;
const CAREER_TABLES: usize = 5;
const CAREER_ROWS: usize = 10;
const TEAM_TABLES: usize = 2;
const TEAM_ROWS: usize = 10;
const FULL_SEASON_GAMES: u32 = 162;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub year: i32,
    pub event_type: String,
    pub description: String,
    pub value: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub player_name: String,
    pub stat_value: String,
    pub stat_type: String,
    pub team: String,
    pub category: String,
    pub rank: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatRow {
    pub year: i32,
    pub team: String,
    pub category: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub league: String,
}

#[derive(Debug, Default)]
pub struct YearlyData {
    pub events: Vec<EventRow>,
    pub players: Vec<PlayerRow>,
    pub statistics: Vec<TeamStatRow>,
}

/// Body rows of a table: the header row is dropped, then at most `limit` rows.
fn body_rows<'a>(table: &'a TableCells, limit: usize) -> impl Iterator<Item = &'a Vec<Cell>> + 'a {
    table.rows.iter().skip(1).take(limit)
}

fn selected_tables(page: &HtmlPage, selector: &str) -> Vec<TableCells> {
    page.tables(selector).unwrap_or_else(|e| {
        warn!("Could not select {} on {}: {}", selector, page.url, e);
        Vec::new()
    })
}

/// Award and leader events from one season page.
pub fn season_events(page: &HtmlPage, year: i32) -> Vec<EventRow> {
    let mut events: Vec<EventRow> = page
        .cells("div.section_heading")
        .unwrap_or_default()
        .into_iter()
        .filter(|heading| {
            let lower = heading.text.to_lowercase();
            SECTION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|heading| EventRow {
            year,
            event_type: "award".to_string(),
            description: heading.text,
            value: String::new(),
            category: "achievements".to_string(),
        })
        .collect();

    for table in selected_tables(page, "table[id*='leader']").iter().take(LEADER_TABLES) {
        let caption = table.caption.as_deref().unwrap_or("League Leaders");
        for cells in body_rows(table, LEADERS_PER_TABLE).filter(|c| c.len() >= 2) {
            events.push(EventRow {
                year,
                event_type: "league_leader".to_string(),
                description: format!("{} - {}", cells[0].text, caption),
                value: cells[1].text.clone(),
                category: "statistics".to_string(),
            });
        }
    }
    events
}

pub fn career_leaders(page: &HtmlPage) -> Vec<PlayerRow> {
    let mut players = Vec::new();
    for (i, table) in selected_tables(page, "table.stats_table").iter().take(CAREER_TABLES).enumerate() {
        let stat_type = table
            .caption
            .clone()
            .unwrap_or_else(|| format!("Leaders Table {}", i + 1))
            .to_lowercase();
        for cells in body_rows(table, CAREER_ROWS).filter(|c| c.len() >= 2) {
            players.push(PlayerRow {
                player_name: cells[1].text.clone(),
                stat_value: cells.get(2).map(|c| c.text.clone()).unwrap_or_else(|| "N/A".to_string()),
                stat_type: stat_type.clone(),
                team: "Career".to_string(),
                category: "career_leaders".to_string(),
                rank: cells[0].text.clone(),
            });
        }
    }
    players
}

fn digits(text: &str) -> Option<u32> {
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

/// Win-loss records from the team tables of one season page.
pub fn team_records(page: &HtmlPage, year: i32) -> Vec<TeamStatRow> {
    let mut stats = Vec::new();
    for table in selected_tables(page, "table[id*='team']").iter().take(TEAM_TABLES) {
        for cells in body_rows(table, TEAM_ROWS).filter(|c| c.len() >= 4) {
            let wins = digits(&cells[1].text);
            let losses = digits(&cells[2].text);
            let games_played = match (wins, losses) {
                (Some(w), Some(l)) => w + l,
                _ => FULL_SEASON_GAMES,
            };
            stats.push(TeamStatRow {
                year,
                team: cells[0].text.clone(),
                category: "team_record".to_string(),
                games_played,
                wins: wins.unwrap_or(0),
                losses: losses.unwrap_or(0),
                league: "MLB".to_string(),
            });
        }
    }
    stats
}

/// Walk the configured seasons, then the career leaders page.
pub async fn scrape(source: &dyn CellSource, config: &ScrapeConfig) -> YearlyData {
    let mut data = YearlyData::default();

    for &year in &config.years {
        let Some(page) = fetch_or_skip(source, YEARLY_SOURCE, &season_url(year)).await else {
            continue;
        };
        let events = season_events(&page, year);
        info!("📅 {} events for {}", events.len(), year);
        data.events.extend(events);

        if config.team_years.contains(&year) {
            data.statistics.extend(team_records(&page, year));
        }
    }

    // Team years outside the event years still need their season page
    for &year in config.team_years.iter().filter(|y| !config.years.contains(y)) {
        if let Some(page) = fetch_or_skip(source, YEARLY_SOURCE, &season_url(year)).await {
            data.statistics.extend(team_records(&page, year));
        }
    }

    if let Some(page) = fetch_or_skip(source, YEARLY_SOURCE, CAREER_LEADERS_URL).await {
        data.players = career_leaders(&page);
    }

    info!(
        "Yearly scrape: {} events, {} players, {} team records",
        data.events.len(),
        data.players.len(),
        data.statistics.len()
    );
    data
}
