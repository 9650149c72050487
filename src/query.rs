//! Canned read-only queries over the loaded tables and their terminal rendering.

use std::fmt::Write as _;

use crate::constants::{EVENTS_TABLE, PLAYERS_TABLE};
use crate::error::StorageError;
use crate::storage::{display_value, QueryResult, SqlValue, TableStore};

const EVENTS_BY_YEAR_SQL: &str = "
    SELECT year, event_type, description, value, category
    FROM events
    WHERE year = ?1
    ORDER BY event_type";

const PLAYERS_BY_TEAM_SQL: &str = "
    SELECT player_name, stat_value, stat_type, team, category
    FROM players
    WHERE team LIKE ?1
    ORDER BY player_name";

const EVENTS_WITH_PLAYERS_SQL: &str = "
    SELECT e.year, e.event_type, e.description AS event_description,
           p.player_name, p.stat_type, p.team
    FROM events e
    CROSS JOIN players p
    WHERE e.year >= 2020
    ORDER BY e.year, p.player_name
    LIMIT 20";

const YEARLY_SUMMARY_SQL: &str = "
    SELECT year,
           COUNT(*) AS event_count,
           GROUP_CONCAT(DISTINCT event_type) AS event_types,
           GROUP_CONCAT(DISTINCT category) AS categories
    FROM events
    GROUP BY year
    ORDER BY year DESC";

const PLAYER_STATS_SUMMARY_SQL: &str = "
    SELECT category,
           COUNT(*) AS player_count,
           GROUP_CONCAT(DISTINCT team) AS teams,
           GROUP_CONCAT(DISTINCT stat_type) AS stat_types
    FROM players
    GROUP BY category
    ORDER BY player_count DESC";

const CROSS_REFERENCE_SQL: &str = "
    SELECT e.year, e.category,
           COUNT(DISTINCT e.id) AS event_count,
           COUNT(DISTINCT p.id) AS player_count,
           GROUP_CONCAT(DISTINCT e.event_type) AS event_types
    FROM events e
    LEFT JOIN players p ON e.category = p.category
    GROUP BY e.year, e.category
    ORDER BY e.year DESC, event_count DESC";

#[derive(Debug, Clone, PartialEq)]
pub enum CannedQuery {
    EventsByYear(i64),
    /// Substring match on the team column
    PlayersByTeam(String),
    EventsWithPlayers,
    YearlySummary,
    PlayerStatsSummary,
    CrossReference,
    Custom(String),
}

impl CannedQuery {
    pub fn title(&self) -> String {
        match self {
            CannedQuery::EventsByYear(year) => format!("Events for Year {}", year),
            CannedQuery::PlayersByTeam(team) => format!("Players for Team: {}", team),
            CannedQuery::EventsWithPlayers => "Events with Players (Cross Reference)".to_string(),
            CannedQuery::YearlySummary => "Yearly Summary".to_string(),
            CannedQuery::PlayerStatsSummary => "Player Statistics Summary".to_string(),
            CannedQuery::CrossReference => "Cross-Reference: Events and Players".to_string(),
            CannedQuery::Custom(_) => "Custom Query Results".to_string(),
        }
    }

    pub fn sql(&self) -> &str {
        match self {
            CannedQuery::EventsByYear(_) => EVENTS_BY_YEAR_SQL,
            CannedQuery::PlayersByTeam(_) => PLAYERS_BY_TEAM_SQL,
            CannedQuery::EventsWithPlayers => EVENTS_WITH_PLAYERS_SQL,
            CannedQuery::YearlySummary => YEARLY_SUMMARY_SQL,
            CannedQuery::PlayerStatsSummary => PLAYER_STATS_SUMMARY_SQL,
            CannedQuery::CrossReference => CROSS_REFERENCE_SQL,
            CannedQuery::Custom(sql) => sql,
        }
    }

    pub fn params(&self) -> Vec<SqlValue> {
        match self {
            CannedQuery::EventsByYear(year) => vec![SqlValue::Integer(*year)],
            CannedQuery::PlayersByTeam(team) => vec![SqlValue::Text(format!("%{}%", team))],
            _ => Vec::new(),
        }
    }

    pub fn run<S: TableStore + ?Sized>(&self, store: &S) -> Result<QueryResult, StorageError> {
        store.query(self.sql(), &self.params())
    }
}

/// Columns and row count of one stored table
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<(String, String)>,
    pub rows: usize,
}

/// Every user table with its column types and row count, internal tables excluded.
pub fn list_tables<S: TableStore + ?Sized>(store: &S) -> Result<Vec<TableInfo>, StorageError> {
    let names = store.query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        &[],
    )?;

    let mut tables = Vec::new();
    for name in names.column_values("name").map(display_value) {
        let info = store.query(
            "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
            &[SqlValue::Text(name.clone())],
        )?;
        let columns = info
            .rows
            .iter()
            .map(|row| (display_value(&row[0]), display_value(&row[1])))
            .collect();
        let rows = store.row_count(&name)?;
        tables.push(TableInfo { name, columns, rows });
    }
    Ok(tables)
}

fn padded_line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Aligned text table with a title line and a "Total records" footer.
pub fn render_result(title: &str, result: &QueryResult) -> String {
    if result.is_empty() {
        return "No results found.\n".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(display_value).collect())
        .collect();
    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "\n=== {} ===", title);
    let _ = writeln!(out, "{}", padded_line(&result.columns, &widths));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &cells {
        let _ = writeln!(out, "{}", padded_line(row, &widths));
    }
    let _ = writeln!(out, "\nTotal records: {}", result.len());
    out
}

pub fn render_tables(tables: &[TableInfo]) -> String {
    let mut out = String::from("\n=== Available Tables ===\n");
    for table in tables {
        let _ = writeln!(out, "\nTable: {}", table.name);
        for (name, sql_type) in &table.columns {
            let _ = writeln!(out, "  - {} ({})", name, sql_type);
        }
        let _ = writeln!(out, "  Records: {}", table.rows);
    }
    out
}

/// Tables the canned joins read that do not exist yet.
pub fn missing_tables<S: TableStore + ?Sized>(store: &S) -> Vec<&'static str> {
    [EVENTS_TABLE, PLAYERS_TABLE]
        .into_iter()
        .filter(|table| store.row_count(table).is_err())
        .collect()
}
