//! MVP award and brothers-set aggregates with year, league and set-size filters.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use tracing::warn;

use crate::constants::{BROTHERS_SETS_TABLE, MVP_AWARDS_TABLE};
use crate::error::StorageError;
use crate::storage::{display_value, SqlValue, TableStore};

const TOP_N: usize = 15;

/// Empty lists and a missing range select everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportFilter {
    pub year_range: Option<(i64, i64)>,
    pub leagues: Vec<String>,
    pub brother_counts: Vec<i64>,
}

impl ReportFilter {
    fn keeps_award(&self, award: &MvpAward) -> bool {
        let in_years = self
            .year_range
            .map(|(from, to)| award.year >= from && award.year <= to)
            .unwrap_or(true);
        let in_leagues = self.leagues.is_empty()
            || award
                .league
                .as_deref()
                .map(|league| self.leagues.iter().any(|l| l.eq_ignore_ascii_case(league)))
                .unwrap_or(false);
        in_years && in_leagues
    }

    fn keeps_set_size(&self, brothers_count: i64) -> bool {
        self.brother_counts.is_empty() || self.brother_counts.contains(&brothers_count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MvpAward {
    pub year: i64,
    pub player_name: String,
    pub league: Option<String>,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSizeCount {
    pub brothers_count: i64,
    pub sets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub filter: ReportFilter,
    /// Year span and leagues present in the data before filtering
    pub available_years: Option<(i64, i64)>,
    pub available_leagues: Vec<String>,
    pub total_awards: usize,
    pub awards_per_year: Vec<YearCount>,
    pub top_teams: Vec<NamedCount>,
    pub top_players: Vec<NamedCount>,
    pub brothers_distribution: Vec<SetSizeCount>,
}

/// Most frequent names first; ties break alphabetically.
fn top_counts<'a>(names: impl Iterator<Item = &'a str>, limit: usize) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names.filter(|n| !n.is_empty()) {
        *counts.entry(name).or_default() += 1;
    }
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

pub fn build_report(awards: &[MvpAward], brothers_counts: &[i64], filter: &ReportFilter) -> Report {
    let available_years = awards
        .iter()
        .map(|a| a.year)
        .min()
        .zip(awards.iter().map(|a| a.year).max());
    let mut available_leagues: Vec<String> = awards.iter().filter_map(|a| a.league.clone()).collect();
    available_leagues.sort();
    available_leagues.dedup();

    let kept: Vec<&MvpAward> = awards.iter().filter(|a| filter.keeps_award(a)).collect();

    let mut per_year: BTreeMap<i64, usize> = BTreeMap::new();
    for award in &kept {
        *per_year.entry(award.year).or_default() += 1;
    }

    let mut per_size: BTreeMap<i64, usize> = BTreeMap::new();
    for &size in brothers_counts.iter().filter(|&&c| filter.keeps_set_size(c)) {
        *per_size.entry(size).or_default() += 1;
    }

    Report {
        filter: filter.clone(),
        available_years,
        available_leagues,
        total_awards: kept.len(),
        awards_per_year: per_year.into_iter().map(|(year, count)| YearCount { year, count }).collect(),
        top_teams: top_counts(kept.iter().map(|a| a.team.as_str()), TOP_N),
        top_players: top_counts(kept.iter().map(|a| a.player_name.as_str()), TOP_N),
        brothers_distribution: per_size
            .into_iter()
            .map(|(brothers_count, sets)| SetSizeCount { brothers_count, sets })
            .collect(),
    }
}

fn table_exists<S: TableStore + ?Sized>(store: &S, table: &str) -> bool {
    match store.row_count(table) {
        Ok(_) => true,
        Err(e) => {
            warn!("Table {} unavailable for the report: {}", table, e);
            false
        }
    }
}

fn as_integer(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Integer(v) => Some(*v),
        SqlValue::Text(v) => v.trim().parse().ok(),
        _ => None,
    }
}

pub fn load_awards<S: TableStore + ?Sized>(store: &S) -> Result<Vec<MvpAward>, StorageError> {
    if !table_exists(store, MVP_AWARDS_TABLE) {
        return Ok(Vec::new());
    }
    let result = store.query(
        &format!("SELECT year, player_name, league, team FROM {}", MVP_AWARDS_TABLE),
        &[],
    )?;
    let awards = result
        .rows
        .iter()
        .filter_map(|row| {
            let year = as_integer(&row[0])?;
            let league = display_value(&row[2]);
            Some(MvpAward {
                year,
                player_name: display_value(&row[1]),
                league: match row[2] {
                    SqlValue::Null => None,
                    _ if league.is_empty() => None,
                    _ => Some(league),
                },
                team: display_value(&row[3]),
            })
        })
        .collect();
    Ok(awards)
}

pub fn load_brothers_counts<S: TableStore + ?Sized>(store: &S) -> Result<Vec<i64>, StorageError> {
    if !table_exists(store, BROTHERS_SETS_TABLE) {
        return Ok(Vec::new());
    }
    let result = store.query(&format!("SELECT brothers_count FROM {}", BROTHERS_SETS_TABLE), &[])?;
    Ok(result.rows.iter().filter_map(|row| as_integer(&row[0])).collect())
}

pub fn load_report<S: TableStore + ?Sized>(store: &S, filter: &ReportFilter) -> Result<Report, StorageError> {
    let awards = load_awards(store)?;
    let brothers = load_brothers_counts(store)?;
    Ok(build_report(&awards, &brothers, filter))
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🏆 Baseball MVP Awards Report");
    let _ = writeln!(out, "{}", "=".repeat(40));
    if let Some((from, to)) = report.available_years {
        let _ = writeln!(out, "Data covers {}-{}", from, to);
    }
    if !report.available_leagues.is_empty() {
        let _ = writeln!(out, "Leagues: {}", report.available_leagues.join(", "));
    }
    let _ = writeln!(out, "Awards matching filter: {}", report.total_awards);

    let _ = writeln!(out, "\nMVP Awards per Year:");
    for entry in &report.awards_per_year {
        let _ = writeln!(out, "  {}: {}", entry.year, entry.count);
    }

    let _ = writeln!(out, "\nTop {} Teams by MVP Awards:", TOP_N);
    for (i, entry) in report.top_teams.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {} ({})", i + 1, entry.name, entry.count);
    }

    let _ = writeln!(out, "\nTop {} MVP Award Winners:", TOP_N);
    for (i, entry) in report.top_players.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {} ({})", i + 1, entry.name, entry.count);
    }

    let _ = writeln!(out, "\nBrothers Sets by Size:");
    for entry in &report.brothers_distribution {
        let _ = writeln!(out, "  {} brothers: {} sets", entry.brothers_count, entry.sets);
    }
    out
}

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
