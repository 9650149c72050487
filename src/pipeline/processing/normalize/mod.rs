//! Normalization: raw records into schema-typed clean records.
//!
//! A single interpreter walks a [`Schema`] and applies each field's cleaning
//! rule; there is no per-table cleaning code.

pub mod rules;
pub mod schema;

use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

use crate::constants::LIST_DELIMITER;
use crate::types::RawRecord;
use schema::{CleaningRule, FieldDef, Schema};

/// A typed column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            FieldValue::Integer(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

/// A cleaned record, values in schema column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CleanRecord {
    values: Vec<(&'static str, FieldValue)>,
}

impl CleanRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_integer)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter().map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.values
    }
}

/// Applies a schema's cleaning rules to raw records.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    fallback_year: i64,
    delimiter: char,
}

impl SchemaNormalizer {
    pub fn new(fallback_year: i64) -> Self {
        Self {
            fallback_year,
            delimiter: LIST_DELIMITER,
        }
    }

    /// Clean one record. Never fails; rejection is the quality gate's job.
    pub fn normalize(&self, schema: &Schema, raw: &RawRecord) -> CleanRecord {
        let mut order: Vec<usize> = (0..schema.fields.len()).collect();
        order.sort_by_key(|&i| schema.fields[i].rule.precedence());

        let mut slots: Vec<Option<FieldValue>> = vec![None; schema.fields.len()];
        for i in order {
            let field = &schema.fields[i];
            slots[i] = Some(self.clean_field(field, raw));
        }

        let values = schema
            .fields
            .iter()
            .zip(slots)
            .map(|(field, value)| (field.name, value.unwrap_or_else(|| FieldValue::Text(String::new()))))
            .collect();
        CleanRecord { values }
    }

    #[instrument(level = "debug", skip(self, raws), fields(table = schema.table, count = raws.len()))]
    pub fn normalize_all(&self, schema: &Schema, raws: &[RawRecord]) -> Vec<CleanRecord> {
        let records: Vec<CleanRecord> = raws.iter().map(|raw| self.normalize(schema, raw)).collect();
        debug!("Normalized {} {} records", records.len(), schema.table);
        records
    }

    fn clean_field(&self, field: &FieldDef, raw: &RawRecord) -> FieldValue {
        let value = raw.get(field.name);
        match field.rule {
            CleaningRule::Year => FieldValue::Integer(rules::clean_year(value, self.fallback_year)),
            CleaningRule::Count => FieldValue::Integer(rules::clean_count(value)),
            CleaningRule::ListCount { source } => {
                FieldValue::Integer(rules::list_count(raw.get(source), self.delimiter))
            }
            CleaningRule::League => FieldValue::Text(or_default(rules::clean_league(value), field)),
            CleaningRule::TeamName => FieldValue::Text(or_default(rules::clean_team_name(value), field)),
            CleaningRule::PersonName => FieldValue::Text(or_default(rules::clean_person_name(value), field)),
            CleaningRule::DelimitedList => FieldValue::Text(rules::clean_list(value, self.delimiter)),
            CleaningRule::FreeText => FieldValue::Text(rules::clean_free_text(value, field.default)),
        }
    }
}

fn or_default(cleaned: String, field: &FieldDef) -> String {
    if cleaned.is_empty() {
        field.default.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{BROTHERS_SETS, EVENTS, MVP_AWARDS, PLAYERS, STATISTICS};

    fn normalizer() -> SchemaNormalizer {
        SchemaNormalizer::new(2023)
    }

    #[test]
    fn test_events_unparsable_year_uses_fallback() {
        let raw = RawRecord::new()
            .with("year", "not_a_number")
            .with("event_type", "world_series")
            .with("description", "World Series 2020");

        let record = normalizer().normalize(&EVENTS, &raw);

        assert_eq!(record.integer("year"), Some(2023));
        assert_eq!(record.text("event_type"), Some("world_series"));
        assert_eq!(record.text("value"), Some(""));
        assert_eq!(record.text("category"), Some("general"));
    }

    #[test]
    fn test_values_follow_schema_order() {
        let raw = RawRecord::new().with("category", "season").with("year", "2021");

        let record = normalizer().normalize(&EVENTS, &raw);
        let names: Vec<&str> = record.fields().iter().map(|(n, _)| *n).collect();

        assert_eq!(names, EVENTS.column_names());
    }

    #[test]
    fn test_mvp_award_row() {
        let raw = RawRecord::new()
            .with("year", "1957")
            .with("player_name", " Hank Aaron ")
            .with("league", "N.L.")
            .with("team", "Milwaukee Braves (2)")
            .with("position", "RF");

        let record = normalizer().normalize(&MVP_AWARDS, &raw);

        assert_eq!(record.integer("year"), Some(1957));
        assert_eq!(record.text("player_name"), Some("Hank Aaron"));
        assert_eq!(record.text("league"), Some("NL"));
        assert_eq!(record.text("team"), Some("Milwaukee Braves"));
        assert_eq!(record.text("source_url"), Some(""));
    }

    #[test]
    fn test_statistics_numeric_defaults() {
        let raw = RawRecord::new()
            .with("year", "2024")
            .with("team", "Dodgers (3)")
            .with("wins", "98")
            .with("losses", "");

        let record = normalizer().normalize(&STATISTICS, &raw);

        assert_eq!(record.integer("games_played"), Some(0));
        assert_eq!(record.integer("wins"), Some(98));
        assert_eq!(record.integer("losses"), Some(0));
        assert_eq!(record.text("team"), Some("Dodgers"));
        assert_eq!(record.text("league"), Some("MLB"));
    }

    #[test]
    fn test_players_missing_team_gets_sentinel() {
        let raw = RawRecord::new().with("player_name", "Cy Young").with("stat_value", "511");

        let record = normalizer().normalize(&PLAYERS, &raw);

        assert_eq!(record.text("team"), Some("Unknown Team"));
        assert_eq!(record.text("stat_type"), Some("unknown"));
        assert_eq!(record.text("rank"), Some("0"));
    }

    #[test]
    fn test_brothers_count_is_derived() {
        let raw = RawRecord::new()
            .with("set_number", "2")
            .with("brothers_names", "Joe DiMaggio;Dom DiMaggio;Vince DiMaggio");

        let record = normalizer().normalize(&BROTHERS_SETS, &raw);

        assert_eq!(record.integer("set_number"), Some(2));
        assert_eq!(record.integer("brothers_count"), Some(3));
        assert_eq!(
            record.text("brothers_names"),
            Some("Joe DiMaggio;Dom DiMaggio;Vince DiMaggio")
        );
    }

    #[test]
    fn test_normalization_is_idempotent_on_text() {
        let raw = RawRecord::new()
            .with("year", "1957")
            .with("player_name", "Hank Aaron")
            .with("league", "NL")
            .with("team", "Milwaukee Braves");
        let once = normalizer().normalize(&MVP_AWARDS, &raw);

        let mut again = RawRecord::new();
        for (name, value) in once.fields() {
            again.insert(name, Some(value.to_string()));
        }

        assert_eq!(normalizer().normalize(&MVP_AWARDS, &again), once);
    }
}
