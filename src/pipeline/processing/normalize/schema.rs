//! Destination table schemas
//!
//! One static description per table: its columns in order, the cleaning rule
//! for each, whether a column must be non-empty, and its accepted range.

use crate::constants::{
    AWARDS_LIST_TABLE, BROTHERS_SETS_TABLE, EVENTS_TABLE, MAX_GAMES_PLAYED, MAX_YEAR, MIN_YEAR,
    MVP_AWARDS_TABLE, PLAYERS_TABLE, STATISTICS_TABLE,
};

/// How a raw value becomes a clean one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningRule {
    Year,
    League,
    TeamName,
    PersonName,
    DelimitedList,
    /// Element count of the delimited list held in another raw field
    ListCount { source: &'static str },
    Count,
    FreeText,
}

impl CleaningRule {
    /// Rules run in this order over a record's fields.
    pub fn precedence(&self) -> u8 {
        match self {
            CleaningRule::Year => 0,
            CleaningRule::League => 1,
            CleaningRule::TeamName => 2,
            CleaningRule::PersonName => 3,
            CleaningRule::DelimitedList | CleaningRule::ListCount { .. } => 4,
            CleaningRule::Count => 5,
            CleaningRule::FreeText => 6,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            CleaningRule::Year | CleaningRule::Count | CleaningRule::ListCount { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub rule: CleaningRule,
    /// Text fields: reject the record when the cleaned value is empty
    pub required: bool,
    /// Text fields: value used when the raw one is missing or blank
    pub default: &'static str,
    /// Integer fields: inclusive bounds
    pub range: Option<(i64, i64)>,
}

impl FieldDef {
    const fn text(name: &'static str, rule: CleaningRule, default: &'static str) -> Self {
        Self { name, rule, required: false, default, range: None }
    }

    const fn required(name: &'static str, rule: CleaningRule) -> Self {
        Self { name, rule, required: true, default: "", range: None }
    }

    const fn integer(name: &'static str, rule: CleaningRule, min: i64, max: i64) -> Self {
        Self { name, rule, required: false, default: "", range: Some((min, max)) }
    }

    pub fn sql_type(&self) -> &'static str {
        if self.rule.is_integer() {
            "INTEGER"
        } else {
            "TEXT"
        }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub indexes: &'static [&'static str],
    /// A failed load of this table fails the import run
    pub required_for_import: bool,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

use CleaningRule::*;

pub static EVENTS: Schema = Schema {
    table: EVENTS_TABLE,
    fields: &[
        FieldDef::integer("year", Year, MIN_YEAR, MAX_YEAR),
        FieldDef::text("event_type", FreeText, "unknown"),
        FieldDef::text("description", FreeText, ""),
        FieldDef::text("value", FreeText, ""),
        FieldDef::text("category", FreeText, "general"),
    ],
    indexes: &["year", "category", "event_type"],
    required_for_import: true,
};

pub static PLAYERS: Schema = Schema {
    table: PLAYERS_TABLE,
    fields: &[
        FieldDef::required("player_name", PersonName),
        FieldDef::text("stat_value", FreeText, "0"),
        FieldDef::text("stat_type", FreeText, "unknown"),
        FieldDef::text("team", TeamName, "Unknown Team"),
        FieldDef::text("category", FreeText, "general"),
        FieldDef::text("rank", FreeText, "0"),
    ],
    indexes: &["player_name", "team", "category"],
    required_for_import: true,
};

pub static STATISTICS: Schema = Schema {
    table: STATISTICS_TABLE,
    fields: &[
        FieldDef::integer("year", Year, MIN_YEAR, MAX_YEAR),
        FieldDef::text("team", TeamName, "Unknown Team"),
        FieldDef::text("category", FreeText, "general"),
        FieldDef::integer("games_played", Count, 0, MAX_GAMES_PLAYED),
        FieldDef::integer("wins", Count, 0, i64::MAX),
        FieldDef::integer("losses", Count, 0, i64::MAX),
        FieldDef::text("league", FreeText, "MLB"),
    ],
    indexes: &["year", "team", "category"],
    required_for_import: true,
};

pub static MVP_AWARDS: Schema = Schema {
    table: MVP_AWARDS_TABLE,
    fields: &[
        FieldDef::integer("year", Year, MIN_YEAR, MAX_YEAR),
        FieldDef::required("player_name", PersonName),
        FieldDef::text("league", League, ""),
        FieldDef::text("team", TeamName, ""),
        FieldDef::text("position", FreeText, ""),
        FieldDef::text("source_url", FreeText, ""),
        FieldDef::text("extraction_date", FreeText, ""),
    ],
    indexes: &["year", "league", "team"],
    required_for_import: false,
};

pub static BROTHERS_SETS: Schema = Schema {
    table: BROTHERS_SETS_TABLE,
    fields: &[
        FieldDef::integer("set_number", Count, 1, i64::MAX),
        FieldDef::integer("brothers_count", ListCount { source: "brothers_names" }, 1, i64::MAX),
        FieldDef::required("brothers_names", DelimitedList),
    ],
    indexes: &["brothers_count"],
    required_for_import: false,
};

pub static AWARDS_LIST: Schema = Schema {
    table: AWARDS_LIST_TABLE,
    fields: &[
        FieldDef::required("award", PersonName),
        FieldDef::text("years", FreeText, ""),
        FieldDef::text("link", FreeText, ""),
        FieldDef::text("source_url", FreeText, ""),
        FieldDef::text("extraction_date", FreeText, ""),
    ],
    indexes: &["award"],
    required_for_import: false,
};

/// Every schema, in import order.
pub fn all() -> [&'static Schema; 6] {
    [&EVENTS, &PLAYERS, &STATISTICS, &MVP_AWARDS, &BROTHERS_SETS, &AWARDS_LIST]
}

pub fn by_table(table: &str) -> Option<&'static Schema> {
    all().into_iter().find(|s| s.table == table)
}
