/// Destination table names. Each one doubles as the stem of its raw CSV file.
pub const EVENTS_TABLE: &str = "events";
pub const PLAYERS_TABLE: &str = "players";
pub const STATISTICS_TABLE: &str = "statistics";
pub const MVP_AWARDS_TABLE: &str = "mvp_awards";
pub const BROTHERS_SETS_TABLE: &str = "baseball_brothers_sets";
pub const AWARDS_LIST_TABLE: &str = "me_awards_list";

// Validation bounds shared by every schema with a year column
pub const MIN_YEAR: i64 = 1900;
pub const MAX_YEAR: i64 = 2025;
pub const MAX_GAMES_PLAYED: i64 = 200;

/// Separator used when a single column carries several names.
pub const LIST_DELIMITER: char = ';';

// Source pages
pub const BROTHERS_URL: &str = "https://www.baseball-almanac.com/family/brothers.shtml";
pub const MVP_AWARDS_URL: &str = "https://www.baseball-almanac.com/awards/aw_mvpa.shtml";
pub const AWARDS_LIST_URL: &str = "https://www.baseball-almanac.com/me_award.shtml";
pub const CAREER_LEADERS_URL: &str = "https://www.baseball-reference.com/leaders/";

pub fn season_url(year: i32) -> String {
    format!("https://www.baseball-reference.com/years/{}.shtml", year)
}

// Brothers page cell classes: a numbered index column opens each set
pub const BROTHERS_CELL_SELECTOR: &str = "table.boxed td";
pub const BROTHERS_INDEX_CLASS: &str = "datacolBlue";
pub const BROTHERS_NAME_CLASS: &str = "datacolBox";

// User-friendly source names (used in CLI)
pub const BROTHERS_SOURCE: &str = "brothers";
pub const MVP_AWARDS_SOURCE: &str = "mvp_awards";
pub const AWARDS_LIST_SOURCE: &str = "awards_list";
pub const YEARLY_SOURCE: &str = "yearly";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![BROTHERS_SOURCE, MVP_AWARDS_SOURCE, AWARDS_LIST_SOURCE, YEARLY_SOURCE]
}
