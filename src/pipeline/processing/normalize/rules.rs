//! Field cleaning rules
//!
//! Every rule is a pure function from one raw value to one clean value. None of
//! them fail: text that cannot be interpreted maps to a default, and the quality
//! gate decides later whether the result is acceptable.

use once_cell::sync::Lazy;
use regex::Regex;

static LEAGUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[AN]\.?L\.?").expect("league pattern is valid"));

static TEAM_SEASONS_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\(\d+\)\s*$").expect("team suffix pattern is valid"));

/// Parse a year, substituting `fallback` for anything that is not an integer.
pub fn clean_year(raw: Option<&str>, fallback: i64) -> i64 {
    raw.and_then(parse_integer).unwrap_or(fallback)
}

/// Reduce league text to `"AL"`, `"NL"`, or empty when there is no match.
///
/// `"A.L."`, `"al"` and `"AL Central"` all give `"AL"`; `"Pacific"` gives `""`.
pub fn clean_league(raw: Option<&str>) -> String {
    raw.and_then(|text| LEAGUE_RE.find(text))
        .map(|m| m.as_str().replace('.', "").to_ascii_uppercase())
        .unwrap_or_default()
}

/// Drop a trailing season count such as `" (3)"` and trim.
pub fn clean_team_name(raw: Option<&str>) -> String {
    raw.map(|text| TEAM_SEASONS_SUFFIX_RE.replace(text, "").trim().to_string())
        .unwrap_or_default()
}

/// Names keep their case; only surrounding whitespace goes.
pub fn clean_person_name(raw: Option<&str>) -> String {
    raw.map(|text| text.trim().to_string()).unwrap_or_default()
}

/// Split a delimited list, trimming each element but keeping empty ones in place.
pub fn split_list(raw: Option<&str>, delimiter: char) -> Vec<String> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.split(delimiter).map(|s| s.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Canonical form of a delimited list: trimmed elements re-joined.
pub fn clean_list(raw: Option<&str>, delimiter: char) -> String {
    split_list(raw, delimiter).join(&delimiter.to_string())
}

/// Number of elements in a delimited list, empty elements included.
pub fn list_count(raw: Option<&str>, delimiter: char) -> i64 {
    split_list(raw, delimiter).len() as i64
}

/// Parse a counting stat; anything unparsable is 0.
pub fn clean_count(raw: Option<&str>) -> i64 {
    raw.and_then(parse_integer).unwrap_or(0)
}

/// Trimmed text, or `default` when missing or blank.
pub fn clean_free_text(raw: Option<&str>, default: &str) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default.to_string(),
    }
}

/// Integers as written, plus integral floats (`"81.0"`) as spreadsheet exports write them.
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_variants() {
        assert_eq!(clean_league(Some("A.L.")), "AL");
        assert_eq!(clean_league(Some("AL")), "AL");
        assert_eq!(clean_league(Some("a.l.")), "AL");
        assert_eq!(clean_league(Some("N.L")), "NL");
        assert_eq!(clean_league(Some("NL West")), "NL");
        assert_eq!(clean_league(Some("Pacific")), "");
        assert_eq!(clean_league(Some("")), "");
        assert_eq!(clean_league(None), "");
    }

    #[test]
    fn test_league_is_idempotent() {
        for text in ["A.L.", "nl", "NL West", "Pacific"] {
            let once = clean_league(Some(text));
            assert_eq!(clean_league(Some(&once)), once);
        }
    }

    #[test]
    fn test_team_name_suffix() {
        assert_eq!(clean_team_name(Some("Dodgers (3)")), "Dodgers");
        assert_eq!(clean_team_name(Some("  Red Sox  ")), "Red Sox");
        assert_eq!(clean_team_name(Some("Dodgers (LA)")), "Dodgers (LA)");
        assert_eq!(clean_team_name(Some("Browns (12) ")), "Browns");
        assert_eq!(clean_team_name(Some("Dodgers(3)")), "Dodgers(3)");
        assert_eq!(clean_team_name(None), "");
    }

    #[test]
    fn test_person_name_keeps_case() {
        assert_eq!(clean_person_name(Some("  Ken Griffey Jr. ")), "Ken Griffey Jr.");
        assert_eq!(clean_person_name(Some("dOM diMaggio")), "dOM diMaggio");
    }

    #[test]
    fn test_list_keeps_empty_elements() {
        assert_eq!(list_count(Some("Hank Aaron;Tommie Aaron"), ';'), 2);
        assert_eq!(list_count(Some("A;;C"), ';'), 3);
        assert_eq!(list_count(Some("A;"), ';'), 2);
        assert_eq!(list_count(Some("   "), ';'), 0);
        assert_eq!(list_count(None, ';'), 0);
        assert_eq!(clean_list(Some(" Joe ; Dom ;Vince"), ';'), "Joe;Dom;Vince");
        assert_eq!(clean_list(Some("A;;C"), ';'), "A;;C");
    }

    #[test]
    fn test_numeric_fields_default_to_zero() {
        assert_eq!(clean_count(Some("162")), 162);
        assert_eq!(clean_count(Some(" 81 ")), 81);
        assert_eq!(clean_count(Some("81.0")), 81);
        assert_eq!(clean_count(Some("81.5")), 0);
        assert_eq!(clean_count(Some("n/a")), 0);
        assert_eq!(clean_count(None), 0);
    }

    #[test]
    fn test_year_fallback() {
        assert_eq!(clean_year(Some("1961"), 2023), 1961);
        assert_eq!(clean_year(Some("not_a_number"), 2023), 2023);
        assert_eq!(clean_year(None, 2023), 2023);
        // Out-of-range years pass through untouched for the gate to judge
        assert_eq!(clean_year(Some("1850"), 2023), 1850);
    }

    #[test]
    fn test_free_text_sentinel() {
        assert_eq!(clean_free_text(None, "unknown"), "unknown");
        assert_eq!(clean_free_text(Some("  "), "general"), "general");
        assert_eq!(clean_free_text(Some(" playoffs "), "general"), "playoffs");
    }
}
