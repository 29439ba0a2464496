//! Path pattern matching for delta frames.
//!
//! Delta paths look like
//! `events[idfoevent=123.0].markets[idfomarket=456].istradable`. Identifiers
//! are pulled out with literal regexes; classification itself relies on
//! substring containment, so nothing here tries to parse the path as a tree.

use std::sync::LazyLock;

use regex::Regex;

pub const EVENT_TOKEN: &str = "idfoevent";
pub const MARKET_TOKEN: &str = "idfomarket";
pub const SELECTION_TOKEN: &str = "idfoselection";
pub const SPORT_TYPE_TOKEN: &str = "idfosporttype";

static EVENT_ID: LazyLock<Regex> = LazyLock::new(|| id_pattern(EVENT_TOKEN));
static MARKET_ID: LazyLock<Regex> = LazyLock::new(|| id_pattern(MARKET_TOKEN));
static SELECTION_ID: LazyLock<Regex> = LazyLock::new(|| id_pattern(SELECTION_TOKEN));
static SPORT_TYPE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[idfosporttype=([A-Za-z0-9_]+)\]").expect("valid regex"));

// "12:34" or "45:00 +3:20"
static MATCH_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+):\d{1,2}(?:\s*\+\s*(\d+):\d{1,2})?").expect("valid regex")
});

fn id_pattern(key: &str) -> Regex {
    Regex::new(&format!(r"\[{key}=(\d+(?:\.\d+)?)\]")).expect("valid regex")
}

fn first_capture(regex: &Regex, path: &str) -> Option<String> {
    regex
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_id(m.as_str()))
}

pub fn extract_event_id(path: &str) -> Option<String> {
    first_capture(&EVENT_ID, path)
}

pub fn extract_market_id(path: &str) -> Option<String> {
    first_capture(&MARKET_ID, path)
}

pub fn extract_selection_id(path: &str) -> Option<String> {
    first_capture(&SELECTION_ID, path)
}

pub fn extract_sport_type_id(path: &str) -> Option<String> {
    SPORT_TYPE_ID
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drop an all-zero fractional part: `"123.0"` -> `"123"`.
///
/// Ids such as `"2794662.1"` are left untouched; the fraction is part of
/// the identifier there.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once('.') {
        Some((int, frac)) if !int.is_empty() && !frac.is_empty() && frac.bytes().all(|b| b == b'0') => {
            int.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Reduce a match clock to a minutes label.
///
/// `"12:34"` -> `"12'"`, `"45:00 +3:20"` -> `"45+3'"`.
pub fn extract_match_minutes(clock: &str) -> Option<String> {
    let caps = MATCH_CLOCK.captures(clock)?;
    let minutes = caps.get(1)?.as_str();
    match caps.get(2) {
        Some(extra) => Some(format!("{}+{}'", minutes, extra.as_str())),
        None => Some(format!("{}'", minutes)),
    }
}
