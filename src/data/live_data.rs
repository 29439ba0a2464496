//! Score and serving-state decoding.
//!
//! Two payload shapes carry live scores:
//!
//! - live-data subscriptions, under `attributes.COMPLETE`, with each score
//!   wrapped in a `COMPETITOR` node;
//! - the `liveDataSummary` block of a snapshot event, with bare
//!   `{home, away}` pairs under `scores`.
//!
//! Both go through the same [`ScoreKey`] and pair helpers. Every field is
//! optional on its own; only a payload with nothing usable is rejected.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use super::models::{ActivePlayerServe, EventLiveDataExtended, EventStatus, Score};
use super::wire::{id_value, int_value};
use crate::protocol::errors::DecodeError;
use crate::protocol::path::extract_match_minutes;

/// Wire keys that carry the full-match score. The first one present wins.
const MATCH_SCORE_KEYS: [&str; 2] = ["CURRENT_SCORE", "MATCH_SCORE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKey {
    Set(u32),
    GamePart,
    MatchFull,
}

impl ScoreKey {
    /// `CURRENT_SCORE`/`MATCH_SCORE`, `GAME_SCORE`, `SET{n}_SCORE` or
    /// `PERIOD{n}_SCORE` with `n >= 1`.
    pub fn parse(wire: &str) -> Option<Self> {
        match wire {
            "CURRENT_SCORE" | "MATCH_SCORE" => return Some(Self::MatchFull),
            "GAME_SCORE" => return Some(Self::GamePart),
            _ => {}
        }
        let index = wire
            .strip_suffix("_SCORE")
            .and_then(|rest| rest.strip_prefix("SET").or_else(|| rest.strip_prefix("PERIOD")))?
            .parse::<u32>()
            .ok()?;
        (index >= 1).then_some(Self::Set(index))
    }

    pub fn score(self, home: Option<i64>, away: Option<i64>) -> Score {
        match self {
            Self::Set(index) => Score::Set { index, home, away },
            Self::GamePart => Score::GamePart { home, away },
            Self::MatchFull => Score::MatchFull { home, away },
        }
    }
}

/// `{home, away}`, either bare or under `COMPETITOR`. `None` when neither
/// side holds a number.
pub fn score_pair(raw: &Value) -> Option<(Option<i64>, Option<i64>)> {
    let node = raw.get("COMPETITOR").unwrap_or(raw);
    let home = node.get("home").and_then(int_value);
    let away = node.get("away").and_then(int_value);
    if home.is_none() && away.is_none() {
        return None;
    }
    Some((home, away))
}

/// Every recognised score key in `entries`, keyed by [`Score::key`].
pub fn decode_scores(entries: &Map<String, Value>) -> BTreeMap<String, Score> {
    let mut scores = BTreeMap::new();
    for (wire_key, raw) in entries {
        let Some(key) = ScoreKey::parse(wire_key) else {
            continue;
        };
        let Some((home, away)) = score_pair(raw) else {
            trace!(key = %wire_key, "Score node without values");
            continue;
        };
        let score = key.score(home, away);
        // CURRENT_SCORE outranks MATCH_SCORE whatever the map order.
        let overrides = wire_key != MATCH_SCORE_KEYS[1];
        match scores.entry(score.key()) {
            Entry::Vacant(slot) => {
                slot.insert(score);
            }
            Entry::Occupied(mut slot) if overrides => {
                slot.insert(score);
            }
            Entry::Occupied(_) => {}
        }
    }
    scores
}

fn headline_score(entries: &Map<String, Value>) -> (Option<i64>, Option<i64>) {
    MATCH_SCORE_KEYS
        .iter()
        .find_map(|key| entries.get(*key).and_then(score_pair))
        .unwrap_or((None, None))
}

fn event_attribute<'a>(complete: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    complete.get(key).and_then(|node| node.get("EVENT"))
}

/// Decode a live-data payload for one event.
///
/// The event id comes from `idfoevent`, then `id`, then `fallback_event_id`
/// (the subscription's content id).
pub fn decode_live_data(
    raw: &Value,
    fallback_event_id: &str,
) -> Result<EventLiveDataExtended, DecodeError> {
    let id = raw
        .get("idfoevent")
        .and_then(id_value)
        .or_else(|| raw.get("id").and_then(id_value))
        .unwrap_or_else(|| fallback_event_id.to_string());

    let empty = Map::new();
    let complete = raw
        .pointer("/attributes/COMPLETE")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let status = event_attribute(complete, "STATUS")
        .and_then(Value::as_str)
        .map(EventStatus::from_wire);
    let active_player_serving =
        event_attribute(complete, "SERVE").and_then(ActivePlayerServe::from_value);
    let (home_score, away_score) = headline_score(complete);
    let match_time = event_attribute(complete, "MATCH_TIME")
        .or_else(|| raw.get("matchTime"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let scores = decode_scores(complete);

    if status.is_none()
        && active_player_serving.is_none()
        && home_score.is_none()
        && away_score.is_none()
        && match_time.is_none()
        && scores.is_empty()
    {
        return Err(DecodeError::EmptyLiveData { event_id: id });
    }

    Ok(EventLiveDataExtended {
        id,
        home_score,
        away_score,
        match_time,
        status,
        scores,
        active_player_serving,
    })
}

/// Live fields carried inline by a snapshot event.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LiveSummary {
    /// Minutes label, e.g. `"45+3'"`.
    pub match_time: Option<String>,
    pub status: Option<EventStatus>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub scores: BTreeMap<String, Score>,
    pub serving: Option<ActivePlayerServe>,
}

pub fn decode_summary(raw: &Value) -> LiveSummary {
    let (home_score, away_score, scores) = match raw.get("scores").and_then(Value::as_object) {
        Some(entries) => {
            let (home, away) = headline_score(entries);
            (home, away, decode_scores(entries))
        }
        None => (None, None, BTreeMap::new()),
    };

    LiveSummary {
        match_time: raw
            .get("matchTime")
            .and_then(Value::as_str)
            .and_then(extract_match_minutes),
        status: raw
            .get("status")
            .and_then(Value::as_str)
            .map(EventStatus::from_wire),
        home_score,
        away_score,
        scores,
        serving: raw.get("serve").and_then(ActivePlayerServe::from_value),
    }
}
