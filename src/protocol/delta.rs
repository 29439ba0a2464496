//! Delta classification.
//!
//! A delta frame carries no schema; its shape is inferred from substrings of
//! the path plus the change type. Rules are tried top to bottom and the first
//! one that emits a container wins, so more specific shapes sit above the
//! general ones they overlap with.
//!
//! A rule's `decode` can:
//! - emit (`Ok(Some(_))`),
//! - pass (`Ok(None)`), letting later rules look at the frame,
//! - fail (`Err`), when the path matched but the payload is unusable.
//!
//! Paths that no rule claims become [`ContentContainer::Unknown`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::container::ContentContainer;
use super::content::{ContentIdentifier, ContentType};
use super::errors::DecodeError;
use super::path::{
    extract_event_id, extract_market_id, extract_match_minutes, extract_selection_id,
    extract_sport_type_id, EVENT_TOKEN, MARKET_TOKEN, SELECTION_TOKEN, SPORT_TYPE_TOKEN,
};
use crate::data::live_data::{decode_live_data, score_pair};
use crate::data::models::{Event, EventLiveDataExtended, Market, SportTypeDetails};
use crate::data::wire::{id_value, int_value};

const PRICE_UP: &str = "currentpriceup";
const PRICE_DOWN: &str = "currentpricedown";
const SUSPENSION_TYPE: &str = "idfoselectionsuspensiontype";
/// Suspension type of a selection that is not offered.
const NOT_OFFERED: &str = "N/O";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Removed,
    Updated,
    Other,
}

impl ChangeType {
    /// Case-insensitive; the tag only has to contain the keyword.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("added") {
            Self::Added
        } else if lower.contains("removed") {
            Self::Removed
        } else if lower.contains("updated") {
            Self::Updated
        } else {
            Self::Other
        }
    }
}

/// One delta frame, borrowed from the raw JSON.
#[derive(Debug, Clone, Copy)]
pub struct DeltaFrame<'a> {
    pub content_id: &'a ContentIdentifier,
    pub path: &'a str,
    pub change_type: ChangeType,
    pub change: Option<&'a Value>,
}

impl<'a> DeltaFrame<'a> {
    fn has(&self, token: &str) -> bool {
        self.path.contains(token)
    }

    fn is(&self, change_type: ChangeType) -> bool {
        self.change_type == change_type
    }

    fn subscribed_to(&self, content_type: ContentType) -> bool {
        self.content_id.content_type == content_type
    }

    fn change(&self) -> Result<&'a Value, DecodeError> {
        self.change
            .filter(|v| !v.is_null())
            .ok_or(DecodeError::MissingField("change"))
    }

    fn decode_change<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(T::deserialize(self.change()?)?)
    }

    fn event_id(&self) -> Option<String> {
        extract_event_id(self.path)
    }

    fn market_id(&self) -> Option<String> {
        extract_market_id(self.path)
    }

    fn identifier(&self) -> ContentIdentifier {
        self.content_id.clone()
    }
}

type Decoded = Result<Option<ContentContainer>, DecodeError>;

pub struct DeltaRule {
    pub name: &'static str,
    pub matches: fn(&DeltaFrame<'_>) -> bool,
    pub decode: fn(&DeltaFrame<'_>) -> Decoded,
}

/// Classification rules in precedence order.
pub static RULES: &[DeltaRule] = &[
    DeltaRule {
        name: "live_data_update",
        matches: |f| f.subscribed_to(ContentType::EventDetailsLiveData) && f.is(ChangeType::Updated),
        decode: live_data_update,
    },
    DeltaRule {
        name: "add_market",
        matches: |f| f.has(MARKET_TOKEN) && f.is(ChangeType::Added),
        decode: add_market,
    },
    DeltaRule {
        name: "market_subscription_removed",
        matches: |f| f.subscribed_to(ContentType::Market) && f.is(ChangeType::Removed),
        decode: market_subscription_removed,
    },
    DeltaRule {
        name: "remove_selection",
        matches: |f| {
            f.has(SELECTION_TOKEN)
                && f.is(ChangeType::Removed)
                && extract_selection_id(f.path).is_some()
        },
        decode: remove_selection,
    },
    DeltaRule {
        name: "remove_market",
        matches: |f| f.has(MARKET_TOKEN) && f.is(ChangeType::Removed) && f.market_id().is_some(),
        decode: remove_market,
    },
    DeltaRule {
        name: "market_tradability",
        matches: |f| {
            f.has(MARKET_TOKEN)
                && f.has("istradable")
                && f.is(ChangeType::Updated)
                && f.market_id().is_some()
        },
        decode: market_tradability,
    },
    DeltaRule {
        name: "selection_update",
        matches: |f| f.has(SELECTION_TOKEN) && f.is(ChangeType::Updated),
        decode: selection_update,
    },
    DeltaRule {
        name: "market_count",
        matches: |f| {
            f.has(EVENT_TOKEN)
                && f.has("numMarkets")
                && f.is(ChangeType::Updated)
                && f.event_id().is_some()
        },
        decode: market_count,
    },
    DeltaRule {
        name: "competitor_score",
        matches: |f| f.has("attributes") && f.has("COMPLETE") && f.has("CURRENT_SCORE"),
        decode: competitor_score,
    },
    DeltaRule {
        name: "summary_score",
        matches: |f| {
            f.has("scores")
                && f.has("liveDataSummary")
                && (f.has("MATCH_SCORE") || f.has("CURRENT_SCORE"))
                && f.event_id().is_some()
        },
        decode: summary_score,
    },
    DeltaRule {
        name: "match_time",
        matches: |f| {
            f.has("matchTime")
                && f.has("liveDataSummary")
                && f.is(ChangeType::Updated)
                && f.event_id().is_some()
        },
        decode: match_time,
    },
    DeltaRule {
        name: "event_state",
        matches: |f| f.has("status") && f.has("liveDataSummary") && f.event_id().is_some(),
        decode: event_state,
    },
    DeltaRule {
        name: "selection_odd_fallback",
        matches: |f| f.has("selections") && f.has(SELECTION_TOKEN),
        decode: selection_odd_fallback,
    },
    DeltaRule {
        name: "market_presence",
        matches: |f| f.has("istradable") && f.is(ChangeType::Updated),
        decode: market_presence,
    },
    DeltaRule {
        name: "add_event",
        matches: |f| f.has(EVENT_TOKEN) && f.is(ChangeType::Added),
        decode: add_event,
    },
    DeltaRule {
        name: "remove_event",
        matches: |f| f.has(EVENT_TOKEN) && f.is(ChangeType::Removed) && f.event_id().is_some(),
        decode: remove_event,
    },
    DeltaRule {
        name: "add_sport",
        matches: |f| f.has(SPORT_TYPE_TOKEN) && f.is(ChangeType::Added),
        decode: add_sport,
    },
];

/// Classify a delta frame. Never fails for a path no rule claims.
pub fn classify(
    content_id: &ContentIdentifier,
    path: &str,
    change_type: ChangeType,
    change: Option<&Value>,
) -> Result<ContentContainer, DecodeError> {
    let frame = DeltaFrame {
        content_id,
        path,
        change_type,
        change,
    };

    for rule in RULES.iter().filter(|rule| (rule.matches)(&frame)) {
        match (rule.decode)(&frame) {
            Ok(Some(container)) => return Ok(container),
            Ok(None) => {
                debug!(rule = rule.name, path = %path, "Rule passed on frame");
            }
            Err(e) => return Err(e.in_rule(rule.name, &content_id.content_id, path)),
        }
    }

    debug!(
        content = %content_id,
        path = %path,
        change_type = ?change_type,
        "Ignored content update"
    );
    Ok(ContentContainer::Unknown)
}

// =============================================================================
// Rule decoders
// =============================================================================

/// Whole live-data objects, or a bare match clock, pushed on a live-data
/// subscription. Anything else passes to the path rules.
fn live_data_update(f: &DeltaFrame<'_>) -> Decoded {
    let Some(change) = f.change.filter(|c| !c.is_null()) else {
        return Ok(None);
    };
    let event_id = &f.content_id.content_id;

    let live_data = match decode_live_data(change, event_id) {
        Ok(live_data) if change.is_object() => live_data,
        _ => {
            let Some(clock) = change
                .as_str()
                .filter(|_| f.path.to_ascii_lowercase().contains("matchtime"))
            else {
                return Ok(None);
            };
            EventLiveDataExtended {
                id: event_id.clone(),
                home_score: None,
                away_score: None,
                match_time: Some(clock.to_string()),
                status: None,
                scores: Default::default(),
                active_player_serving: None,
            }
        }
    };

    Ok(Some(ContentContainer::UpdateEventLiveDataExtended {
        content_identifier: f.identifier(),
        event_id: event_id.clone(),
        live_data,
    }))
}

fn add_market(f: &DeltaFrame<'_>) -> Decoded {
    Ok(Some(ContentContainer::AddMarket {
        content_identifier: f.identifier(),
        market: f.decode_change::<Market>()?,
    }))
}

/// A market subscription names its market; the path is irrelevant.
fn market_subscription_removed(f: &DeltaFrame<'_>) -> Decoded {
    Ok(f.content_id.market_id().map(|market_id| ContentContainer::RemoveMarket {
        content_identifier: f.identifier(),
        market_id: market_id.to_string(),
    }))
}

fn remove_selection(f: &DeltaFrame<'_>) -> Decoded {
    Ok(extract_selection_id(f.path).map(|selection_id| ContentContainer::RemoveSelection {
        content_identifier: f.identifier(),
        selection_id,
    }))
}

fn remove_market(f: &DeltaFrame<'_>) -> Decoded {
    Ok(f.market_id().map(|market_id| ContentContainer::RemoveMarket {
        content_identifier: f.identifier(),
        market_id,
    }))
}

fn market_tradability(f: &DeltaFrame<'_>) -> Decoded {
    let Some(market_id) = f.market_id() else {
        return Ok(None);
    };
    let is_tradable = f
        .change()?
        .as_bool()
        .ok_or_else(|| DecodeError::invalid("change", "expected a boolean"))?;
    Ok(Some(ContentContainer::UpdateMarketTradability {
        content_identifier: f.identifier(),
        market_id,
        is_tradable,
    }))
}

/// Price fields arrive as strings, sometimes as bare numbers.
fn price(change: &Value, key: &str) -> Option<String> {
    match change.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn selection_update(f: &DeltaFrame<'_>) -> Decoded {
    let change = f.change()?;
    if !change.is_object() {
        return Err(DecodeError::invalid("change", "expected an object"));
    }
    let numerator = price(change, PRICE_UP);
    let denominator = price(change, PRICE_DOWN);

    if numerator.is_none() && denominator.is_none() {
        let Some(suspension) = change.get(SUSPENSION_TYPE) else {
            return Ok(Some(ContentContainer::Unknown));
        };
        let selection_id = change
            .get(SELECTION_TOKEN)
            .and_then(id_value)
            .or_else(|| extract_selection_id(f.path))
            .ok_or(DecodeError::MissingField(SELECTION_TOKEN))?;
        return Ok(Some(ContentContainer::UpdateOutcomeTradability {
            content_identifier: f.identifier(),
            selection_id,
            is_tradable: suspension.as_str() != Some(NOT_OFFERED),
        }));
    }

    let selection_id = change
        .get(SELECTION_TOKEN)
        .and_then(id_value)
        .ok_or(DecodeError::MissingField(SELECTION_TOKEN))?;
    Ok(Some(ContentContainer::UpdateOutcomeOdd {
        content_identifier: f.identifier(),
        selection_id,
        new_odd_numerator: numerator,
        new_odd_denominator: denominator,
    }))
}

fn market_count(f: &DeltaFrame<'_>) -> Decoded {
    let Some(event_id) = f.event_id() else {
        return Ok(None);
    };
    let new_market_count = int_value(f.change()?)
        .ok_or_else(|| DecodeError::invalid("change", "expected an integer"))?;
    Ok(Some(ContentContainer::UpdateEventMarketCount {
        content_identifier: f.identifier(),
        event_id,
        new_market_count,
    }))
}

/// The event comes from the path when it names one, else from the
/// subscription. A bad payload passes instead of failing, since the path
/// need not carry any id token.
fn competitor_score(f: &DeltaFrame<'_>) -> Decoded {
    let Some((home_score, away_score)) = f.change.and_then(score_pair) else {
        return Ok(None);
    };
    Ok(Some(ContentContainer::UpdateEventScore {
        content_identifier: f.identifier(),
        event_id: f
            .event_id()
            .unwrap_or_else(|| f.content_id.content_id.clone()),
        home_score,
        away_score,
    }))
}

fn score_side(change: &Value, side: &'static str) -> Result<Option<i64>, DecodeError> {
    match change.get(side) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => int_value(value)
            .map(Some)
            .ok_or_else(|| DecodeError::invalid(side, format!("expected an integer, got {value}"))),
    }
}

fn summary_score(f: &DeltaFrame<'_>) -> Decoded {
    let Some(event_id) = f.event_id() else {
        return Ok(None);
    };
    let change = f.change()?;
    if !change.is_object() {
        return Err(DecodeError::invalid("change", "expected an object"));
    }
    Ok(Some(ContentContainer::UpdateEventScore {
        content_identifier: f.identifier(),
        event_id,
        home_score: score_side(change, "home")?,
        away_score: score_side(change, "away")?,
    }))
}

fn match_time(f: &DeltaFrame<'_>) -> Decoded {
    let Some(event_id) = f.event_id() else {
        return Ok(None);
    };
    let clock = f
        .change()?
        .as_str()
        .ok_or_else(|| DecodeError::invalid("change", "expected a match clock string"))?;
    Ok(extract_match_minutes(clock).map(|new_time| ContentContainer::UpdateEventTime {
        content_identifier: f.identifier(),
        event_id,
        new_time,
    }))
}

fn event_state(f: &DeltaFrame<'_>) -> Decoded {
    let Some(event_id) = f.event_id() else {
        return Ok(None);
    };
    let state = f
        .change()?
        .as_str()
        .ok_or_else(|| DecodeError::invalid("change", "expected a status string"))?;
    Ok(Some(ContentContainer::UpdateEventState {
        content_identifier: f.identifier(),
        event_id,
        state: state.to_string(),
    }))
}

/// Odds on a selection path with a change type other than `updated`.
///
/// Unconfirmed against live traffic: `selection_update` claims every
/// `updated` frame first, so only other change types reach this rule.
fn selection_odd_fallback(f: &DeltaFrame<'_>) -> Decoded {
    let Some(change) = f.change.filter(|c| c.is_object()) else {
        return Ok(None);
    };
    let (Some(numerator), Some(denominator), Some(selection_id)) = (
        price(change, PRICE_UP),
        price(change, PRICE_DOWN),
        change.get(SELECTION_TOKEN).and_then(id_value),
    ) else {
        return Ok(None);
    };
    Ok(Some(ContentContainer::UpdateOutcomeOdd {
        content_identifier: f.identifier(),
        selection_id,
        new_odd_numerator: Some(numerator),
        new_odd_denominator: Some(denominator),
    }))
}

/// Tradability on a market subscription toggles the market's presence.
fn market_presence(f: &DeltaFrame<'_>) -> Decoded {
    let Some(market_id) = f
        .market_id()
        .or_else(|| f.content_id.market_id().map(str::to_string))
    else {
        return Ok(None);
    };
    let Some(is_tradable) = f.change.and_then(Value::as_bool) else {
        return Ok(None);
    };
    let content_identifier = f.identifier();
    Ok(Some(if is_tradable {
        ContentContainer::EnableMarket {
            content_identifier,
            market_id,
        }
    } else {
        ContentContainer::RemoveMarket {
            content_identifier,
            market_id,
        }
    }))
}

fn add_event(f: &DeltaFrame<'_>) -> Decoded {
    Ok(Some(ContentContainer::AddEvent {
        content_identifier: f.identifier(),
        event: f.decode_change::<Event>()?,
    }))
}

fn remove_event(f: &DeltaFrame<'_>) -> Decoded {
    Ok(f.event_id().map(|event_id| ContentContainer::RemoveEvent {
        content_identifier: f.identifier(),
        event_id,
    }))
}

fn add_sport(f: &DeltaFrame<'_>) -> Decoded {
    let Some(mut change) = f.change.filter(|c| c.is_object()).cloned() else {
        return Ok(None);
    };
    // The sport code may only be in the path.
    if change.get(SPORT_TYPE_TOKEN).is_none() {
        if let Some(code) = extract_sport_type_id(f.path) {
            change[SPORT_TYPE_TOKEN] = Value::String(code);
        }
    }
    let Ok(details) = SportTypeDetails::deserialize(&change) else {
        return Ok(None);
    };
    Ok(Some(ContentContainer::AddSport {
        content_identifier: f.identifier(),
        sport_type: details.sport_type,
    }))
}
