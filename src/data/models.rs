//! Core data models for the live content feed.
//!
//! Events, markets and outcomes decode straight from the provider's wire
//! objects (`idfoevent`, `idfomarket`, `idfoselection`, ...). Field-level
//! leniency lives in [`super::wire`]; the structural rules (placeholder ids,
//! flattened markets, over/under ordering) live here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::live_data;
use super::wire::{
    de_count, de_id, de_lenient_bool, de_opt_count, de_opt_id, de_opt_text, int_value,
    parse_start_date,
};
use crate::protocol::errors::DecodeError;
use crate::protocol::failable::de_fail_soft;

/// Id the provider uses for template rows that are not real events.
const PLACEHOLDER_EVENT_ID: &str = "_TOKEN_";

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum EventStatus {
    #[default]
    Unknown,
    NotStarted,
    /// Any running state; the provider sends period names here ("1st half").
    InProgress(String),
    Ended,
}

impl EventStatus {
    pub fn from_wire(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "unknown" => Self::Unknown,
            "not_started" => Self::NotStarted,
            "ended" => Self::Ended,
            _ => Self::InProgress(trimmed.to_string()),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress(period) => write!(f, "{}", period),
            Self::Ended => write!(f, "ended"),
        }
    }
}

impl Serialize for EventStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivePlayerServe {
    Home,
    Away,
}

impl ActivePlayerServe {
    /// The serving side arrives as `1`/`2` or `"1"`/`"2"`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match int_value(value)? {
            1 => Some(Self::Home),
            2 => Some(Self::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomesOrder {
    #[default]
    None,
    Odds,
    Name,
    /// Keep the order the server sent.
    Setup,
}

impl FromStr for OutcomesOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "odds" => Self::Odds,
            "name" => Self::Name,
            "setup" => Self::Setup,
            _ => Self::None,
        })
    }
}

// =============================================================================
// Scores
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Score {
    Set {
        index: u32,
        home: Option<i64>,
        away: Option<i64>,
    },
    GamePart {
        home: Option<i64>,
        away: Option<i64>,
    },
    MatchFull {
        home: Option<i64>,
        away: Option<i64>,
    },
}

impl Score {
    pub fn key(&self) -> String {
        match self {
            Self::Set { index, .. } => format!("set{}", index),
            Self::GamePart { .. } => "gamePart".to_string(),
            Self::MatchFull { .. } => "matchFull".to_string(),
        }
    }

    pub fn sort_value(&self) -> u32 {
        match self {
            Self::Set { index, .. } => *index,
            Self::GamePart { .. } => 100,
            Self::MatchFull { .. } => 200,
        }
    }
}

/// Scores in display order: sets ascending, then the game part, then the
/// full-match score.
pub fn sorted_scores(scores: &BTreeMap<String, Score>) -> Vec<Score> {
    let mut sorted: Vec<Score> = scores.values().copied().collect();
    sorted.sort_by_key(Score::sort_value);
    sorted
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "RawOutcome")]
pub struct Outcome {
    pub id: String,
    pub name: String,
    pub hash_code: String,
    pub market_id: Option<String>,
    /// `h`, `d` or `a` for home/draw/away selections.
    pub order_value: Option<String>,
    pub external_reference: Option<String>,
    pub price_numerator: Option<String>,
    pub price_denominator: Option<String>,
    pub is_tradable: bool,
    pub is_over_under: bool,
}

impl Outcome {
    /// Decimal odds from the fractional price: `numerator / denominator + 1`.
    pub fn odd(&self) -> Option<Decimal> {
        let numerator = Decimal::from_str(self.price_numerator.as_deref()?.trim()).ok()?;
        let denominator = Decimal::from_str(self.price_denominator.as_deref()?.trim()).ok()?;
        numerator
            .checked_div(denominator)
            .map(|fraction| fraction + Decimal::ONE)
    }

    /// Apply a price delta; parts that are absent keep their current value.
    pub fn apply_odd_update(&mut self, numerator: Option<String>, denominator: Option<String>) {
        if let Some(numerator) = numerator {
            self.price_numerator = Some(numerator);
        }
        if let Some(denominator) = denominator {
            self.price_denominator = Some(denominator);
        }
    }
}

#[derive(Deserialize)]
struct RawOutcome {
    #[serde(rename = "idfoselection", deserialize_with = "de_id")]
    id: String,
    name: String,
    #[serde(rename = "selectionhashcode")]
    hash_code: String,
    #[serde(rename = "currentpriceup", default, deserialize_with = "de_opt_text")]
    price_numerator: Option<String>,
    #[serde(rename = "currentpricedown", default, deserialize_with = "de_opt_text")]
    price_denominator: Option<String>,
    #[serde(rename = "idfomarket", default, deserialize_with = "de_opt_id")]
    market_id: Option<String>,
    #[serde(rename = "hadvalue")]
    order_value: Option<String>,
    #[serde(rename = "externalreference", default, deserialize_with = "de_opt_text")]
    external_reference: Option<String>,
    #[serde(rename = "istradable", default, deserialize_with = "de_lenient_bool")]
    is_tradable: Option<bool>,
    #[serde(rename = "isunderover", default)]
    is_over_under: Option<bool>,
}

impl TryFrom<RawOutcome> for Outcome {
    type Error = DecodeError;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        let is_over_under = raw.is_over_under.unwrap_or(false);
        let order_value = if is_over_under {
            raw.order_value.map(swap_home_away)
        } else {
            raw.order_value
        };

        Ok(Self {
            id: raw.id,
            name: raw.name,
            hash_code: raw.hash_code,
            market_id: raw.market_id,
            order_value,
            external_reference: raw.external_reference,
            price_numerator: raw.price_numerator,
            price_denominator: raw.price_denominator,
            is_tradable: raw.is_tradable.unwrap_or(true),
            is_over_under,
        })
    }
}

fn swap_home_away(order_value: String) -> String {
    match order_value.to_lowercase().as_str() {
        "h" => "a".to_string(),
        "a" => "h".to_string(),
        _ => order_value,
    }
}

// =============================================================================
// Market
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "RawMarket")]
pub struct Market {
    pub id: String,
    pub name: String,
    pub outcomes: Vec<Outcome>,
    pub market_type_id: Option<String>,
    pub event_market_type_id: Option<String>,
    pub event_name: Option<String>,
    pub event_id: Option<String>,
    pub is_tradable: bool,
    pub event_market_count: Option<i64>,
    pub is_main_outright: Option<bool>,
    pub is_over_under: bool,
    pub line: Option<String>,
    pub outcomes_order: OutcomesOrder,
    pub home_participant: Option<String>,
    pub away_participant: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub custom_bet_available: Option<bool>,
}

#[derive(Deserialize)]
struct RawMarket {
    #[serde(rename = "idfomarket", deserialize_with = "de_id")]
    id: String,
    name: String,
    #[serde(rename = "selections")]
    outcomes: Vec<Outcome>,
    #[serde(rename = "idefmarkettype", default, deserialize_with = "de_opt_id")]
    market_type_id: Option<String>,
    #[serde(rename = "idfomarkettype", default, deserialize_with = "de_opt_id")]
    event_market_type_id: Option<String>,
    #[serde(rename = "eventname")]
    event_name: Option<String>,
    #[serde(rename = "idfoevent", default, deserialize_with = "de_opt_id")]
    event_id: Option<String>,
    #[serde(rename = "istradable")]
    is_tradable: Option<bool>,
    #[serde(rename = "eventMarketCount", default, deserialize_with = "de_opt_count")]
    event_market_count: Option<i64>,
    #[serde(rename = "ismainoutright")]
    is_main_outright: Option<bool>,
    #[serde(rename = "isunderover")]
    is_over_under: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_text")]
    line: Option<String>,
    #[serde(rename = "idfoselectionorder")]
    outcomes_order: Option<String>,
    #[serde(rename = "participantname_home")]
    home_participant: Option<String>,
    #[serde(rename = "participantname_away")]
    away_participant: Option<String>,
    #[serde(rename = "tsstart")]
    start_date: Option<String>,
    #[serde(rename = "custombetavailable")]
    custom_bet_available: Option<bool>,
}

impl TryFrom<RawMarket> for Market {
    type Error = DecodeError;

    fn try_from(raw: RawMarket) -> Result<Self, Self::Error> {
        let is_over_under = raw.is_over_under.unwrap_or(false);
        let mut outcomes = raw.outcomes;
        if is_over_under {
            for outcome in &mut outcomes {
                if let Some(order_value) = outcome.order_value.take() {
                    outcome.order_value = Some(swap_home_away(order_value));
                }
            }
            outcomes.reverse();
        }

        Ok(Self {
            id: raw.id,
            name: raw.name.replace(['\n', '\r'], ""),
            outcomes,
            market_type_id: raw.market_type_id,
            event_market_type_id: raw.event_market_type_id,
            event_name: raw.event_name,
            event_id: raw.event_id,
            is_tradable: raw.is_tradable.unwrap_or(true),
            event_market_count: raw.event_market_count,
            is_main_outright: raw.is_main_outright,
            is_over_under,
            line: raw.line,
            outcomes_order: raw
                .outcomes_order
                .as_deref()
                .map(|s| s.parse::<OutcomesOrder>().unwrap_or_default())
                .unwrap_or_default(),
            home_participant: raw.home_participant,
            away_participant: raw.away_participant,
            // Markets tolerate a bad start date; events do not.
            start_date: raw.start_date.as_deref().and_then(parse_start_date),
            custom_bet_available: raw.custom_bet_available,
        })
    }
}

// =============================================================================
// Event
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "Value")]
pub struct Event {
    pub id: String,
    pub name: Option<String>,
    pub home_name: Option<String>,
    pub away_name: Option<String>,
    pub competition_id: Option<String>,
    pub competition_name: Option<String>,
    pub sport_type_name: Option<String>,
    pub sport_type_code: Option<String>,
    pub sport_id_code: Option<String>,
    pub tournament_country_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub markets: Vec<Market>,
    pub number_markets: Option<i64>,
    pub external_reference: Option<String>,
    pub match_time: Option<String>,
    pub status: EventStatus,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub scores: BTreeMap<String, Score>,
    pub active_player_serving: Option<ActivePlayerServe>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "idfoevent", deserialize_with = "de_id")]
    id: String,
    name: Option<String>,
    #[serde(rename = "participantname_home")]
    home_name: Option<String>,
    #[serde(rename = "participantname_away")]
    away_name: Option<String>,
    #[serde(rename = "idfotournament", default, deserialize_with = "de_opt_id")]
    competition_id: Option<String>,
    #[serde(rename = "tournamentname")]
    competition_name: Option<String>,
    #[serde(rename = "sporttypename")]
    sport_type_name: Option<String>,
    #[serde(rename = "idfosporttype")]
    sport_type_code: Option<String>,
    #[serde(rename = "idfosport", default, deserialize_with = "de_opt_id")]
    sport_id_code: Option<String>,
    #[serde(rename = "tournamentcountryname")]
    tournament_country_name: Option<String>,
    #[serde(rename = "tsstart")]
    start_date: Option<String>,
    markets: Option<Vec<Market>>,
    #[serde(rename = "numMarkets", default, deserialize_with = "de_opt_count")]
    number_markets: Option<i64>,
    #[serde(rename = "externalreference", default, deserialize_with = "de_opt_text")]
    external_reference: Option<String>,
    #[serde(rename = "liveDataSummary")]
    live_data_summary: Option<Value>,
}

impl TryFrom<Value> for Event {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let raw = RawEvent::deserialize(&value)?;
        if raw.id == PLACEHOLDER_EVENT_ID {
            return Err(DecodeError::invalid("idfoevent", "placeholder event"));
        }

        let start_date = match raw.start_date.as_deref() {
            Some(ts) => Some(
                parse_start_date(ts)
                    .ok_or_else(|| DecodeError::invalid("tsstart", format!("unparsable date {ts:?}")))?,
            ),
            None => None,
        };

        // Some listings flatten a single market into the event object.
        let markets = match raw.markets {
            Some(markets) => markets,
            None => Market::deserialize(&value).map(|m| vec![m]).unwrap_or_default(),
        };
        let number_markets = raw
            .number_markets
            .or_else(|| markets.first().and_then(|m| m.event_market_count));

        let summary = raw
            .live_data_summary
            .as_ref()
            .map(live_data::decode_summary)
            .unwrap_or_default();

        Ok(Self {
            id: raw.id,
            name: raw.name,
            home_name: raw.home_name,
            away_name: raw.away_name,
            competition_id: raw.competition_id,
            competition_name: raw.competition_name,
            sport_type_name: raw.sport_type_name,
            sport_type_code: raw.sport_type_code,
            sport_id_code: raw.sport_id_code,
            tournament_country_name: raw.tournament_country_name,
            start_date,
            markets,
            number_markets,
            external_reference: raw.external_reference,
            match_time: summary.match_time,
            status: summary.status.unwrap_or_default(),
            home_score: summary.home_score,
            away_score: summary.away_score,
            scores: summary.scores,
            active_player_serving: summary.serving,
        })
    }
}

// =============================================================================
// Live data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLiveDataExtended {
    pub id: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    /// Raw match clock, e.g. `"45:00 +3:20"`.
    pub match_time: Option<String>,
    pub status: Option<EventStatus>,
    pub scores: BTreeMap<String, Score>,
    pub active_player_serving: Option<ActivePlayerServe>,
}

impl EventLiveDataExtended {
    pub fn sorted_scores(&self) -> Vec<Score> {
        sorted_scores(&self.scores)
    }
}

// =============================================================================
// Sports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportType {
    #[serde(alias = "sporttypename")]
    pub name: String,
    #[serde(default, alias = "idfosport", deserialize_with = "de_opt_id")]
    pub numeric_id: Option<String>,
    #[serde(default, alias = "idfosporttype")]
    pub alpha_id: Option<String>,
    #[serde(default, alias = "numEvents", alias = "numevents", deserialize_with = "de_count")]
    pub number_events: i64,
    #[serde(default, alias = "numoutrightevents", deserialize_with = "de_count")]
    pub number_outright_events: i64,
    #[serde(default, alias = "numoutrightmarkets", deserialize_with = "de_count")]
    pub number_outright_markets: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "RawSportTypeDetails")]
pub struct SportTypeDetails {
    pub sport_type: SportType,
    pub events_count: i64,
    pub sport_name: String,
}

#[derive(Deserialize)]
struct RawSportTypeDetails {
    idfosporttype: String,
    sporttypename: String,
    #[serde(rename = "numEvents", deserialize_with = "de_count")]
    events_count: i64,
}

impl TryFrom<RawSportTypeDetails> for SportTypeDetails {
    type Error = DecodeError;

    fn try_from(raw: RawSportTypeDetails) -> Result<Self, Self::Error> {
        Ok(Self {
            sport_type: SportType {
                name: raw.sporttypename.clone(),
                numeric_id: None,
                alpha_id: Some(raw.idfosporttype),
                number_events: raw.events_count,
                number_outright_events: 0,
                number_outright_markets: 0,
            },
            events_count: raw.events_count,
            sport_name: raw.sporttypename,
        })
    }
}

/// Event-group snapshot payload. Member events decode fail-soft.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompetitionMarketGroup {
    #[serde(rename = "idfwmarketgroup", default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_fail_soft")]
    pub events: Vec<Event>,
}
