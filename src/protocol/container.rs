//! The decoded content container and the per-frame entry point.
//!
//! A frame either carries a `path` (a delta against earlier state) or it does
//! not (a full snapshot for its subscription). Everything downstream consumes
//! [`ContentContainer`] and matches it exhaustively.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::content::ContentIdentifier;
use super::delta::{classify, ChangeType};
use super::errors::DecodeError;
use super::snapshot::decode_snapshot;
use crate::data::models::{Event, EventLiveDataExtended, Market, SportType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentContainer {
    // Snapshots
    LiveEvents {
        content_identifier: ContentIdentifier,
        events: Vec<Event>,
    },
    PreLiveEvents {
        content_identifier: ContentIdentifier,
        events: Vec<Event>,
    },
    LiveSports {
        content_identifier: ContentIdentifier,
        sport_types: Vec<SportType>,
    },
    PreLiveSports {
        content_identifier: ContentIdentifier,
        sport_types: Vec<SportType>,
    },
    EventDetails {
        content_identifier: ContentIdentifier,
        event: Option<Event>,
    },
    EventDetailsLiveData {
        content_identifier: ContentIdentifier,
        live_data: Option<EventLiveDataExtended>,
    },
    EventGroup {
        content_identifier: ContentIdentifier,
        events: Vec<Event>,
    },
    EventSummary {
        content_identifier: ContentIdentifier,
        events: Vec<Event>,
    },
    MarketDetails {
        content_identifier: ContentIdentifier,
        market: Option<Market>,
    },

    // Deltas
    AddEvent {
        content_identifier: ContentIdentifier,
        event: Event,
    },
    RemoveEvent {
        content_identifier: ContentIdentifier,
        event_id: String,
    },
    AddMarket {
        content_identifier: ContentIdentifier,
        market: Market,
    },
    EnableMarket {
        content_identifier: ContentIdentifier,
        market_id: String,
    },
    RemoveMarket {
        content_identifier: ContentIdentifier,
        market_id: String,
    },
    RemoveSelection {
        content_identifier: ContentIdentifier,
        selection_id: String,
    },
    /// Live-data push on a live-data subscription. A clock-only push
    /// carries just `match_time`.
    UpdateEventLiveDataExtended {
        content_identifier: ContentIdentifier,
        event_id: String,
        live_data: EventLiveDataExtended,
    },
    UpdateEventState {
        content_identifier: ContentIdentifier,
        event_id: String,
        state: String,
    },
    UpdateEventTime {
        content_identifier: ContentIdentifier,
        event_id: String,
        new_time: String,
    },
    UpdateEventScore {
        content_identifier: ContentIdentifier,
        event_id: String,
        home_score: Option<i64>,
        away_score: Option<i64>,
    },
    UpdateMarketTradability {
        content_identifier: ContentIdentifier,
        market_id: String,
        is_tradable: bool,
    },
    UpdateEventMarketCount {
        content_identifier: ContentIdentifier,
        event_id: String,
        new_market_count: i64,
    },
    UpdateOutcomeOdd {
        content_identifier: ContentIdentifier,
        selection_id: String,
        new_odd_numerator: Option<String>,
        new_odd_denominator: Option<String>,
    },
    UpdateOutcomeTradability {
        content_identifier: ContentIdentifier,
        selection_id: String,
        is_tradable: bool,
    },
    AddSport {
        content_identifier: ContentIdentifier,
        sport_type: SportType,
    },

    /// A frame that needs no action.
    Unknown,
}

impl ContentContainer {
    pub fn content_identifier(&self) -> Option<&ContentIdentifier> {
        match self {
            Self::LiveEvents { content_identifier, .. }
            | Self::PreLiveEvents { content_identifier, .. }
            | Self::LiveSports { content_identifier, .. }
            | Self::PreLiveSports { content_identifier, .. }
            | Self::EventDetails { content_identifier, .. }
            | Self::EventDetailsLiveData { content_identifier, .. }
            | Self::EventGroup { content_identifier, .. }
            | Self::EventSummary { content_identifier, .. }
            | Self::MarketDetails { content_identifier, .. }
            | Self::AddEvent { content_identifier, .. }
            | Self::RemoveEvent { content_identifier, .. }
            | Self::AddMarket { content_identifier, .. }
            | Self::EnableMarket { content_identifier, .. }
            | Self::RemoveMarket { content_identifier, .. }
            | Self::RemoveSelection { content_identifier, .. }
            | Self::UpdateEventLiveDataExtended { content_identifier, .. }
            | Self::UpdateEventState { content_identifier, .. }
            | Self::UpdateEventTime { content_identifier, .. }
            | Self::UpdateEventScore { content_identifier, .. }
            | Self::UpdateMarketTradability { content_identifier, .. }
            | Self::UpdateEventMarketCount { content_identifier, .. }
            | Self::UpdateOutcomeOdd { content_identifier, .. }
            | Self::UpdateOutcomeTradability { content_identifier, .. }
            | Self::AddSport { content_identifier, .. } => Some(content_identifier),
            Self::Unknown => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::LiveEvents { .. } => "liveEvents",
            Self::PreLiveEvents { .. } => "preLiveEvents",
            Self::LiveSports { .. } => "liveSports",
            Self::PreLiveSports { .. } => "preLiveSports",
            Self::EventDetails { .. } => "eventDetails",
            Self::EventDetailsLiveData { .. } => "eventDetailsLiveData",
            Self::EventGroup { .. } => "eventGroup",
            Self::EventSummary { .. } => "eventSummary",
            Self::MarketDetails { .. } => "marketDetails",
            Self::AddEvent { .. } => "addEvent",
            Self::RemoveEvent { .. } => "removeEvent",
            Self::AddMarket { .. } => "addMarket",
            Self::EnableMarket { .. } => "enableMarket",
            Self::RemoveMarket { .. } => "removeMarket",
            Self::RemoveSelection { .. } => "removeSelection",
            Self::UpdateEventLiveDataExtended { .. } => "updateEventLiveDataExtended",
            Self::UpdateEventState { .. } => "updateEventState",
            Self::UpdateEventTime { .. } => "updateEventTime",
            Self::UpdateEventScore { .. } => "updateEventScore",
            Self::UpdateMarketTradability { .. } => "updateMarketTradability",
            Self::UpdateEventMarketCount { .. } => "updateEventMarketCount",
            Self::UpdateOutcomeOdd { .. } => "updateOutcomeOdd",
            Self::UpdateOutcomeTradability { .. } => "updateOutcomeTradability",
            Self::AddSport { .. } => "addSport",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            Self::LiveEvents { .. }
                | Self::PreLiveEvents { .. }
                | Self::LiveSports { .. }
                | Self::PreLiveSports { .. }
                | Self::EventDetails { .. }
                | Self::EventDetailsLiveData { .. }
                | Self::EventGroup { .. }
                | Self::EventSummary { .. }
                | Self::MarketDetails { .. }
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ContentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.content_identifier() {
            Some(id) => write!(f, "{} [{}]", self.kind(), id),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Decode one content frame.
///
/// Frames with a `path` are deltas; the rest are snapshots. A `changeType`
/// on a snapshot (`"refreshed"`) is ignored.
pub fn decode_content_container(frame: &Value) -> Result<ContentContainer, DecodeError> {
    let content_id = ContentIdentifier::from_frame(frame)?;
    let change = frame.get("change");

    match frame.get("path") {
        None | Some(Value::Null) => decode_snapshot(content_id, change),
        Some(Value::String(path)) => {
            let change_type = frame
                .get("changeType")
                .and_then(Value::as_str)
                .map(ChangeType::parse)
                .unwrap_or(ChangeType::Other);
            classify(&content_id, path, change_type, change)
        }
        Some(_) => Err(DecodeError::invalid("path", "expected a string")),
    }
}
