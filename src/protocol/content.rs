//! Content type registry and the subscription correlation key.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::errors::DecodeError;
use crate::data::wire::id_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    LiveEvents,
    PreLiveEvents,
    LiveSports,
    PreLiveSports,
    EventDetails,
    EventGroup,
    EventSummary,
    Market,
    EventDetailsLiveData,
}

impl ContentType {
    pub const ALL: [ContentType; 9] = [
        Self::LiveEvents,
        Self::PreLiveEvents,
        Self::LiveSports,
        Self::PreLiveSports,
        Self::EventDetails,
        Self::EventGroup,
        Self::EventSummary,
        Self::Market,
        Self::EventDetailsLiveData,
    ];

    /// Tag used in `contentId.type`.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Self::LiveEvents => "liveDataSummaryAdvancedListBySportType",
            Self::PreLiveEvents => "eventListBySportTypeDate",
            Self::LiveSports => "inplaySportList",
            Self::PreLiveSports => "sportTypeByDate",
            Self::EventDetails => "event",
            Self::EventGroup => "eventGroup",
            Self::EventSummary => "eventSummary",
            Self::Market => "market",
            Self::EventDetailsLiveData => "liveData",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::LiveEvents => "liveEvents",
            Self::PreLiveEvents => "preLiveEvents",
            Self::LiveSports => "liveSports",
            Self::PreLiveSports => "preLiveSports",
            Self::EventDetails => "eventDetails",
            Self::EventGroup => "eventGroup",
            Self::EventSummary => "eventSummary",
            Self::Market => "market",
            Self::EventDetailsLiveData => "eventDetailsLiveData",
        }
    }

    /// Content scoped to a single event.
    pub fn is_event_scoped(&self) -> bool {
        matches!(
            self,
            Self::EventDetails | Self::EventSummary | Self::EventDetailsLiveData
        )
    }
}

impl FromStr for ContentType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.wire_tag() == s || t.variant_name() == s)
            .ok_or_else(|| DecodeError::UnknownContentType(s.to_string()))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_tag())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_tag())
    }
}

/// Correlation key between frames and the subscription that asked for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdentifier {
    pub content_type: ContentType,
    pub content_id: String,
}

impl ContentIdentifier {
    pub fn new(content_type: ContentType, content_id: impl Into<String>) -> Self {
        Self {
            content_type,
            content_id: content_id.into(),
        }
    }

    /// Read `contentId: {type, id}` off a frame.
    pub fn from_frame(frame: &Value) -> Result<Self, DecodeError> {
        let node = frame
            .get("contentId")
            .filter(|v| v.is_object())
            .ok_or(DecodeError::MissingField("contentId"))?;
        let tag = node
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField("contentId.type"))?;
        let content_type = tag.parse()?;
        // Ids are kept verbatim; sport/date ids such as "FBL/2023-04-05" are opaque.
        let content_id = match node.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => id_value(other).ok_or(DecodeError::MissingField("contentId.id"))?,
            None => return Err(DecodeError::MissingField("contentId.id")),
        };
        Ok(Self::new(content_type, content_id))
    }

    pub fn market_id(&self) -> Option<&str> {
        (self.content_type == ContentType::Market).then_some(self.content_id.as_str())
    }

    pub fn event_id(&self) -> Option<&str> {
        self.content_type
            .is_event_scoped()
            .then_some(self.content_id.as_str())
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.content_id)
    }
}
