//! Initial snapshot decoding, one payload shape per content type.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::container::ContentContainer;
use super::content::{ContentIdentifier, ContentType};
use super::errors::DecodeError;
use super::failable::decode_array;
use crate::data::live_data::decode_live_data;
use crate::data::models::{CompetitionMarketGroup, Event, Market, SportType, SportTypeDetails};

fn required_array(change: Option<&Value>) -> Result<&[Value], DecodeError> {
    match change {
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(DecodeError::invalid("change", "expected an array")),
        None => Err(DecodeError::MissingField("change")),
    }
}

/// Absent lists are empty; servers omit them rather than send `[]`.
fn optional_array(change: Option<&Value>) -> Result<&[Value], DecodeError> {
    match change {
        None => Ok(&[]),
        some => required_array(some),
    }
}

fn optional<T>(change: Option<&Value>) -> Result<Option<T>, DecodeError>
where
    T: for<'de> Deserialize<'de>,
{
    change
        .map(|value| T::deserialize(value).map_err(DecodeError::from))
        .transpose()
}

/// Decode the full-state payload of a subscription.
///
/// `change` is the frame's `change` field; `null` counts as absent.
pub fn decode_snapshot(
    content_id: ContentIdentifier,
    change: Option<&Value>,
) -> Result<ContentContainer, DecodeError> {
    let change = change.filter(|v| !v.is_null());

    let container = match content_id.content_type {
        ContentType::LiveEvents => ContentContainer::LiveEvents {
            events: decode_array::<Event>(required_array(change)?, "event").items,
            content_identifier: content_id,
        },
        ContentType::PreLiveEvents => ContentContainer::PreLiveEvents {
            events: decode_array::<Event>(optional_array(change)?, "event").items,
            content_identifier: content_id,
        },
        ContentType::LiveSports => ContentContainer::LiveSports {
            sport_types: decode_array::<SportTypeDetails>(required_array(change)?, "sport")
                .items
                .into_iter()
                .map(|details| details.sport_type)
                .collect(),
            content_identifier: content_id,
        },
        ContentType::PreLiveSports => ContentContainer::PreLiveSports {
            sport_types: decode_array::<SportType>(optional_array(change)?, "sport").items,
            content_identifier: content_id,
        },
        ContentType::EventDetails => ContentContainer::EventDetails {
            event: optional(change)?,
            content_identifier: content_id,
        },
        ContentType::EventSummary => ContentContainer::EventSummary {
            events: optional::<Event>(change)?.into_iter().collect(),
            content_identifier: content_id,
        },
        ContentType::EventGroup => ContentContainer::EventGroup {
            events: optional::<CompetitionMarketGroup>(change)?
                .map(|group| group.events)
                .unwrap_or_default(),
            content_identifier: content_id,
        },
        ContentType::Market => ContentContainer::MarketDetails {
            market: optional::<Market>(change)?,
            content_identifier: content_id,
        },
        ContentType::EventDetailsLiveData => ContentContainer::EventDetailsLiveData {
            live_data: change
                .map(|raw| decode_live_data(raw, &content_id.content_id))
                .transpose()?,
            content_identifier: content_id,
        },
    };

    trace!(container = %container, "Decoded snapshot");
    Ok(container)
}
