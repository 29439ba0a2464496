//! Top-level socket notification envelope.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::container::{decode_content_container, ContentContainer};
use super::errors::DecodeError;
use super::failable::collect_fail_soft;

const LISTENING_STARTED: &str = "LISTENING_STARTED";
const CONTENT_CHANGES: &str = "CONTENT_CHANGES";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notificationType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NotificationType {
    /// Subscription handshake; `data` is the session token.
    ListeningStarted { session_token_id: String },
    /// A batch of content frames. `dropped` counts frames that failed to
    /// decode and were left out of `contents`.
    ContentChanges {
        contents: Vec<ContentContainer>,
        dropped: usize,
    },
    Unknown,
}

impl NotificationType {
    pub fn from_value(frame: &Value) -> Result<Self, DecodeError> {
        let tag = frame
            .get("notificationType")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField("notificationType"))?;

        match tag {
            LISTENING_STARTED => {
                let token = frame
                    .get("data")
                    .and_then(Value::as_str)
                    .ok_or(DecodeError::MissingField("data"))?;
                Ok(Self::ListeningStarted {
                    session_token_id: token.to_string(),
                })
            }
            CONTENT_CHANGES => {
                let frames = frame
                    .get("data")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("data"))?;
                let batch = collect_fail_soft(frames, "content container", decode_content_container);
                Ok(Self::ContentChanges {
                    contents: batch.items,
                    dropped: batch.dropped,
                })
            }
            other => {
                debug!(notification_type = %other, "Unhandled notification type");
                Ok(Self::Unknown)
            }
        }
    }
}

/// Decode one raw socket frame.
pub fn decode_notification(bytes: &[u8]) -> Result<NotificationType, DecodeError> {
    let frame: Value = serde_json::from_slice(bytes)?;
    NotificationType::from_value(&frame)
}
