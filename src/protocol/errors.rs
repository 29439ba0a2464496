//! Decode error types for the live content feed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    #[error("Live data for event {event_id} carried no populated fields")]
    EmptyLiveData { event_id: String },

    #[error("Rule {rule} failed for content {content_id} at path {path}: {source}")]
    Payload {
        rule: &'static str,
        content_id: String,
        path: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Wrap a payload failure with the delta frame it came from.
    pub fn in_rule(self, rule: &'static str, content_id: &str, path: &str) -> Self {
        Self::Payload {
            rule,
            content_id: content_id.to_string(),
            path: path.to_string(),
            source: Box::new(self),
        }
    }

    /// Whether the frame was well-formed JSON that broke a protocol contract,
    /// as opposed to bytes that never parsed at all.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Json(e) => !e.is_syntax() && !e.is_eof(),
            Self::Payload { source, .. } => source.is_protocol_violation(),
            _ => true,
        }
    }

    /// Path of the offending delta, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Payload { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn content_id(&self) -> Option<&str> {
        match self {
            Self::Payload { content_id, .. } => Some(content_id),
            _ => None,
        }
    }
}
