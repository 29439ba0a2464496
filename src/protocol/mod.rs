//! Wire protocol: notification envelopes, content frames and delta
//! classification.

pub mod container;
pub mod content;
pub mod delta;
pub mod errors;
pub mod failable;
pub mod notification;
pub mod path;
pub mod snapshot;

pub use container::{decode_content_container, ContentContainer};
pub use content::{ContentIdentifier, ContentType};
pub use errors::DecodeError;
pub use notification::{decode_notification, NotificationType};
