//! Push channel wire format.
//!
//! Every frame is a JSON text message:
//!
//! ```text
//! {"event": "notification:new",    "data": {"id": 1, "message": "...", "read": false, "createdAt": "..."}}
//! {"event": "notification:read",   "data": 1}
//! {"event": "notification:delete", "data": {"id": 1}}
//! ```
//!
//! For read and delete the payload is either the bare id or an object
//! carrying it. The client never sends application frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::NotificationId;
use crate::domain::notification::{Notification, PushEvent};

pub const EVENT_NOTIFICATION_NEW: &str = "notification:new";
pub const EVENT_NOTIFICATION_READ: &str = "notification:read";
pub const EVENT_NOTIFICATION_DELETE: &str = "notification:delete";

/// Envelope of every push frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdPayload {
    Bare(NotificationId),
    Wrapped { id: NotificationId },
}

impl From<IdPayload> for NotificationId {
    fn from(payload: IdPayload) -> Self {
        match payload {
            IdPayload::Bare(id) | IdPayload::Wrapped { id } => id,
        }
    }
}

/// A frame that could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },
}

/// Decodes one text frame.
///
/// Unknown event names decode to `PushEvent::Unknown`; a known event with a
/// bad payload is an error.
pub fn decode_frame(text: &str) -> Result<PushEvent, DecodeError> {
    let frame: WireFrame =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let invalid = |e: serde_json::Error| DecodeError::InvalidPayload {
        event: frame.event.clone(),
        reason: e.to_string(),
    };

    match frame.event.as_str() {
        EVENT_NOTIFICATION_NEW => serde_json::from_value::<Notification>(frame.data.clone())
            .map(PushEvent::Created)
            .map_err(invalid),
        EVENT_NOTIFICATION_READ => serde_json::from_value::<IdPayload>(frame.data.clone())
            .map(|p| PushEvent::Read(p.into()))
            .map_err(invalid),
        EVENT_NOTIFICATION_DELETE => serde_json::from_value::<IdPayload>(frame.data.clone())
            .map(|p| PushEvent::Deleted(p.into()))
            .map_err(invalid),
        other => Ok(PushEvent::Unknown {
            kind: other.to_string(),
        }),
    }
}

/// Encodes an event as a text frame.
pub fn encode_event(event: &PushEvent) -> Result<String, serde_json::Error> {
    let frame = match event {
        PushEvent::Created(notification) => WireFrame {
            event: EVENT_NOTIFICATION_NEW.to_string(),
            data: serde_json::to_value(notification)?,
        },
        PushEvent::Read(id) => WireFrame {
            event: EVENT_NOTIFICATION_READ.to_string(),
            data: serde_json::to_value(id)?,
        },
        PushEvent::Deleted(id) => WireFrame {
            event: EVENT_NOTIFICATION_DELETE.to_string(),
            data: serde_json::to_value(id)?,
        },
        PushEvent::Unknown { kind } => WireFrame {
            event: kind.clone(),
            data: Value::Null,
        },
    };
    serde_json::to_string(&frame)
}
