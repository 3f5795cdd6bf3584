//! Push-channel message envelope.

use serde::{Deserialize, Serialize};

/// Message type for a single-room housekeeping status change.
/// Payload: `{"room_number": "204", "status": "REQUESTED_CLEANING"}`.
pub const MSG_ROOM_UPDATE: &str = "ROOM_UPDATE";

/// Message type announcing a new amenity request. The payload carries the
/// record the server just saved, but consumers re-fetch the list rather
/// than trusting it (ids may not be final at broadcast time).
pub const MSG_NEW_TASK: &str = "NEW_TASK";

/// Message type announcing a new maintenance ticket. Same re-fetch
/// convention as [`MSG_NEW_TASK`].
pub const MSG_NEW_TICKET: &str = "NEW_TICKET";

/// The `{type, payload}` envelope every push message arrives in.
///
/// The type field identifies one of a small closed set; unrecognized types
/// must be ignored by consumers so the server can add message types
/// without breaking older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: serde_json::Value,
}

impl PushMessage {
    pub fn new(message_type: impl Into<String>, payload: serde_json::Value) -> Self {
        PushMessage {
            message_type: message_type.into(),
            payload,
        }
    }
}
