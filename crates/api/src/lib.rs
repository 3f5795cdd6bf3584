//! concierge-api: the boundary contract with the remote hotel API.
//!
//! The HTTP/WebSocket client plumbing is an external collaborator; this
//! crate defines only the abstract surface the sync engine consumes:
//!
//! - [`HotelApi`] -- the async boundary trait (`fetch_list`, `fetch_one`,
//!   `mutate`, push receive/reconnect)
//! - [`PushMessage`] -- the `{type, payload}` envelope of the push channel
//! - [`ApiError`] -- the transport-level error taxonomy
//!
//! Implementations must tolerate the channel's weak guarantees: messages
//! may be dropped or duplicated, and nothing is replayed after a
//! disconnect -- a reconnect must be followed by a fresh `fetch_list` to
//! resynchronize.

pub mod error;
pub mod push;
pub mod traits;

pub use error::ApiError;
pub use push::{PushMessage, MSG_NEW_TASK, MSG_NEW_TICKET, MSG_ROOM_UPDATE};
pub use traits::HotelApi;
