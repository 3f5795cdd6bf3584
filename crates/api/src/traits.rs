use async_trait::async_trait;

use concierge_core::{Action, EntityId, EntityKind, Record};

use crate::error::ApiError;
use crate::push::PushMessage;

/// The remote hotel API the sync engine reconciles against.
///
/// An implementation wraps the real HTTP/WebSocket client; tests supply a
/// scripted fake. The engine only ever calls these five operations.
///
/// ## Delivery guarantees
///
/// `fetch_list` is the consistency backstop: it returns the complete
/// current active set for a kind and is safe to call at any time. Push
/// messages are the low-latency path and carry **no** guarantees beyond
/// at-most-arrival-order: they may be dropped or duplicated, and are not
/// replayed after a disconnect. After `reconnect_push` succeeds the caller
/// must issue fresh `fetch_list` calls to resynchronize.
///
/// ## Thread model
///
/// The engine is single-threaded cooperative; implementations must be
/// `Send + Sync + 'static` only so they can be shared with the async
/// drivers, not because the engine calls them concurrently.
#[async_trait]
pub trait HotelApi: Send + Sync + 'static {
    /// Fetch the complete current active set for a kind (bulk snapshot
    /// and poll refresh).
    async fn fetch_list(&self, kind: EntityKind) -> Result<Vec<Record>, ApiError>;

    /// Fetch a single record, `None` if it no longer exists server-side.
    async fn fetch_one(&self, kind: EntityKind, id: &EntityId)
        -> Result<Option<Record>, ApiError>;

    /// Perform a server-side transition. May return the resulting record;
    /// if it does not, the next poll or push event supersedes the caller's
    /// speculative state instead.
    async fn mutate(
        &self,
        kind: EntityKind,
        id: &EntityId,
        action: &Action,
    ) -> Result<Option<Record>, ApiError>;

    /// Receive the next push message. Returns
    /// `Err(ApiError::ChannelClosed)` when the connection drops.
    async fn recv_push(&self) -> Result<PushMessage, ApiError>;

    /// Re-establish the push channel after a close. The caller owns the
    /// retry cadence (fixed delay, no exponential growth needed at this
    /// entity volume).
    async fn reconnect_push(&self) -> Result<(), ApiError>;
}
