//! Engine-level errors.

use concierge_api::ApiError;
use concierge_core::{EntityId, EntityKind, ModelError};

/// All errors the sync engine surfaces to a caller.
///
/// Background consistency problems (illegal transitions, malformed push
/// payloads) are *not* errors -- they are dropped and logged, and the UI
/// resolves to the next consistent state silently. Only user-initiated
/// mutations produce a value of this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// A mutation is already pending for this identifier. The engine does
    /// not queue behind it; the view should disable the control and let
    /// the user retry after resolution.
    #[error("a mutation is already pending for {kind} {id}")]
    Busy { kind: EntityKind, id: EntityId },

    /// The identifier is not in the active set for its kind.
    #[error("no {kind} record with identifier {id}")]
    UnknownRecord { kind: EntityKind, id: EntityId },

    /// The requested action is not legal for the record's current state.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The boundary call failed; the optimistic state has been reverted.
    #[error("mutation failed: {0}")]
    Mutation(#[from] ApiError),
}
