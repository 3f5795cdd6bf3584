//! The single normalized event shape the store consumes.
//!
//! Polling and push are treated as producers into the same stream so the
//! reconciliation rules are written and tested once. Every event carries
//! the timestamp used by the optimistic-precedence rule: a snapshot's
//! `taken_at`, or an update's `observed_at` (arrival time when the
//! payload carries no server timestamp).

use time::OffsetDateTime;

use concierge_core::{EntityId, EntityKind, Record};

/// One normalized input to the reconciled store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Full replacement of a kind's active set (bulk load or poll
    /// refresh).
    Snapshot {
        kind: EntityKind,
        records: Vec<Record>,
        taken_at: OffsetDateTime,
    },
    /// Single-record incremental update from the push channel.
    Update {
        record: Record,
        observed_at: OffsetDateTime,
    },
    /// Explicit removal of one identifier from the active set.
    Remove { kind: EntityKind, id: EntityId },
    /// The push channel announced new data it does not carry in full; the
    /// consumer should re-fetch the kind's list.
    RefetchNeeded { kind: EntityKind },
}

impl SyncEvent {
    pub fn kind(&self) -> EntityKind {
        match self {
            SyncEvent::Snapshot { kind, .. }
            | SyncEvent::Remove { kind, .. }
            | SyncEvent::RefetchNeeded { kind } => *kind,
            SyncEvent::Update { record, .. } => record.kind(),
        }
    }
}
