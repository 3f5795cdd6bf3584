//! The optimistic mutation coordinator.
//!
//! Lets a view perform an action with zero perceived latency while
//! guaranteeing the store never permanently diverges from server truth.
//!
//! Protocol per mutation:
//!
//! 1. Compute the expected next record from the state machine (never
//!    trusting the view layer to know it) and install it in the store
//!    with a `Pending` overlay tagged with a monotonically increasing
//!    local sequence number and the wall-clock issue time.
//! 2. The caller issues the boundary `mutate` call.
//! 3. On success, a returned server record supersedes the speculative one
//!    immediately; with no returned record the next poll or push event
//!    supersedes it naturally.
//! 4. On failure, the identifier reverts to its stashed pre-mutation
//!    record and the error is surfaced to the requesting view.
//!
//! At most one mutation is outstanding per identifier. A second action on
//! a busy identifier is rejected synchronously -- the coordinator does
//! not queue behind in-flight mutations, avoiding hidden ordering bugs.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use tracing::debug;

use concierge_core::{expected_after, Action, EntityId, EntityKind, Record};

use crate::error::SyncError;
use crate::store::ReconciledStore;

/// Book-keeping for one in-flight mutation.
#[derive(Debug, Clone)]
struct PendingMutation {
    seq: u64,
    /// The record as it stood before the speculative apply; `None` means
    /// the identifier did not exist (nothing to restore on revert).
    prior: Option<Record>,
}

/// Tracks in-flight optimistic mutations, one at most per identifier.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    next_seq: u64,
    pending: BTreeMap<(EntityKind, EntityId), PendingMutation>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a mutation outstanding for this identifier?
    pub fn is_pending(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.pending.contains_key(&(kind, id.clone()))
    }

    /// Start a mutation: validate against the state machine, apply the
    /// speculative record, and return the sequence number the caller must
    /// hand back to [`resolve`](Self::resolve) or [`fail`](Self::fail).
    ///
    /// Rejects with [`SyncError::Busy`] if a mutation is already pending
    /// for the identifier, and with [`SyncError::UnknownRecord`] if the
    /// identifier is not in the active set.
    pub fn begin(
        &mut self,
        store: &mut ReconciledStore,
        kind: EntityKind,
        id: &EntityId,
        action: &Action,
        issued_at: OffsetDateTime,
    ) -> Result<u64, SyncError> {
        let key = (kind, id.clone());
        if self.pending.contains_key(&key) {
            return Err(SyncError::Busy {
                kind,
                id: id.clone(),
            });
        }
        let current = store
            .get(kind, id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| SyncError::UnknownRecord {
                kind,
                id: id.clone(),
            })?;
        let speculative = expected_after(&current, action)?;

        self.next_seq += 1;
        let seq = self.next_seq;
        let prior = store.begin_pending(speculative, seq, issued_at);
        debug!(kind = %kind, id = %id, seq, action = action.name(), "optimistic mutation applied");
        self.pending.insert(key, PendingMutation { seq, prior });
        Ok(seq)
    }

    /// Confirm a mutation after the boundary call succeeded.
    ///
    /// A no-op when the mutation was already superseded by authoritative
    /// data while the call was in flight (the sequence number no longer
    /// matches).
    pub fn resolve(
        &mut self,
        store: &mut ReconciledStore,
        kind: EntityKind,
        id: &EntityId,
        seq: u64,
        server_record: Option<Record>,
        at: OffsetDateTime,
    ) {
        let key = (kind, id.clone());
        match self.pending.get(&key) {
            Some(pending) if pending.seq == seq => {
                self.pending.remove(&key);
                store.confirm(kind, id, server_record, at);
            }
            _ => debug!(kind = %kind, id = %id, seq, "mutation already superseded, resolve ignored"),
        }
    }

    /// Roll back a mutation after the boundary call failed.
    ///
    /// A no-op when the mutation was already superseded: server truth has
    /// arrived in the meantime and there is nothing speculative left to
    /// revert.
    pub fn fail(
        &mut self,
        store: &mut ReconciledStore,
        kind: EntityKind,
        id: &EntityId,
        seq: u64,
        at: OffsetDateTime,
    ) {
        let key = (kind, id.clone());
        match self.pending.get(&key) {
            Some(pending) if pending.seq == seq => {
                let prior = pending.prior.clone();
                self.pending.remove(&key);
                store.revert(kind, id, prior, at);
            }
            _ => debug!(kind = %kind, id = %id, seq, "mutation already superseded, revert skipped"),
        }
    }

    /// Forget pending mutations the store reported as superseded by
    /// authoritative data (a later push event or snapshot).
    pub fn forget_superseded(&mut self, kind: EntityKind, ids: &[EntityId]) {
        for id in ids {
            self.pending.remove(&(kind, id.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Overlay;
    use concierge_core::{RoomState, RoomStatusRecord};
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2025-11-02 10:00 UTC);
    const T1: OffsetDateTime = datetime!(2025-11-02 10:00:05 UTC);

    fn room(number: &str, status: RoomState) -> Record {
        Record::RoomStatus(RoomStatusRecord {
            room_number: number.to_string(),
            status,
        })
    }

    fn seeded() -> (ReconciledStore, MutationCoordinator, EntityId) {
        let mut store = ReconciledStore::new();
        store.apply_event(room("204", RoomState::RequestedCleaning), T0);
        (
            store,
            MutationCoordinator::new(),
            EntityId::Room("204".into()),
        )
    }

    #[test]
    fn begin_applies_speculative_state() {
        let (mut store, mut coordinator, id) = seeded();
        let seq = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap();
        let stored = store.get(EntityKind::RoomStatus, &id).unwrap();
        assert_eq!(stored.record.status_str(), "CLEAN");
        assert_eq!(stored.overlay, Overlay::Pending { seq, issued_at: T1 });
        assert!(coordinator.is_pending(EntityKind::RoomStatus, &id));
    }

    #[test]
    fn second_mutation_on_same_identifier_is_rejected() {
        let (mut store, mut coordinator, id) = seeded();
        coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap();
        let err = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Dirty),
                T1,
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Busy { .. }));
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let (mut store, mut coordinator, _) = seeded();
        let missing = EntityId::Room("999".into());
        let err = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &missing,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownRecord { .. }));
    }

    #[test]
    fn resolve_without_server_record_confirms_speculation() {
        let (mut store, mut coordinator, id) = seeded();
        let seq = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap();
        coordinator.resolve(&mut store, EntityKind::RoomStatus, &id, seq, None, T1);
        let stored = store.get(EntityKind::RoomStatus, &id).unwrap();
        assert_eq!(stored.record.status_str(), "CLEAN");
        assert_eq!(stored.overlay, Overlay::Confirmed);
        assert!(!coordinator.is_pending(EntityKind::RoomStatus, &id));
    }

    #[test]
    fn fail_restores_pre_mutation_state() {
        let (mut store, mut coordinator, id) = seeded();
        let seq = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap();
        coordinator.fail(&mut store, EntityKind::RoomStatus, &id, seq, T1);
        let stored = store.get(EntityKind::RoomStatus, &id).unwrap();
        assert_eq!(stored.record.status_str(), "REQUESTED_CLEANING");
        assert!(matches!(stored.overlay, Overlay::Reverting { .. }));
        assert!(!coordinator.is_pending(EntityKind::RoomStatus, &id));
    }

    #[test]
    fn resolve_after_supersede_is_a_no_op() {
        let (mut store, mut coordinator, id) = seeded();
        let seq = coordinator
            .begin(
                &mut store,
                EntityKind::RoomStatus,
                &id,
                &Action::SetRoomStatus(RoomState::Clean),
                T1,
            )
            .unwrap();

        // A later push event supersedes the pending mutation.
        let report = store.apply_event(
            room("204", RoomState::Dnd),
            datetime!(2025-11-02 10:00:10 UTC),
        );
        assert!(report.superseded_pending);
        coordinator.forget_superseded(EntityKind::RoomStatus, std::slice::from_ref(&id));

        coordinator.resolve(&mut store, EntityKind::RoomStatus, &id, seq, None, T1);
        let stored = store.get(EntityKind::RoomStatus, &id).unwrap();
        assert_eq!(stored.record.status_str(), "DND");
        assert_eq!(stored.overlay, Overlay::Confirmed);
    }
}
