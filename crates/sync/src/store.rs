//! The reconciled store: single source of truth per entity kind.
//!
//! A mapping from identifier to current record, merged from snapshots,
//! push events, and optimistic local mutations. Every merge happens
//! synchronously inside one call, so readers never observe a
//! partially-updated record.
//!
//! ## Precedence
//!
//! A record carrying a `Pending` overlay (an optimistic mutation awaiting
//! server confirmation) is only overwritten by authoritative data whose
//! timestamp is *after* the mutation's issue time. Older data is treated
//! as stale **for that one identifier** while still applying to every
//! other identifier in the same snapshot. This keeps a slow poll response
//! from clobbering a faster optimistic or push update.
//!
//! ## Legality
//!
//! Single-record events are checked against the kind's transition set and
//! dropped (with a consistency warning) when illegal -- out-of-order
//! delivery is expected from a push channel with no ordering guarantee.
//! Snapshots are *not* checked: the poll is the resync escape hatch and
//! must be able to replace any local state.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use tracing::{debug, warn};

use concierge_core::{legal_transition, removes_from_active_set, EntityId, EntityKind, Record};

/// Per-identifier optimistic overlay state.
///
/// Modeled explicitly (not as ad hoc flags) so tests can assert overlay
/// state independently of the record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// The record matches the last authoritative data.
    Confirmed,
    /// The record is a speculative local mutation awaiting confirmation.
    Pending {
        seq: u64,
        issued_at: OffsetDateTime,
    },
    /// A failed mutation was rolled back to the last-known-good record;
    /// cleared by the next authoritative data for the identifier.
    Reverting { since: OffsetDateTime },
}

/// One stored record plus its reconciliation metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: Record,
    pub overlay: Overlay,
    /// When the engine last merged data for this identifier.
    pub seen_at: OffsetDateTime,
}

/// Outcome of applying a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Updated,
    /// The event re-stated what the store already held (duplicate push).
    Unchanged,
    /// The event carried a terminal status that removes the identifier
    /// from the active set.
    Removed,
    /// The proposed status edge is not in the kind's transition set.
    DroppedIllegal,
    /// The event predates a pending mutation for the identifier.
    DroppedStale,
}

/// Report from [`ReconciledStore::apply_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub outcome: ApplyOutcome,
    /// A pending mutation for this identifier was superseded by the event
    /// (the coordinator should forget it).
    pub superseded_pending: bool,
}

/// Report from [`ReconciledStore::apply_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Whether any record changed, appeared, or disappeared.
    pub changed: bool,
    /// Identifiers whose pending mutation was superseded by the snapshot.
    pub superseded: Vec<EntityId>,
}

/// In-memory, per-entity-kind collection merging server snapshots, push
/// events, and optimistic mutations into one authoritative view.
///
/// Only the coordinator and the pipeline write here; views are read-only
/// consumers via [`query`](Self::query) and the fan-out.
#[derive(Debug, Default)]
pub struct ReconciledStore {
    slots: BTreeMap<EntityKind, BTreeMap<EntityId, StoredRecord>>,
}

impl ReconciledStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire active set for `kind` with `records`.
    ///
    /// Identifiers absent from the snapshot are removed, except those with
    /// a pending mutation issued after `taken_at` (stale-for-that-id rule).
    /// No transition legality is enforced: the snapshot is authoritative.
    pub fn apply_snapshot(
        &mut self,
        kind: EntityKind,
        records: Vec<Record>,
        taken_at: OffsetDateTime,
    ) -> SnapshotReport {
        let old = self.slots.remove(&kind).unwrap_or_default();
        let mut next: BTreeMap<EntityId, StoredRecord> = BTreeMap::new();
        let mut superseded = Vec::new();
        let mut changed = false;

        for record in records {
            debug_assert_eq!(record.kind(), kind);
            let id = record.entity_id();
            // Binary-kind terminal records never enter the active set.
            if removes_from_active_set(kind, record.status_str()) {
                continue;
            }
            match old.get(&id) {
                Some(existing) => match existing.overlay {
                    Overlay::Pending { issued_at, .. } if taken_at <= issued_at => {
                        // Stale for this identifier: the speculative state
                        // is newer than the snapshot. Keep it untouched.
                        next.insert(id, existing.clone());
                    }
                    overlay => {
                        if matches!(overlay, Overlay::Pending { .. }) {
                            superseded.push(id.clone());
                        }
                        if existing.record != record {
                            changed = true;
                        } else if existing.overlay != Overlay::Confirmed {
                            changed = true;
                        }
                        next.insert(
                            id,
                            StoredRecord {
                                record,
                                overlay: Overlay::Confirmed,
                                seen_at: taken_at,
                            },
                        );
                    }
                },
                None => {
                    changed = true;
                    next.insert(
                        id,
                        StoredRecord {
                            record,
                            overlay: Overlay::Confirmed,
                            seen_at: taken_at,
                        },
                    );
                }
            }
        }

        // Identifiers the snapshot no longer carries.
        for (id, existing) in old {
            if next.contains_key(&id) {
                continue;
            }
            match existing.overlay {
                Overlay::Pending { issued_at, .. } if taken_at <= issued_at => {
                    // Pending and not yet superseded: retain.
                    next.insert(id, existing);
                }
                Overlay::Pending { .. } => {
                    // The server says this identifier is gone, and the
                    // snapshot postdates the mutation.
                    superseded.push(id.clone());
                    changed = true;
                    debug!(kind = %kind, id = %id, "snapshot removed record with pending mutation");
                }
                _ => {
                    changed = true;
                }
            }
        }

        self.slots.insert(kind, next);
        SnapshotReport { changed, superseded }
    }

    /// Merge a single-record event (push update or confirmed mutation
    /// result).
    pub fn apply_event(&mut self, record: Record, observed_at: OffsetDateTime) -> ApplyReport {
        let kind = record.kind();
        let id = record.entity_id();
        let slot = self.slots.entry(kind).or_default();

        let Some(existing) = slot.get(&id) else {
            if removes_from_active_set(kind, record.status_str()) {
                // Terminal event for an identifier we never held.
                return ApplyReport {
                    outcome: ApplyOutcome::Unchanged,
                    superseded_pending: false,
                };
            }
            slot.insert(
                id,
                StoredRecord {
                    record,
                    overlay: Overlay::Confirmed,
                    seen_at: observed_at,
                },
            );
            return ApplyReport {
                outcome: ApplyOutcome::Inserted,
                superseded_pending: false,
            };
        };
        let existing_overlay = existing.overlay;
        let existing_record = existing.record.clone();

        // Precedence: an event older than a pending mutation is stale for
        // this identifier.
        if let Overlay::Pending { issued_at, .. } = existing_overlay {
            if observed_at <= issued_at {
                debug!(
                    kind = %kind,
                    id = %id,
                    "event predates pending mutation, ignored for this identifier"
                );
                return ApplyReport {
                    outcome: ApplyOutcome::DroppedStale,
                    superseded_pending: false,
                };
            }
        }
        let superseded_pending = matches!(existing_overlay, Overlay::Pending { .. });

        let from = existing_record.status_str();
        let to = record.status_str();
        if !legal_transition(kind, from, to) {
            // Out-of-order delivery, not corruption: drop and move on.
            warn!(
                kind = %kind,
                id = %id,
                from,
                to,
                "dropped event proposing illegal transition"
            );
            return ApplyReport {
                outcome: ApplyOutcome::DroppedIllegal,
                superseded_pending: false,
            };
        }

        if removes_from_active_set(kind, to) {
            slot.remove(&id);
            debug!(kind = %kind, id = %id, status = to, "terminal event removed record");
            return ApplyReport {
                outcome: ApplyOutcome::Removed,
                superseded_pending,
            };
        }

        let unchanged = existing_record == record && existing_overlay == Overlay::Confirmed;
        slot.insert(
            id,
            StoredRecord {
                record,
                overlay: Overlay::Confirmed,
                seen_at: observed_at,
            },
        );
        ApplyReport {
            outcome: if unchanged {
                ApplyOutcome::Unchanged
            } else {
                ApplyOutcome::Updated
            },
            superseded_pending,
        }
    }

    /// Remove one identifier from the active set (explicit removal event).
    pub fn remove(&mut self, kind: EntityKind, id: &EntityId) -> bool {
        self.slots
            .get_mut(&kind)
            .is_some_and(|slot| slot.remove(id).is_some())
    }

    /// The current active set for `kind`, filtered by `predicate`, in
    /// identifier order (room numbers lexicographic, serial ids
    /// ascending).
    ///
    /// Records sitting on a status that removes them from the active set
    /// (a speculative "delivered"/"resolved" awaiting confirmation) are
    /// already invisible here.
    pub fn query(&self, kind: EntityKind, predicate: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.slots
            .get(&kind)
            .into_iter()
            .flat_map(|slot| slot.values())
            .filter(|stored| !removes_from_active_set(kind, stored.record.status_str()))
            .filter(|stored| predicate(&stored.record))
            .map(|stored| stored.record.clone())
            .collect()
    }

    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<&StoredRecord> {
        self.slots.get(&kind)?.get(id)
    }

    /// The overlay state for one identifier, if it is in the active set.
    pub fn overlay(&self, kind: EntityKind, id: &EntityId) -> Option<Overlay> {
        self.get(kind, id).map(|stored| stored.overlay)
    }

    /// Number of active records for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.slots.get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    // ── Coordinator hooks ────────────────────────────────────────────

    /// Install a speculative record with a `Pending` overlay, returning
    /// the prior record for the coordinator's revert stash.
    pub(crate) fn begin_pending(
        &mut self,
        speculative: Record,
        seq: u64,
        issued_at: OffsetDateTime,
    ) -> Option<Record> {
        let kind = speculative.kind();
        let id = speculative.entity_id();
        let slot = self.slots.entry(kind).or_default();
        let prior = slot.get(&id).map(|stored| stored.record.clone());
        // A speculative terminal transition stays in the map (so the
        // precedence rule still protects it from stale snapshots) but is
        // hidden from queries by its removing status.
        slot.insert(
            id,
            StoredRecord {
                record: speculative,
                overlay: Overlay::Pending { seq, issued_at },
                seen_at: issued_at,
            },
        );
        prior
    }

    /// Confirm a pending mutation. With a server record, that record
    /// supersedes the speculative one immediately; without one, the
    /// speculative record simply becomes confirmed (the next poll or push
    /// will overlay the true server state).
    pub(crate) fn confirm(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        server_record: Option<Record>,
        at: OffsetDateTime,
    ) {
        let slot = self.slots.entry(kind).or_default();
        match server_record {
            Some(record) => {
                if removes_from_active_set(kind, record.status_str()) {
                    slot.remove(id);
                } else {
                    slot.insert(
                        record.entity_id(),
                        StoredRecord {
                            record,
                            overlay: Overlay::Confirmed,
                            seen_at: at,
                        },
                    );
                }
            }
            None => {
                let confirmed_terminal = match slot.get(id) {
                    Some(stored) if matches!(stored.overlay, Overlay::Pending { .. }) => {
                        removes_from_active_set(kind, stored.record.status_str())
                    }
                    _ => return,
                };
                if confirmed_terminal {
                    // Confirmed terminal: drop the hidden record.
                    slot.remove(id);
                } else if let Some(stored) = slot.get_mut(id) {
                    stored.overlay = Overlay::Confirmed;
                    stored.seen_at = at;
                }
            }
        }
    }

    /// Roll back a failed mutation to the stashed prior record. The
    /// overlay is left `Reverting` until the next authoritative data for
    /// the identifier confirms it.
    pub(crate) fn revert(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        prior: Option<Record>,
        at: OffsetDateTime,
    ) {
        let slot = self.slots.entry(kind).or_default();
        match prior {
            Some(record) => {
                slot.insert(
                    id.clone(),
                    StoredRecord {
                        record,
                        overlay: Overlay::Reverting { since: at },
                        seen_at: at,
                    },
                );
            }
            None => {
                slot.remove(id);
            }
        }
    }
}
