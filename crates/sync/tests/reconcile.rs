//! Reconciliation properties: idempotence, transition legality, and the
//! optimistic precedence rule, exercised on the store directly.

mod common;

use rust_decimal::Decimal;
use time::macros::datetime;
use time::OffsetDateTime;

use concierge_core::{Action, AmenityState, EntityId, EntityKind, LaundryStage, Record};
use concierge_sync::{ApplyOutcome, MutationCoordinator, Overlay, ReconciledStore};

const T0: OffsetDateTime = datetime!(2025-11-02 10:00 UTC);
const T1: OffsetDateTime = datetime!(2025-11-02 10:01 UTC);
const T2: OffsetDateTime = datetime!(2025-11-02 10:02 UTC);

#[test]
fn reapplying_the_same_event_changes_nothing() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    let record = common::laundry(7, LaundryStage::Washing, Decimal::new(1900, 2));

    store.apply_event(record.clone(), T0);
    let before = store.query(EntityKind::LaundryRequest, |_| true);

    let report = store.apply_event(record, T1);
    assert_eq!(report.outcome, ApplyOutcome::Unchanged);
    assert_eq!(store.query(EntityKind::LaundryRequest, |_| true), before);
}

#[test]
fn backward_stage_event_is_dropped() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    store.apply_event(common::laundry(7, LaundryStage::Ready, Decimal::ZERO), T0);

    // Out-of-order delivery: WASHING arrives after READY.
    let report = store.apply_event(common::laundry(7, LaundryStage::Washing, Decimal::ZERO), T1);
    assert_eq!(report.outcome, ApplyOutcome::DroppedIllegal);

    let held = store.query(EntityKind::LaundryRequest, |_| true);
    assert_eq!(held[0].status_str(), "READY");
}

#[test]
fn forward_jump_skipping_stages_is_accepted() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    store.apply_event(common::laundry(7, LaundryStage::Pending, Decimal::ZERO), T0);

    // Missed intermediate pushes: PENDING straight to READY.
    let report = store.apply_event(common::laundry(7, LaundryStage::Ready, Decimal::ZERO), T1);
    assert_eq!(report.outcome, ApplyOutcome::Updated);
}

#[test]
fn stale_snapshot_skips_only_the_pending_identifier() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    store.apply_snapshot(
        EntityKind::AmenityRequest,
        vec![
            common::amenity(3, AmenityState::Pending),
            common::amenity(4, AmenityState::Pending),
        ],
        T0,
    );

    // Optimistic delivery of request 3, issued after the snapshot below
    // was taken.
    let mut coordinator = MutationCoordinator::new();
    begin_deliver(&mut coordinator, &mut store, 3, T2);

    // A slow poll response from before the mutation: it must not resurrect
    // request 3, but its data for request 4 still applies.
    let report = store.apply_snapshot(
        EntityKind::AmenityRequest,
        vec![
            common::amenity(3, AmenityState::Pending),
            common::amenity(5, AmenityState::Pending),
        ],
        T1,
    );
    assert!(report.superseded.is_empty());

    let active = store.query(EntityKind::AmenityRequest, |_| true);
    let ids: Vec<EntityId> = active.iter().map(Record::entity_id).collect();
    assert_eq!(ids, vec![EntityId::Serial(5)]);
    // 3 is still tracked (hidden, pending); 4 was dropped by the snapshot.
    assert!(matches!(
        store.overlay(EntityKind::AmenityRequest, &EntityId::Serial(3)),
        Some(Overlay::Pending { .. })
    ));
}

#[test]
fn fresh_snapshot_supersedes_the_pending_mutation() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    store.apply_snapshot(
        EntityKind::AmenityRequest,
        vec![common::amenity(3, AmenityState::Pending)],
        T0,
    );
    let mut coordinator = MutationCoordinator::new();
    begin_deliver(&mut coordinator, &mut store, 3, T1);

    // The server already processed the delivery: the fresh snapshot no
    // longer lists request 3.
    let report = store.apply_snapshot(EntityKind::AmenityRequest, Vec::new(), T2);
    assert_eq!(report.superseded, vec![EntityId::Serial(3)]);
    assert!(store.is_empty(EntityKind::AmenityRequest));
}

#[test]
fn snapshot_overwrites_without_legality_checks() {
    common::init_tracing();
    let mut store = ReconciledStore::new();
    store.apply_event(common::laundry(7, LaundryStage::Delivered, Decimal::ZERO), T0);

    // Backward as a single event, but snapshots are authoritative.
    store.apply_snapshot(
        EntityKind::LaundryRequest,
        vec![common::laundry(7, LaundryStage::Collected, Decimal::ZERO)],
        T1,
    );
    let held = store.query(EntityKind::LaundryRequest, |_| true);
    assert_eq!(held[0].status_str(), "COLLECTED");
}

// Installs the speculative DELIVERED record for an amenity request.
fn begin_deliver(
    coordinator: &mut MutationCoordinator,
    store: &mut ReconciledStore,
    id: i64,
    at: OffsetDateTime,
) -> u64 {
    coordinator
        .begin(
            store,
            EntityKind::AmenityRequest,
            &EntityId::Serial(id),
            &Action::Deliver,
            at,
        )
        .unwrap()
}
