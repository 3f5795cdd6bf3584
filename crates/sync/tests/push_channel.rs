//! Push-channel behavior: announce-and-refetch, debounce, malformed
//! message isolation, and post-reconnect resynchronization.

mod common;

use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use time::macros::datetime;

use common::MockApi;
use concierge_api::{
    HotelApi, PushMessage, MSG_NEW_TASK, MSG_NEW_TICKET, MSG_ROOM_UPDATE,
};
use concierge_core::{AmenityState, EntityKind, RoomState, TicketState};
use concierge_sync::{driver, ChannelState};

fn new_ticket_message() -> PushMessage {
    PushMessage::new(MSG_NEW_TICKET, json!({"id": 11, "room_number": "301"}))
}

#[tokio::test]
async fn duplicate_announcements_collapse_to_one_refetch() {
    let session = common::session();
    let api = MockApi::new();
    api.set_list(
        EntityKind::MaintenanceTicket,
        vec![common::ticket(11, TicketState::Open)],
    );

    // The server broadcasts NEW_TICKET to every session; two arrive within
    // the debounce window.
    let t0 = datetime!(2025-11-02 09:00 UTC);
    let first = session.ingest_push_at(&new_ticket_message(), t0);
    let second = session.ingest_push_at(&new_ticket_message(), t0 + time::Duration::milliseconds(200));
    assert_eq!(first, vec![EntityKind::MaintenanceTicket]);
    assert!(second.is_empty());

    // The driver performs one fetch for the one announcement.
    for kind in first {
        let records = api.fetch_list(kind).await.unwrap();
        session.apply_poll(kind, records, t0);
    }
    assert_eq!(api.fetch_count(EntityKind::MaintenanceTicket), 1);
    assert_eq!(session.query(EntityKind::MaintenanceTicket, |_| true).len(), 1);

    // Past the window the announcement goes through again.
    let third = session.ingest_push_at(
        &new_ticket_message(),
        t0 + time::Duration::milliseconds(1500),
    );
    assert_eq!(third, vec![EntityKind::MaintenanceTicket]);
}

#[tokio::test]
async fn new_task_announces_the_amenity_list() {
    let session = common::session();
    let msg = PushMessage::new(MSG_NEW_TASK, json!({"id": 3, "item_name": "Towels"}));
    let refetch = session.ingest_push_at(&msg, datetime!(2025-11-02 09:00 UTC));
    assert_eq!(refetch, vec![EntityKind::AmenityRequest]);
}

#[tokio::test]
async fn unknown_message_type_is_ignored() {
    let session = common::session();
    session.apply_poll(
        EntityKind::RoomStatus,
        vec![common::room("204", RoomState::Dirty)],
        datetime!(2025-11-02 09:00 UTC),
    );

    let msg = PushMessage::new("SPA_BOOKING", json!({"id": 9}));
    let refetch = session.ingest_push_at(&msg, datetime!(2025-11-02 09:01 UTC));
    assert!(refetch.is_empty());
    assert_eq!(session.query(EntityKind::RoomStatus, |_| true).len(), 1);
}

#[tokio::test]
async fn malformed_payload_does_not_poison_the_stream() {
    let session = common::session();
    session.apply_poll(
        EntityKind::RoomStatus,
        vec![common::room("204", RoomState::Dirty)],
        datetime!(2025-11-02 09:00 UTC),
    );

    // Missing status field: dropped, not fatal.
    let bad = PushMessage::new(MSG_ROOM_UPDATE, json!({"room_number": "204"}));
    session.ingest_push_at(&bad, datetime!(2025-11-02 09:01 UTC));
    let rooms = session.query(EntityKind::RoomStatus, |_| true);
    assert_eq!(rooms[0].status_str(), "DIRTY");

    // The next well-formed message still applies.
    let good = PushMessage::new(
        MSG_ROOM_UPDATE,
        json!({"room_number": "204", "status": "REQUESTED_CLEANING"}),
    );
    session.ingest_push_at(&good, datetime!(2025-11-02 09:02 UTC));
    let rooms = session.query(EntityKind::RoomStatus, |_| true);
    assert_eq!(rooms[0].status_str(), "REQUESTED_CLEANING");
}

#[tokio::test(start_paused = true)]
async fn stale_channel_accelerates_polling() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let session = common::session();
            let api = Rc::new(MockApi::new());
            session.mark_stale();
            tokio::task::spawn_local(driver::poll_loop(
                session.clone(),
                Rc::clone(&api),
                EntityKind::RoomStatus,
            ));

            // Accelerated cadence is 3s: three polls in ten virtual
            // seconds instead of the regular one.
            tokio::time::sleep(Duration::from_secs(10)).await;
            assert_eq!(api.fetch_count(EntityKind::RoomStatus), 3);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_channel_polls_at_the_regular_cadence() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let session = common::session();
            let api = Rc::new(MockApi::new());
            tokio::task::spawn_local(driver::poll_loop(
                session.clone(),
                Rc::clone(&api),
                EntityKind::RoomStatus,
            ));

            // Regular cadence is 10s: polls land at 10s and 20s.
            tokio::time::sleep(Duration::from_secs(25)).await;
            assert_eq!(api.fetch_count(EntityKind::RoomStatus), 2);
        })
        .await;
}

#[tokio::test]
async fn resync_after_reconnect_catches_missed_transitions() {
    let session = common::session();
    let api = MockApi::new();
    api.set_list(
        EntityKind::RoomStatus,
        vec![common::room("204", RoomState::Dirty)],
    );
    driver::resync(&session, &api).await;
    assert_eq!(
        session.query(EntityKind::RoomStatus, |_| true)[0].status_str(),
        "DIRTY"
    );

    // Channel drops; the server state moves on while we are blind.
    session.mark_stale();
    assert_eq!(session.channel_state(), ChannelState::Stale);
    api.set_list(
        EntityKind::RoomStatus,
        vec![common::room("204", RoomState::Clean)],
    );
    api.set_list(
        EntityKind::AmenityRequest,
        vec![common::amenity(3, AmenityState::Pending)],
    );

    // Reconnect: no replay, so the driver re-fetches every kind.
    session.mark_live();
    driver::resync(&session, &api).await;
    assert_eq!(session.channel_state(), ChannelState::Live);
    assert_eq!(
        session.query(EntityKind::RoomStatus, |_| true)[0].status_str(),
        "CLEAN"
    );
    assert_eq!(session.query(EntityKind::AmenityRequest, |_| true).len(), 1);
}
