//! Shared test fixtures: a scripted `HotelApi` fake and record builders.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::macros::datetime;
use time::OffsetDateTime;

use concierge_api::{ApiError, HotelApi, PushMessage};
use concierge_core::{
    Action, AmenityRequestRecord, AmenityState, EntityId, EntityKind, LaundryRequestRecord,
    LaundryStage, MaintenanceTicketRecord, OrderStage, Priority, Record, RestaurantOrderRecord,
    RoomState, RoomStatusRecord, TicketState,
};
use concierge_sync::{Session, SyncConfig};

pub const CREATED: OffsetDateTime = datetime!(2025-11-02 08:00 UTC);

/// Install the log subscriber once per test binary; `RUST_LOG` controls
/// how much of the engine's consistency logging is shown.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh session with default cadences and logging installed.
pub fn session() -> Session {
    init_tracing();
    Session::new(SyncConfig::default())
}

// ── Record builders ──────────────────────────────────────────────────

pub fn room(number: &str, status: RoomState) -> Record {
    Record::RoomStatus(RoomStatusRecord {
        room_number: number.to_string(),
        status,
    })
}

pub fn laundry(id: i64, status: LaundryStage, total_price: Decimal) -> Record {
    Record::Laundry(LaundryRequestRecord {
        id,
        guest_id: 1,
        room_number: "112".to_string(),
        status,
        total_price,
        notes: String::new(),
        created_at: CREATED,
    })
}

pub fn order(id: i64, status: OrderStage) -> Record {
    Record::Order(RestaurantOrderRecord {
        id,
        guest_id: 1,
        room_number: "204".to_string(),
        notes: String::new(),
        status,
        total_price: Decimal::new(2400, 2),
        created_at: CREATED,
        items: Vec::new(),
    })
}

pub fn amenity(id: i64, status: AmenityState) -> Record {
    Record::Amenity(AmenityRequestRecord {
        id,
        guest_id: 1,
        room_number: "204".to_string(),
        item_name: "Towels".to_string(),
        quantity: 2,
        status,
        created_at: CREATED,
    })
}

pub fn ticket(id: i64, status: TicketState) -> Record {
    Record::Ticket(MaintenanceTicketRecord {
        id,
        room_number: "301".to_string(),
        issue_type: "AC".to_string(),
        description: "Broken AC".to_string(),
        priority: Priority::Normal,
        status,
        created_at: CREATED,
    })
}

// ── Scripted API fake ────────────────────────────────────────────────

/// A `HotelApi` whose lists are set by the test and whose mutation
/// results are scripted in order.
#[derive(Default)]
pub struct MockApi {
    lists: Mutex<BTreeMap<EntityKind, Vec<Record>>>,
    mutation_script: Mutex<VecDeque<Result<Option<Record>, ApiError>>>,
    push_script: Mutex<VecDeque<Result<PushMessage, ApiError>>>,
    fetch_counts: Mutex<BTreeMap<EntityKind, usize>>,
    mutate_calls: Mutex<Vec<(EntityKind, EntityId, Action)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server-side active list for a kind.
    pub fn set_list(&self, kind: EntityKind, records: Vec<Record>) {
        self.lists.lock().unwrap().insert(kind, records);
    }

    /// Queue the result of the next `mutate` call. Unscripted calls
    /// succeed with no returned record.
    pub fn script_mutation(&self, result: Result<Option<Record>, ApiError>) {
        self.mutation_script.lock().unwrap().push_back(result);
    }

    /// Queue the result of the next `recv_push` call. An empty script
    /// reports the channel closed.
    pub fn script_push(&self, result: Result<PushMessage, ApiError>) {
        self.push_script.lock().unwrap().push_back(result);
    }

    pub fn fetch_count(&self, kind: EntityKind) -> usize {
        self.fetch_counts.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn mutate_calls(&self) -> Vec<(EntityKind, EntityId, Action)> {
        self.mutate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HotelApi for MockApi {
    async fn fetch_list(&self, kind: EntityKind) -> Result<Vec<Record>, ApiError> {
        *self.fetch_counts.lock().unwrap().entry(kind).or_default() += 1;
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_one(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<Option<Record>, ApiError> {
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&kind)
            .and_then(|records| records.iter().find(|r| &r.entity_id() == id).cloned()))
    }

    async fn mutate(
        &self,
        kind: EntityKind,
        id: &EntityId,
        action: &Action,
    ) -> Result<Option<Record>, ApiError> {
        self.mutate_calls
            .lock()
            .unwrap()
            .push((kind, id.clone(), action.clone()));
        self.mutation_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn recv_push(&self) -> Result<PushMessage, ApiError> {
        self.push_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ApiError::ChannelClosed))
    }

    async fn reconnect_push(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
