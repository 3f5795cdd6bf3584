//! Typed records for the five workflow entity kinds.
//!
//! Records only ever arrive from the server; the engine never invents
//! identifiers. Field sets mirror the server's JSON shapes: rooms are keyed
//! by room number, everything else by a serial integer id. Monetary fields
//! are `rust_decimal::Decimal` -- recomputed server-side and overlaid, the
//! client only ever produces a provisional estimate.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ModelError;
use crate::status::{AmenityState, LaundryStage, OrderStage, Priority, RoomState, TicketState};

/// The five workflow entity kinds the engine synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    RoomStatus,
    LaundryRequest,
    RestaurantOrder,
    AmenityRequest,
    MaintenanceTicket,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::RoomStatus,
        EntityKind::LaundryRequest,
        EntityKind::RestaurantOrder,
        EntityKind::AmenityRequest,
        EntityKind::MaintenanceTicket,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::RoomStatus => "room_status",
            EntityKind::LaundryRequest => "laundry_request",
            EntityKind::RestaurantOrder => "restaurant_order",
            EntityKind::AmenityRequest => "amenity_request",
            EntityKind::MaintenanceTicket => "maintenance_ticket",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a record within its kind.
///
/// Rooms are keyed by room number; the `Ord` on the string gives the
/// lexicographic display order the housekeeping map expects. All other
/// kinds use ascending serial ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    Room(String),
    Serial(i64),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Room(number) => f.write_str(number),
            EntityId::Serial(id) => write!(f, "{}", id),
        }
    }
}

/// Live housekeeping status of one room. The room is a single mutable
/// slot, not a queue: concurrent writes collapse to the latest status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatusRecord {
    pub room_number: String,
    pub status: RoomState,
}

/// A guest laundry request moving through collection, washing, and delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaundryRequestRecord {
    pub id: i64,
    pub guest_id: i64,
    pub room_number: String,
    pub status: LaundryStage,
    pub total_price: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One billed line of a restaurant order, with the price snapshotted at
/// order time so later menu edits cannot change a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// A room-service order moving through the kitchen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantOrderRecord {
    pub id: i64,
    pub guest_id: i64,
    pub room_number: String,
    #[serde(default)]
    pub notes: String,
    pub status: OrderStage,
    pub total_price: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

/// An amenity request ("two more towels"). Binary lifecycle: delivery
/// removes it from the active set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityRequestRecord {
    pub id: i64,
    pub guest_id: i64,
    pub room_number: String,
    pub item_name: String,
    pub quantity: u32,
    pub status: AmenityState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A maintenance ticket ("broken AC"). Binary lifecycle: resolution
/// removes it from the active set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTicketRecord {
    pub id: i64,
    pub room_number: String,
    pub issue_type: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: TicketState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A workflow record of any kind. One variant per entity kind; the store
/// holds these uniformly while each view works with the typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    RoomStatus(RoomStatusRecord),
    Laundry(LaundryRequestRecord),
    Order(RestaurantOrderRecord),
    Amenity(AmenityRequestRecord),
    Ticket(MaintenanceTicketRecord),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::RoomStatus(_) => EntityKind::RoomStatus,
            Record::Laundry(_) => EntityKind::LaundryRequest,
            Record::Order(_) => EntityKind::RestaurantOrder,
            Record::Amenity(_) => EntityKind::AmenityRequest,
            Record::Ticket(_) => EntityKind::MaintenanceTicket,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        match self {
            Record::RoomStatus(r) => EntityId::Room(r.room_number.clone()),
            Record::Laundry(r) => EntityId::Serial(r.id),
            Record::Order(r) => EntityId::Serial(r.id),
            Record::Amenity(r) => EntityId::Serial(r.id),
            Record::Ticket(r) => EntityId::Serial(r.id),
        }
    }

    /// The wire string of the record's current status.
    pub fn status_str(&self) -> &'static str {
        match self {
            Record::RoomStatus(r) => r.status.as_str(),
            Record::Laundry(r) => r.status.as_str(),
            Record::Order(r) => r.status.as_str(),
            Record::Amenity(r) => r.status.as_str(),
            Record::Ticket(r) => r.status.as_str(),
        }
    }

    /// Server-side creation time. Room status is a slot, not an event, and
    /// carries none.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        match self {
            Record::RoomStatus(_) => None,
            Record::Laundry(r) => Some(r.created_at),
            Record::Order(r) => Some(r.created_at),
            Record::Amenity(r) => Some(r.created_at),
            Record::Ticket(r) => Some(r.created_at),
        }
    }

    /// Deserialize a record of a known kind from its server JSON shape.
    pub fn from_json(kind: EntityKind, value: serde_json::Value) -> Result<Record, ModelError> {
        let malformed = |e: serde_json::Error| ModelError::Malformed {
            kind,
            message: e.to_string(),
        };
        match kind {
            EntityKind::RoomStatus => serde_json::from_value(value)
                .map(Record::RoomStatus)
                .map_err(malformed),
            EntityKind::LaundryRequest => serde_json::from_value(value)
                .map(Record::Laundry)
                .map_err(malformed),
            EntityKind::RestaurantOrder => serde_json::from_value(value)
                .map(Record::Order)
                .map_err(malformed),
            EntityKind::AmenityRequest => serde_json::from_value(value)
                .map(Record::Amenity)
                .map_err(malformed),
            EntityKind::MaintenanceTicket => serde_json::from_value(value)
                .map(Record::Ticket)
                .map_err(malformed),
        }
    }
}
