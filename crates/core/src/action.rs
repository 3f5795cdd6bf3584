//! The mutation vocabulary views may request, and the pure computation of
//! the state a mutation is expected to produce.
//!
//! The coordinator never trusts a view to know the next status; it asks
//! [`expected_after`], which consults the same lifecycle definitions the
//! store enforces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::record::{EntityKind, Record};
use crate::status::{AmenityState, LaundryStage, RoomState, TicketState};

/// One billed laundry line: name and price snapshotted at processing time
/// so later price-list edits cannot change an in-flight request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BilledLine {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// A server-side transition a view may request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// Set a room's housekeeping status (guest request-cleaning / DND
    /// toggle, staff mark-clean).
    SetRoomStatus(RoomState),
    /// Move an ordered-lifecycle record to its next stage (kitchen board
    /// button, laundry console).
    Advance,
    /// Bill collected laundry items and start washing, in one coordinated
    /// action.
    ProcessLaundry { items: Vec<BilledLine> },
    /// Mark an amenity request delivered (terminal; removes it).
    Deliver,
    /// Resolve a maintenance ticket (terminal; removes it).
    Resolve,
}

impl Action {
    /// Short name for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetRoomStatus(_) => "set_room_status",
            Action::Advance => "advance",
            Action::ProcessLaundry { .. } => "process_laundry",
            Action::Deliver => "deliver",
            Action::Resolve => "resolve",
        }
    }
}

/// Compute the record this action is expected to produce, before the
/// server confirms it.
///
/// Monetary fields are a provisional client-side estimate only; the
/// server's recomputed value overlays them on the next authoritative read.
pub fn expected_after(record: &Record, action: &Action) -> Result<Record, ModelError> {
    let mismatch = |kind: EntityKind| ModelError::ActionMismatch {
        kind,
        action: action.name(),
    };

    match (record, action) {
        (Record::RoomStatus(room), Action::SetRoomStatus(status)) => {
            let mut next = room.clone();
            next.status = *status;
            Ok(Record::RoomStatus(next))
        }
        (Record::Laundry(laundry), Action::Advance) => {
            let stage = laundry.status.next().ok_or(ModelError::AlreadyTerminal {
                kind: EntityKind::LaundryRequest,
                id: laundry.id.to_string(),
                status: LaundryStage::Delivered.as_str(),
            })?;
            let mut next = laundry.clone();
            next.status = stage;
            Ok(Record::Laundry(next))
        }
        (Record::Laundry(laundry), Action::ProcessLaundry { items }) => {
            if laundry.status != LaundryStage::Collected {
                return Err(mismatch(EntityKind::LaundryRequest));
            }
            let mut next = laundry.clone();
            next.status = LaundryStage::Washing;
            // Provisional estimate; the server recomputes and overlays.
            next.total_price = items
                .iter()
                .map(|line| line.price * Decimal::from(line.quantity))
                .sum();
            Ok(Record::Laundry(next))
        }
        (Record::Order(order), Action::Advance) => {
            let stage = order.status.next().ok_or(ModelError::AlreadyTerminal {
                kind: EntityKind::RestaurantOrder,
                id: order.id.to_string(),
                status: "DELIVERED",
            })?;
            let mut next = order.clone();
            next.status = stage;
            Ok(Record::Order(next))
        }
        (Record::Amenity(amenity), Action::Deliver) => {
            let mut next = amenity.clone();
            next.status = AmenityState::Delivered;
            Ok(Record::Amenity(next))
        }
        (Record::Ticket(ticket), Action::Resolve) => {
            let mut next = ticket.clone();
            next.status = TicketState::Resolved;
            Ok(Record::Ticket(next))
        }
        (record, _) => Err(mismatch(record.kind())),
    }
}
