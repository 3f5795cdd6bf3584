//! Workflow state machine predicates.
//!
//! Pure functions over wire status strings. The string-level API exists
//! because statuses arrive from the boundary as text with no ordering
//! guarantee: an unrecognized status is reported as *illegal*, never a
//! panic, and the caller decides whether that means "drop the event" or
//! "reject the payload".
//!
//! Edge sets:
//!
//! - **Room status** is cyclic with no terminal state -- every edge between
//!   the four states is legal, the slot simply collapses to the latest
//!   known status. This preserves the guest toggle behavior (tapping the
//!   active DND toggle reverts straight to CLEAN).
//! - **Ordered lifecycles** (laundry, restaurant order) admit any forward
//!   move, including stage skips: the push channel may drop intermediate
//!   transitions and a skipped stage must not wedge the record. Backward
//!   edges are always illegal.
//! - **Binary lifecycles** (amenity request, maintenance ticket) have the
//!   single edge into their terminal state.
//!
//! Re-applying the current status (`from == to`) is legal everywhere:
//! duplicate push delivery is expected and must be a no-op.

use std::str::FromStr;

use crate::record::EntityKind;
use crate::status::{AmenityState, LaundryStage, OrderStage, RoomState, TicketState};

/// Is the edge `from -> to` in the kind's transition set?
///
/// Unknown status strings make the edge illegal rather than erroring; the
/// ingestion pipeline treats that as a data problem, not a crash.
pub fn legal_transition(kind: EntityKind, from: &str, to: &str) -> bool {
    match kind {
        // Every room-state pair is legal; the slot holds the latest status.
        EntityKind::RoomStatus => {
            RoomState::from_str(from).is_ok() && RoomState::from_str(to).is_ok()
        }
        EntityKind::LaundryRequest => {
            matches!(
                (LaundryStage::from_str(from), LaundryStage::from_str(to)),
                (Ok(f), Ok(t)) if f <= t
            )
        }
        EntityKind::RestaurantOrder => {
            matches!(
                (OrderStage::from_str(from), OrderStage::from_str(to)),
                (Ok(f), Ok(t)) if f <= t
            )
        }
        EntityKind::AmenityRequest => {
            matches!(
                (AmenityState::from_str(from), AmenityState::from_str(to)),
                (Ok(f), Ok(t)) if f <= t
            )
        }
        EntityKind::MaintenanceTicket => {
            matches!(
                (TicketState::from_str(from), TicketState::from_str(to)),
                (Ok(f), Ok(t)) if f <= t
            )
        }
    }
}

/// Is `status` a terminal state for the kind? Room status has none.
pub fn is_terminal(kind: EntityKind, status: &str) -> bool {
    match kind {
        EntityKind::RoomStatus => false,
        EntityKind::LaundryRequest => status == LaundryStage::Delivered.as_str(),
        EntityKind::RestaurantOrder => status == OrderStage::Delivered.as_str(),
        EntityKind::AmenityRequest => status == AmenityState::Delivered.as_str(),
        EntityKind::MaintenanceTicket => status == TicketState::Resolved.as_str(),
    }
}

/// Does reaching `status` remove the record from the active set?
///
/// True only for the binary-lifecycle kinds: "delivered" / "resolved"
/// literally means "absent from subsequent reads". Ordered kinds keep
/// their delivered records until the next snapshot replaces the set, so a
/// view can still show the tail of the lifecycle.
pub fn removes_from_active_set(kind: EntityKind, status: &str) -> bool {
    match kind {
        EntityKind::AmenityRequest | EntityKind::MaintenanceTicket => is_terminal(kind, status),
        EntityKind::RoomStatus | EntityKind::LaundryRequest | EntityKind::RestaurantOrder => false,
    }
}

/// The statuses reachable from `from` in one transition, excluding the
/// self edge. Empty for a terminal or unrecognized status.
pub fn successors(kind: EntityKind, from: &str) -> Vec<&'static str> {
    fn forward<T: Copy + Ord>(all: &[T], from: T, as_str: impl Fn(T) -> &'static str) -> Vec<&'static str> {
        all.iter()
            .copied()
            .filter(|s| *s > from)
            .map(as_str)
            .collect()
    }

    match kind {
        EntityKind::RoomStatus => match RoomState::from_str(from) {
            Ok(state) => RoomState::ALL
                .iter()
                .copied()
                .filter(|s| *s != state)
                .map(RoomState::as_str)
                .collect(),
            Err(()) => Vec::new(),
        },
        EntityKind::LaundryRequest => match LaundryStage::from_str(from) {
            Ok(stage) => forward(LaundryStage::ALL, stage, LaundryStage::as_str),
            Err(()) => Vec::new(),
        },
        EntityKind::RestaurantOrder => match OrderStage::from_str(from) {
            Ok(stage) => forward(OrderStage::ALL, stage, OrderStage::as_str),
            Err(()) => Vec::new(),
        },
        EntityKind::AmenityRequest => match AmenityState::from_str(from) {
            Ok(state) => forward(AmenityState::ALL, state, AmenityState::as_str),
            Err(()) => Vec::new(),
        },
        EntityKind::MaintenanceTicket => match TicketState::from_str(from) {
            Ok(state) => forward(TicketState::ALL, state, TicketState::as_str),
            Err(()) => Vec::new(),
        },
    }
}
