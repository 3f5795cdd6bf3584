//! concierge-core: entity model and workflow state machines.
//!
//! Pure definitions shared by every component of the sync engine: the five
//! workflow entity kinds, their typed records, their status enumerations,
//! and the transition predicates that decide which status edges are legal.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`EntityKind`] / [`EntityId`] -- kind and identifier of a workflow record
//! - [`Record`] -- the per-kind typed record, one variant per entity kind
//! - [`Action`] -- the mutation vocabulary views may request
//! - [`legal_transition`] / [`is_terminal`] / [`removes_from_active_set`] --
//!   the state machine predicates
//!
//! Nothing in this crate performs I/O or suspends; everything is data and
//! pure functions over data.

pub mod action;
pub mod error;
pub mod machine;
pub mod record;
pub mod status;

// ── Convenience re-exports: key types ────────────────────────────────

pub use action::{expected_after, Action, BilledLine};
pub use error::ModelError;
pub use machine::{is_terminal, legal_transition, removes_from_active_set, successors};
pub use record::{
    AmenityRequestRecord, EntityId, EntityKind, LaundryRequestRecord, MaintenanceTicketRecord,
    OrderLine, Record, RestaurantOrderRecord, RoomStatusRecord,
};
pub use status::{AmenityState, LaundryStage, OrderStage, Priority, RoomState, TicketState};
