//! concierge-sync: the live operational state synchronization engine.
//!
//! Keeps every view of a hotel session (housekeeping map, kitchen board,
//! laundry console, guest pages) consistent with server-side truth for
//! short-lived workflow records, merging three producers into one
//! authoritative per-identifier state:
//!
//! 1. full snapshots obtained by polling (`fetch_list`),
//! 2. incremental push messages from the WebSocket channel,
//! 3. optimistic local mutations awaiting server confirmation.
//!
//! # Architecture
//!
//! - [`store::ReconciledStore`] -- the single source of truth per entity
//!   kind; all merges are atomic per call.
//! - [`pipeline::IngestPipeline`] -- normalizes the heterogeneous inputs
//!   into one [`event::SyncEvent`] stream, drained in deterministic order.
//! - [`coordinator::MutationCoordinator`] -- the optimistic-update
//!   protocol: speculative apply, pending tracking, supersede/revert.
//! - [`fanout::Fanout`] -- per-view change notification with
//!   value-equality suppression.
//! - [`session::Session`] -- the explicit per-session context object that
//!   wires the above together; one instance per browser/staff session,
//!   never a process-wide singleton.
//! - [`driver`] -- async poll and push-receive loops over the
//!   [`concierge_api::HotelApi`] boundary.
//!
//! The engine is single-threaded cooperative: suspension happens only at
//! the boundary calls, never mid-merge, so the store needs no locking
//! within a session.

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod event;
pub mod fanout;
pub mod pipeline;
pub mod session;
pub mod store;

// ── Convenience re-exports: key types ────────────────────────────────

pub use config::SyncConfig;
pub use coordinator::MutationCoordinator;
pub use error::SyncError;
pub use event::SyncEvent;
pub use fanout::SubscriptionGuard;
pub use pipeline::{ChannelState, IngestOutcome, IngestPipeline};
pub use session::Session;
pub use store::{ApplyOutcome, ApplyReport, Overlay, ReconciledStore, SnapshotReport, StoredRecord};
