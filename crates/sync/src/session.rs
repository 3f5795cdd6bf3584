//! The per-session context object.
//!
//! One [`Session`] per browser/staff session wires the store, the
//! coordinator, the pipeline, and the fan-out together. It is an explicit
//! value handed to every view at construction -- never a process-wide
//! singleton -- so multiple independent sessions (and tests) coexist
//! without interference. Consistency *across* sessions is achieved only
//! through the server.
//!
//! All state lives behind a single-threaded `Rc<RefCell<...>>`; the
//! engine never suspends while the cell is borrowed, so views always
//! observe a fully-merged state.

use std::cell::RefCell;
use std::rc::Rc;

use time::OffsetDateTime;

use concierge_api::{ApiError, HotelApi, PushMessage};
use concierge_core::{Action, EntityId, EntityKind, Record};

use crate::config::SyncConfig;
use crate::coordinator::MutationCoordinator;
use crate::error::SyncError;
use crate::event::SyncEvent;
use crate::fanout::{Fanout, SubscriptionGuard};
use crate::pipeline::{ChannelState, IngestOutcome, IngestPipeline};
use crate::store::{Overlay, ReconciledStore};

struct Inner {
    store: ReconciledStore,
    coordinator: MutationCoordinator,
    pipeline: IngestPipeline,
}

/// Handle to one session's sync engine. Cheap to clone; clones share the
/// same underlying state.
#[derive(Clone)]
pub struct Session {
    inner: Rc<RefCell<Inner>>,
    fanout: Rc<Fanout>,
    config: Rc<SyncConfig>,
}

impl Session {
    pub fn new(config: SyncConfig) -> Self {
        let pipeline = IngestPipeline::new(config.refetch_debounce());
        Session {
            inner: Rc::new(RefCell::new(Inner {
                store: ReconciledStore::new(),
                coordinator: MutationCoordinator::new(),
                pipeline,
            })),
            fanout: Rc::new(Fanout::new()),
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // ── Ingestion ────────────────────────────────────────────────────

    /// Initial bulk load: fetch and apply a fresh snapshot of every kind.
    /// Unlike the background drivers, a failure here is surfaced; the
    /// caller decides whether to retry or abandon the session.
    pub async fn bootstrap<A: HotelApi>(&self, api: &A) -> Result<(), ApiError> {
        for kind in EntityKind::ALL {
            let records = api.fetch_list(kind).await?;
            self.apply_poll(kind, records, OffsetDateTime::now_utc());
        }
        Ok(())
    }

    /// Feed one push message in. Returns the kinds that need a list
    /// re-fetch (the caller owns the boundary, so it performs the fetch
    /// and hands the result to [`apply_poll`](Self::apply_poll)).
    pub fn ingest_push(&self, message: &PushMessage) -> Vec<EntityKind> {
        self.ingest_push_at(message, OffsetDateTime::now_utc())
    }

    /// [`ingest_push`](Self::ingest_push) with an explicit arrival time.
    pub fn ingest_push_at(&self, message: &PushMessage, now: OffsetDateTime) -> Vec<EntityKind> {
        let outcome = self.inner.borrow_mut().pipeline.push_message(message, now);
        match outcome {
            IngestOutcome::Enqueued => self.pump(),
            _ => Vec::new(),
        }
    }

    /// Feed a full snapshot in (initial bulk load or poll refresh).
    pub fn apply_poll(&self, kind: EntityKind, records: Vec<Record>, taken_at: OffsetDateTime) {
        self.inner
            .borrow_mut()
            .pipeline
            .poll_result(kind, records, taken_at);
        self.pump();
    }

    /// Drain the pipeline queue into the store, in order, and notify
    /// subscribers once afterwards. Returns kinds needing a re-fetch.
    fn pump(&self) -> Vec<EntityKind> {
        let mut refetch = Vec::new();
        {
            let inner = &mut *self.inner.borrow_mut();
            for event in inner.pipeline.drain() {
                match event {
                    SyncEvent::Snapshot {
                        kind,
                        records,
                        taken_at,
                    } => {
                        let report = inner.store.apply_snapshot(kind, records, taken_at);
                        inner
                            .coordinator
                            .forget_superseded(kind, &report.superseded);
                    }
                    SyncEvent::Update {
                        record,
                        observed_at,
                    } => {
                        let kind = record.kind();
                        let id = record.entity_id();
                        let report = inner.store.apply_event(record, observed_at);
                        if report.superseded_pending {
                            inner.coordinator.forget_superseded(kind, &[id]);
                        }
                    }
                    SyncEvent::Remove { kind, id } => {
                        inner.store.remove(kind, &id);
                    }
                    SyncEvent::RefetchNeeded { kind } => refetch.push(kind),
                }
            }
        }
        self.notify();
        refetch
    }

    fn notify(&self) {
        // Collect while the cell is borrowed, deliver after releasing it:
        // a callback may re-enter the session (query, subscribe, feed new
        // data in) without hitting the borrow.
        let batch = {
            let inner = self.inner.borrow();
            self.fanout.collect(&inner.store)
        };
        self.fanout.deliver(batch);
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The current active set for `kind`, filtered, in identifier order.
    pub fn query(&self, kind: EntityKind, predicate: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.inner.borrow().store.query(kind, predicate)
    }

    /// Optimistic overlay state for one identifier (test and debugging
    /// hook; views normally only read records).
    pub fn overlay(&self, kind: EntityKind, id: &EntityId) -> Option<Overlay> {
        self.inner.borrow().store.overlay(kind, id)
    }

    pub fn channel_state(&self) -> ChannelState {
        self.inner.borrow().pipeline.channel_state()
    }

    /// Register a view's interest in a `(kind, predicate)` pair. The
    /// subscription lives until the guard is dropped.
    pub fn subscribe(
        &self,
        kind: EntityKind,
        predicate: impl Fn(&Record) -> bool + 'static,
        callback: impl FnMut(&[Record]) + 'static,
    ) -> SubscriptionGuard {
        let inner = self.inner.borrow();
        self.fanout.subscribe(&inner.store, kind, predicate, callback)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Perform a user action optimistically: the speculative state is
    /// visible to every reader before the boundary call is issued, and is
    /// confirmed, superseded, or reverted when it settles.
    pub async fn mutate<A: HotelApi>(
        &self,
        api: &A,
        kind: EntityKind,
        id: EntityId,
        action: Action,
    ) -> Result<(), SyncError> {
        let issued_at = OffsetDateTime::now_utc();
        let seq = {
            let inner = &mut *self.inner.borrow_mut();
            inner
                .coordinator
                .begin(&mut inner.store, kind, &id, &action, issued_at)?
        };
        self.notify();

        // The only suspension point: the cell is not borrowed while the
        // boundary call is in flight, so pushes and polls interleave
        // freely.
        let result = api.mutate(kind, &id, &action).await;
        let settled_at = OffsetDateTime::now_utc();

        match result {
            Ok(server_record) => {
                {
                    let inner = &mut *self.inner.borrow_mut();
                    inner.coordinator.resolve(
                        &mut inner.store,
                        kind,
                        &id,
                        seq,
                        server_record,
                        settled_at,
                    );
                }
                self.notify();
                Ok(())
            }
            Err(err) => {
                {
                    let inner = &mut *self.inner.borrow_mut();
                    inner
                        .coordinator
                        .fail(&mut inner.store, kind, &id, seq, settled_at);
                }
                self.notify();
                Err(SyncError::Mutation(err))
            }
        }
    }

    // ── Channel freshness (driver hooks) ─────────────────────────────

    pub fn mark_stale(&self) {
        self.inner.borrow_mut().pipeline.mark_stale();
    }

    pub fn mark_live(&self) {
        self.inner.borrow_mut().pipeline.mark_live();
    }
}
