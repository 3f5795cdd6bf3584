//! The event ingestion pipeline.
//!
//! Normalizes the three input shapes -- initial bulk load, push-channel
//! message, poll-refresh result -- into the single [`SyncEvent`] stream
//! the store consumes, queued and drained by one consumer so processing
//! order is deterministic.
//!
//! Push messages are `{type, payload}` envelopes. The closed type set is
//! `ROOM_UPDATE` (single-room status change, applied directly),
//! `NEW_TASK` and `NEW_TICKET` (announcements that normalize to a
//! re-fetch of the corresponding list). Unrecognized types are ignored so
//! the server can grow the set without breaking older clients; payloads
//! failing shape validation are dropped and logged, never partially
//! applied.
//!
//! Duplicate refetch triggers for one kind inside the debounce window
//! collapse to a single fetch: two identical `NEW_TICKET` notifications a
//! few hundred milliseconds apart must not cause two overlapping list
//! fetches.

use std::collections::{BTreeMap, VecDeque};

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use concierge_api::{PushMessage, MSG_NEW_TASK, MSG_NEW_TICKET, MSG_ROOM_UPDATE};
use concierge_core::{EntityKind, Record};

use crate::event::SyncEvent;

/// Freshness of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Push messages are flowing; polling is only the backstop.
    Live,
    /// The push channel is down; views should fall back to accelerated
    /// polling until reconnection succeeds.
    Stale,
}

/// What the pipeline did with one push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Normalized and queued.
    Enqueued,
    /// Unrecognized message type, skipped (forward-compatible).
    Ignored,
    /// Payload failed shape validation, dropped.
    Dropped,
    /// A refetch for the same kind was already triggered inside the
    /// debounce window.
    Deduplicated,
}

/// Normalizes raw inputs into queued [`SyncEvent`]s.
#[derive(Debug)]
pub struct IngestPipeline {
    queue: VecDeque<SyncEvent>,
    channel: ChannelState,
    refetch_debounce: time::Duration,
    last_refetch: BTreeMap<EntityKind, OffsetDateTime>,
}

impl IngestPipeline {
    pub fn new(refetch_debounce: time::Duration) -> Self {
        IngestPipeline {
            queue: VecDeque::new(),
            channel: ChannelState::Live,
            refetch_debounce,
            last_refetch: BTreeMap::new(),
        }
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel
    }

    /// Record a push-channel loss. Views relying on push freshness should
    /// fall back to accelerated polling until [`mark_live`](Self::mark_live).
    pub fn mark_stale(&mut self) {
        if self.channel != ChannelState::Stale {
            info!("push channel lost, marking state stale");
            self.channel = ChannelState::Stale;
        }
    }

    /// Record a successful reconnect. Missed messages are not replayed;
    /// the caller must follow up with fresh snapshots per kind.
    pub fn mark_live(&mut self) {
        if self.channel != ChannelState::Live {
            info!("push channel reconnected");
            self.channel = ChannelState::Live;
        }
    }

    /// Normalize one push message into the queue.
    pub fn push_message(&mut self, message: &PushMessage, now: OffsetDateTime) -> IngestOutcome {
        match message.message_type.as_str() {
            MSG_ROOM_UPDATE => {
                match Record::from_json(EntityKind::RoomStatus, message.payload.clone()) {
                    Ok(record) => {
                        self.queue.push_back(SyncEvent::Update {
                            record,
                            observed_at: now,
                        });
                        IngestOutcome::Enqueued
                    }
                    Err(err) => {
                        warn!(%err, "dropped malformed ROOM_UPDATE payload");
                        IngestOutcome::Dropped
                    }
                }
            }
            MSG_NEW_TASK => self.request_refetch(EntityKind::AmenityRequest, now),
            MSG_NEW_TICKET => self.request_refetch(EntityKind::MaintenanceTicket, now),
            other => {
                debug!(message_type = other, "ignored unrecognized push message type");
                IngestOutcome::Ignored
            }
        }
    }

    /// Queue a full snapshot (bulk load or poll refresh result).
    pub fn poll_result(
        &mut self,
        kind: EntityKind,
        records: Vec<Record>,
        taken_at: OffsetDateTime,
    ) {
        self.queue.push_back(SyncEvent::Snapshot {
            kind,
            records,
            taken_at,
        });
    }

    /// Drain every queued event, in arrival order.
    pub fn drain(&mut self) -> Vec<SyncEvent> {
        self.queue.drain(..).collect()
    }

    fn request_refetch(&mut self, kind: EntityKind, now: OffsetDateTime) -> IngestOutcome {
        if let Some(last) = self.last_refetch.get(&kind) {
            if now - *last < self.refetch_debounce {
                debug!(kind = %kind, "refetch already triggered inside debounce window");
                return IngestOutcome::Deduplicated;
            }
        }
        self.last_refetch.insert(kind, now);
        self.queue.push_back(SyncEvent::RefetchNeeded { kind });
        IngestOutcome::Enqueued
    }
}
