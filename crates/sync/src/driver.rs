//! Async drivers: the poll loop and the push-receive loop.
//!
//! Both are plain `async fn`s over the [`HotelApi`] boundary, intended
//! for a current-thread runtime (`tokio::task::spawn_local`): the engine
//! is single-threaded cooperative and the [`Session`] handle is not
//! `Send`.
//!
//! Push is the low-latency path; polling is the consistency backstop. On
//! push-channel loss the loop retries the connection after a fixed delay
//! (no exponential growth needed at this entity volume) and, because
//! missed messages are not replayed, follows every successful reconnect
//! with a full resync of all kinds.

use std::rc::Rc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use concierge_api::HotelApi;
use concierge_core::EntityKind;

use crate::pipeline::ChannelState;
use crate::session::Session;

/// Poll `kind` forever: the session's regular cadence while the push
/// channel is live, accelerated while it is stale (polling is then the
/// only source of updates).
pub async fn poll_loop<A: HotelApi>(session: Session, api: Rc<A>, kind: EntityKind) {
    loop {
        let interval = match session.channel_state() {
            ChannelState::Live => session.config().poll_interval(),
            ChannelState::Stale => session.config().stale_poll_interval(),
        };
        tokio::time::sleep(interval).await;
        match api.fetch_list(kind).await {
            Ok(records) => session.apply_poll(kind, records, OffsetDateTime::now_utc()),
            // Transient transport failure: the next tick retries.
            Err(err) => debug!(kind = %kind, %err, "poll refresh failed"),
        }
    }
}

/// Receive push messages forever, re-fetching lists the messages announce
/// and resynchronizing after every reconnect.
pub async fn push_loop<A: HotelApi>(session: Session, api: Rc<A>) {
    loop {
        match api.recv_push().await {
            Ok(message) => {
                for kind in session.ingest_push(&message) {
                    match api.fetch_list(kind).await {
                        Ok(records) => {
                            session.apply_poll(kind, records, OffsetDateTime::now_utc())
                        }
                        Err(err) => debug!(kind = %kind, %err, "announced re-fetch failed"),
                    }
                }
            }
            Err(err) => {
                warn!(%err, "push channel lost, reconnecting on fixed backoff");
                session.mark_stale();
                let delay = session.config().reconnect_delay();
                loop {
                    tokio::time::sleep(delay).await;
                    match api.reconnect_push().await {
                        Ok(()) => break,
                        Err(err) => debug!(%err, "reconnect attempt failed"),
                    }
                }
                session.mark_live();
                resync(&session, &*api).await;
            }
        }
    }
}

/// Fetch a fresh snapshot of every kind. Used after reconnects, when the
/// push channel may have silently dropped transitions.
pub async fn resync<A: HotelApi + ?Sized>(session: &Session, api: &A) {
    for kind in EntityKind::ALL {
        match api.fetch_list(kind).await {
            Ok(records) => session.apply_poll(kind, records, OffsetDateTime::now_utc()),
            Err(err) => warn!(kind = %kind, %err, "resync fetch failed"),
        }
    }
}
