//! Engine configuration.

use serde::Deserialize;
use std::time::Duration;

/// Tunable cadences of the sync engine.
///
/// Defaults match the cadences observed in production: kitchen, laundry,
/// and order views poll every 10 seconds, accelerating to 3 seconds while
/// the push channel is down; the push channel retries a dropped
/// connection after a constant 3 seconds (no exponential growth needed at
/// this entity volume); duplicate refetch triggers within one second
/// collapse to a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Poll refresh cadence per kind, in seconds.
    pub poll_interval_secs: u64,
    /// Accelerated poll cadence while the push channel is down, in
    /// seconds.
    pub stale_poll_interval_secs: u64,
    /// Fixed delay between push-channel reconnect attempts, in seconds.
    pub reconnect_delay_secs: u64,
    /// Window within which duplicate refetch triggers for the same kind
    /// are collapsed, in milliseconds.
    pub refetch_debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval_secs: 10,
            stale_poll_interval_secs: 3,
            reconnect_delay_secs: 3,
            refetch_debounce_ms: 1_000,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn stale_poll_interval(&self) -> Duration {
        Duration::from_secs(self.stale_poll_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn refetch_debounce(&self) -> time::Duration {
        time::Duration::milliseconds(self.refetch_debounce_ms as i64)
    }
}
