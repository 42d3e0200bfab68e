use std::{env, time::Duration};

use log::*;

const DEFAULT_PUSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_RECENT_TRANSACTIONS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long the push channel gets to open. Armed once per session.
    pub push_connect_timeout: Duration,
    /// The polling period once the session has fallen back to polling.
    pub poll_interval: Duration,
    /// The number of ledger entries fetched with each wallet refresh.
    pub recent_transactions_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_connect_timeout: DEFAULT_PUSH_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            recent_transactions_limit: DEFAULT_RECENT_TRANSACTIONS_LIMIT,
        }
    }
}

impl SyncConfig {
    /// Reads `FOS_SYNC_PUSH_TIMEOUT_MS`, `FOS_SYNC_POLL_INTERVAL_MS` and `FOS_SYNC_RECENT_TRANSACTIONS`, keeping the
    /// default for anything that is missing or invalid.
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let push_connect_timeout = millis_from_env("FOS_SYNC_PUSH_TIMEOUT_MS").unwrap_or(defaults.push_connect_timeout);
        let poll_interval = millis_from_env("FOS_SYNC_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval);
        let recent_transactions_limit = env::var("FOS_SYNC_RECENT_TRANSACTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid value for FOS_SYNC_RECENT_TRANSACTIONS: {s}. {e}"))
                    .ok()
            })
            .unwrap_or(defaults.recent_transactions_limit);
        Self { push_connect_timeout, poll_interval, recent_transactions_limit }
    }

    pub fn with_push_connect_timeout(mut self, timeout: Duration) -> Self {
        self.push_connect_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn millis_from_env(name: &str) -> Option<Duration> {
    let value = env::var(name).ok()?;
    match value.parse::<u64>() {
        Ok(0) => {
            warn!("🪛️ {name} cannot be zero. Using the default.");
            None
        },
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            warn!("🪛️ Invalid value for {name}: {value}. {e}");
            None
        },
    }
}
