//! Reconciler configuration.

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Tunables for [`CalendarBridge`](crate::service::CalendarBridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum number of per-user appointment fetches in flight at once.
    pub max_parallel_fetches: usize,
}

impl BridgeConfig {
    pub const DEFAULT_MAX_PARALLEL_FETCHES: usize = 16;

    /// Effective fetch parallelism, clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn fetch_permits(&self) -> usize {
        self.max_parallel_fetches.clamp(1, Semaphore::MAX_PERMITS)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_parallel_fetches: Self::DEFAULT_MAX_PARALLEL_FETCHES,
        }
    }
}
