//! Scoped, concurrent per-user appointment retrieval.
//!
//! [`AppointmentLookup::start`] spawns one task per user immediately, so the
//! fetches run while the caller is busy with the batch free/busy request.
//! Results are claimed per user with [`AppointmentLookup::result`]. Tasks that
//! were never claimed are aborted and joined by [`AppointmentLookup::close`],
//! or aborted on drop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::FetchError;
use crate::model::Appointment;
use crate::range::TimeRange;
use crate::registry::UserRegistry;
use crate::source::AppointmentSource;

type PendingFetch = JoinHandle<Result<Vec<Appointment>, FetchError>>;

pub struct AppointmentLookup {
    pending: HashMap<String, PendingFetch>,
}

impl AppointmentLookup {
    /// Start fetching appointments for every user in `users`.
    ///
    /// At most `permits.available_permits()` fetches run at a time.
    pub fn start(
        source: Arc<dyn AppointmentSource>,
        users: &UserRegistry,
        window: TimeRange,
        permits: Arc<Semaphore>,
    ) -> Self {
        let pending = users
            .iter()
            .map(|(key, user)| {
                let source = Arc::clone(&source);
                let permits = Arc::clone(&permits);
                let user = user.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| FetchError::Cancelled)?;
                    source.lookup_appointments(&user, &window).await
                });
                (key.clone(), handle)
            })
            .collect();
        Self { pending }
    }

    /// Number of fetches not yet claimed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for and take the appointments fetched for `key`.
    ///
    /// A failed or cancelled fetch is logged and yields an empty list, as
    /// does a key that was never started or was already claimed.
    pub async fn result(&mut self, key: &str) -> Vec<Appointment> {
        let Some(handle) = self.pending.remove(key) else {
            return Vec::new();
        };
        match handle.await {
            Ok(Ok(appointments)) => appointments,
            Ok(Err(e)) => {
                warn!(
                    user = key,
                    error = %e,
                    "appointment lookup failed, merging without appointments"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    user = key,
                    error = %e,
                    "appointment lookup task did not finish, merging without appointments"
                );
                Vec::new()
            }
        }
    }

    /// Abort every unclaimed fetch and wait for the tasks to wind down.
    pub async fn close(mut self) {
        let pending = std::mem::take(&mut self.pending);
        for handle in pending.values() {
            handle.abort();
        }
        for (_, handle) in pending {
            // Cancellation (or a late result) is expected here; the outcome is discarded.
            let _ = handle.await;
        }
    }
}

impl Drop for AppointmentLookup {
    fn drop(&mut self) {
        for handle in self.pending.values() {
            handle.abort();
        }
    }
}
