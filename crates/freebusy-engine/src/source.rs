//! Interfaces to the remote systems the reconciler reads from.
//!
//! Implementations own transport concerns (connections, timeouts, retries).
//! The reconciler never retries a failed call.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{Appointment, ClassifiedFreeBusy, User};
use crate::range::TimeRange;

/// Batch free/busy lookup.
#[async_trait]
pub trait FreeBusySource: Send + Sync {
    /// Free/busy data for `users` over `window`, keyed by lower-cased email.
    ///
    /// Users the server has no data for may be missing from the map.
    async fn lookup_free_busy_times(
        &self,
        users: &[User],
        window: &TimeRange,
    ) -> Result<HashMap<String, ClassifiedFreeBusy>, FetchError>;
}

/// Per-user appointment lookup.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// Appointments of `user` within `window`; empty when there are none.
    async fn lookup_appointments(
        &self,
        user: &User,
        window: &TimeRange,
    ) -> Result<Vec<Appointment>, FetchError>;
}

/// User directory, searched by attribute.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Users whose `attribute` matches any of `terms`; every user when `terms` is empty.
    async fn search_by_attribute(
        &self,
        attribute: &str,
        terms: &[String],
    ) -> Result<Vec<User>, FetchError>;
}
