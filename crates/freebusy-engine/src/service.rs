//! Batch orchestration: fetch free/busy and appointments concurrently, then
//! merge them per user.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::lookup::AppointmentLookup;
use crate::merge::merge_free_busy_with_appointments;
use crate::model::{AccessLevel, User};
use crate::range::TimeRange;
use crate::registry::UserRegistry;
use crate::source::{AppointmentSource, Directory, FreeBusySource};

/// Directory attribute holding a user's email address.
pub const MAIL_ATTRIBUTE: &str = "mail";

/// Reconciles free/busy data with appointments for directory users.
pub struct CalendarBridge {
    free_busy: Arc<dyn FreeBusySource>,
    appointments: Arc<dyn AppointmentSource>,
    directory: Option<Arc<dyn Directory>>,
    fetch_permits: Arc<Semaphore>,
    config: BridgeConfig,
}

impl CalendarBridge {
    pub fn new(
        free_busy: Arc<dyn FreeBusySource>,
        appointments: Arc<dyn AppointmentSource>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            free_busy,
            appointments,
            directory: None,
            fetch_permits: Arc::new(Semaphore::new(config.fetch_permits())),
            config,
        }
    }

    /// Enable the directory search entry points.
    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Reconcile one user over all available history.
    ///
    /// Unlike [`reconcile_batch`](Self::reconcile_batch), this deliberately
    /// accepts the unbounded window.
    pub async fn reconcile_one(&self, user: User) -> Result<User> {
        self.reconcile_one_in(user, TimeRange::UNBOUNDED).await
    }

    /// Reconcile one user over `window`. The window is not checked.
    pub async fn reconcile_one_in(&self, user: User, window: TimeRange) -> Result<User> {
        let key = user.key();
        let mut users = UserRegistry::single(user);
        self.reconcile_users(&mut users, &window).await?;
        users
            .remove(&key)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("user '{}' is not valid", key)))
    }

    /// Reconcile every user in `users` over `window`, in place.
    ///
    /// Users the free/busy server returns data for get `access_level` set to
    /// [`AccessLevel::Read`] and a fresh timeline; all others are untouched.
    ///
    /// # Errors
    /// `InvalidArgument` for an unbounded window, before any fetch is issued.
    /// `Fetch` when the free/busy lookup fails; no user is modified then.
    /// A failed appointment lookup only empties that user's appointment list.
    pub async fn reconcile_batch(
        &self,
        users: &mut UserRegistry,
        window: &TimeRange,
    ) -> Result<()> {
        require_window(window)?;
        self.reconcile_users(users, window).await
    }

    /// Resolve users by `attribute` and reconcile them over `window`.
    pub async fn search(
        &self,
        attribute: &str,
        window: &TimeRange,
        terms: &[String],
    ) -> Result<UserRegistry> {
        require_window(window)?;
        let mut users = self.query_directory(attribute, terms).await?;
        if !users.is_empty() {
            self.reconcile_users(&mut users, window).await?;
        }
        Ok(users)
    }

    /// [`search`](Self::search) over email addresses.
    pub async fn search_by_email(
        &self,
        window: &TimeRange,
        emails: &[String],
    ) -> Result<UserRegistry> {
        self.search(MAIL_ATTRIBUTE, window, emails).await
    }

    /// Every user with an email address, without calendar data.
    pub async fn retrieve_all_users(&self) -> Result<UserRegistry> {
        self.query_directory(MAIL_ATTRIBUTE, &[]).await
    }

    async fn query_directory(&self, attribute: &str, terms: &[String]) -> Result<UserRegistry> {
        let directory = self.directory.as_ref().ok_or(BridgeError::NoDirectory)?;
        let found = directory.search_by_attribute(attribute, terms).await?;
        let users = UserRegistry::from_users(found);
        if !terms.is_empty() {
            let missing = users.unresolved_terms(attribute, terms);
            if !missing.is_empty() {
                info!(
                    "Unable to find all users in the directory. [{}={}]",
                    attribute,
                    missing.join(";")
                );
            }
        }
        Ok(users)
    }

    /// Shared batch path behind every entry point.
    async fn reconcile_users(&self, users: &mut UserRegistry, window: &TimeRange) -> Result<()> {
        info!(users = users.len(), window = %window, "reconciling calendar data");

        let mut lookup = AppointmentLookup::start(
            Arc::clone(&self.appointments),
            users,
            *window,
            Arc::clone(&self.fetch_permits),
        );

        let batch: Vec<User> = users.users().cloned().collect();
        let free_busy = match self.free_busy.lookup_free_busy_times(&batch, window).await {
            Ok(free_busy) => free_busy,
            Err(e) => {
                warn!(error = %e, "free/busy lookup failed, aborting batch");
                lookup.close().await;
                return Err(e.into());
            }
        };

        let mut merged = 0usize;
        for (key, user) in users.iter_mut() {
            let Some(classified) = free_busy.get(key) else {
                debug!(user = %key, "no free/busy data returned, skipping");
                continue;
            };

            user.access_level = AccessLevel::Read;
            let appointments = lookup.result(key).await;
            let timeline = info_span!("merge", user = %key)
                .in_scope(|| merge_free_busy_with_appointments(window, classified, appointments));
            user.busy_times = Some(timeline);
            merged += 1;
        }

        lookup.close().await;
        info!(users = users.len(), merged, "reconciliation complete");
        Ok(())
    }
}

fn require_window(window: &TimeRange) -> Result<()> {
    if window.is_unbounded() {
        return Err(BridgeError::InvalidArgument(
            "must specify a time range".to_string(),
        ));
    }
    Ok(())
}
