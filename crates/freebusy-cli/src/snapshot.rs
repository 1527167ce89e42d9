//! A JSON snapshot standing in for the directory, the free/busy server, and
//! the appointment store.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use async_trait::async_trait;
use freebusy_engine::{
    Appointment, AppointmentSource, BridgeConfig, ClassifiedFreeBusy, Directory, FetchError,
    FreeBusySource, TimeRange, User,
};
use serde::Deserialize;

/// On-disk snapshot layout. Map keys are email addresses (any case).
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub config: Option<BridgeConfig>,
    pub users: Vec<User>,
    #[serde(default)]
    pub free_busy: HashMap<String, ClassifiedFreeBusy>,
    #[serde(default)]
    pub appointments: HashMap<String, Vec<Appointment>>,
    /// Users whose appointment lookup fails.
    #[serde(default)]
    pub unreachable: Vec<String>,
    /// Make the batch free/busy lookup fail.
    #[serde(default)]
    pub free_busy_offline: bool,
}

impl Snapshot {
    pub fn parse(json: &str) -> Result<Self> {
        let mut snapshot: Snapshot =
            serde_json::from_str(json).context("Failed to parse snapshot JSON")?;
        snapshot.free_busy = lowercase_keys(snapshot.free_busy);
        snapshot.appointments = lowercase_keys(snapshot.appointments);
        Ok(snapshot)
    }

    /// Split into the three collaborators the bridge consumes.
    pub fn into_sources(self) -> (SnapshotDirectory, SnapshotFreeBusy, SnapshotAppointments) {
        (
            SnapshotDirectory { users: self.users },
            SnapshotFreeBusy {
                data: self.free_busy,
                offline: self.free_busy_offline,
            },
            SnapshotAppointments {
                data: self.appointments,
                unreachable: self.unreachable.iter().map(|e| e.to_lowercase()).collect(),
            },
        )
    }
}

fn lowercase_keys<V>(map: HashMap<String, V>) -> HashMap<String, V> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

pub struct SnapshotDirectory {
    users: Vec<User>,
}

#[async_trait]
impl Directory for SnapshotDirectory {
    async fn search_by_attribute(
        &self,
        attribute: &str,
        terms: &[String],
    ) -> Result<Vec<User>, FetchError> {
        let field: fn(&User) -> String = match attribute {
            "mail" => |u: &User| u.email.to_lowercase(),
            "cn" => |u: &User| u.common_name.to_lowercase(),
            "displayName" => |u: &User| u.display_name.to_lowercase(),
            other => {
                return Err(FetchError::Transport(format!(
                    "unsupported directory attribute '{}'",
                    other
                )))
            }
        };
        if terms.is_empty() {
            return Ok(self.users.clone());
        }
        let wanted: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        Ok(self
            .users
            .iter()
            .filter(|u| wanted.contains(&field(u)))
            .cloned()
            .collect())
    }
}

pub struct SnapshotFreeBusy {
    data: HashMap<String, ClassifiedFreeBusy>,
    offline: bool,
}

#[async_trait]
impl FreeBusySource for SnapshotFreeBusy {
    async fn lookup_free_busy_times(
        &self,
        users: &[User],
        _window: &TimeRange,
    ) -> Result<HashMap<String, ClassifiedFreeBusy>, FetchError> {
        if self.offline {
            return Err(FetchError::Transport("free/busy server offline".to_string()));
        }
        Ok(users
            .iter()
            .filter_map(|u| {
                let key = u.key();
                self.data.get(&key).map(|fb| (key, fb.clone()))
            })
            .collect())
    }
}

pub struct SnapshotAppointments {
    data: HashMap<String, Vec<Appointment>>,
    unreachable: HashSet<String>,
}

#[async_trait]
impl AppointmentSource for SnapshotAppointments {
    async fn lookup_appointments(
        &self,
        user: &User,
        window: &TimeRange,
    ) -> Result<Vec<Appointment>, FetchError> {
        let key = user.key();
        if self.unreachable.contains(&key) {
            return Err(FetchError::Timeout);
        }
        Ok(self
            .data
            .get(&key)
            .map(|appts| {
                appts
                    .iter()
                    .filter(|a| a.range.start <= window.end && a.range.end >= window.start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
