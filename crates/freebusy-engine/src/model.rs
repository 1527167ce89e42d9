//! Calendar records exchanged with the remote systems and the reconciled result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::range::TimeRange;

/// How an appointment blocks its owner's time.
///
/// Only `Free` is treated specially: free appointments never annotate a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyStatus {
    Free,
    #[default]
    Busy,
    Tentative,
    OutOfOffice,
    Unknown,
}

/// The owner's reply to a meeting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    None,
    Organizer,
    Tentative,
    Accepted,
    Declined,
    NotResponded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    #[default]
    NonMeeting,
    Meeting,
    Received,
    Cancelled,
}

/// A single appointment record from the appointment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub subject: String,
    pub range: TimeRange,
    #[serde(default)]
    pub response_status: ResponseStatus,
    #[serde(default)]
    pub meeting_status: MeetingStatus,
    #[serde(default)]
    pub busy_status: BusyStatus,
}

impl Appointment {
    pub fn new(subject: impl Into<String>, range: TimeRange, busy_status: BusyStatus) -> Self {
        Self {
            subject: subject.into(),
            range,
            response_status: ResponseStatus::default(),
            meeting_status: MeetingStatus::default(),
            busy_status,
        }
    }

    pub fn is_free(&self) -> bool {
        self.busy_status == BusyStatus::Free
    }
}

/// Aggregate free/busy data for one user, as returned by the batch fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFreeBusy {
    /// Confirmed busy periods.
    #[serde(default)]
    pub all: Vec<TimeRange>,
    /// Tentatively busy periods.
    #[serde(default)]
    pub tentative: Vec<TimeRange>,
}

impl ClassifiedFreeBusy {
    /// Union of both lists, `all` first, without coalescing.
    ///
    /// Overlapping tentative and confirmed ranges stay separate so each can
    /// become its own block.
    pub fn combined(&self) -> Vec<TimeRange> {
        self.all.iter().chain(self.tentative.iter()).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.tentative.is_empty()
    }
}

/// A busy range annotated with the appointments that overlap it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyTimeBlock {
    pub range: TimeRange,
    pub appointments: Vec<Appointment>,
}

impl BusyTimeBlock {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            appointments: Vec::new(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.range.start
    }
}

/// The reconciled busy-time view of one user.
///
/// Blocks are keyed by start time; at most one block exists per start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    blocks: BTreeMap<DateTime<Utc>, BusyTimeBlock>,
    appointments: Vec<Appointment>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block unless one already starts at the same instant.
    ///
    /// Returns `false` (and drops `block`) when the start is taken; the first
    /// block for a start always wins, whatever its end.
    pub fn insert_block(&mut self, block: BusyTimeBlock) -> bool {
        match self.blocks.entry(block.start()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(block);
                true
            }
        }
    }

    pub fn block_at(&self, start: DateTime<Utc>) -> Option<&BusyTimeBlock> {
        self.blocks.get(&start)
    }

    pub(crate) fn block_at_mut(&mut self, start: DateTime<Utc>) -> Option<&mut BusyTimeBlock> {
        self.blocks.get_mut(&start)
    }

    /// Blocks in ascending start order.
    pub fn blocks(&self) -> impl Iterator<Item = &BusyTimeBlock> {
        self.blocks.values()
    }

    pub(crate) fn blocks_mut(&mut self) -> impl Iterator<Item = &mut BusyTimeBlock> {
        self.blocks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every non-free appointment seen for the user, in input order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub(crate) fn push_appointment(&mut self, appointment: Appointment) {
        self.appointments.push(appointment);
    }

    /// Appointments from the flat list that annotate no block.
    pub fn orphans(&self) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|appt| {
                !self
                    .blocks
                    .values()
                    .any(|block| block.appointments.contains(appt))
            })
            .collect()
    }
}

/// Visibility granted on a user's calendar once data has been retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    None,
    Busy,
    Read,
}

/// A directory-resolved calendar user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub access_level: AccessLevel,
    /// `None` until a reconciliation assigns a timeline.
    #[serde(skip)]
    pub busy_times: Option<Timeline>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            email: email.into(),
            common_name: display_name.clone(),
            display_name,
            access_level: AccessLevel::None,
            busy_times: None,
        }
    }

    /// Identity key: the lower-cased email address.
    pub fn key(&self) -> String {
        self.email.to_lowercase()
    }

    /// A user is usable only with a well-formed `local@domain` address.
    pub fn is_valid(&self) -> bool {
        match self.email.trim().split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        }
    }
}
