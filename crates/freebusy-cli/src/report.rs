//! JSON rendering of reconciled users.

use freebusy_engine::{AccessLevel, Appointment, TimeRange, Timeline, User};
use serde::Serialize;

#[derive(Serialize)]
pub struct UserReport<'a> {
    email: &'a str,
    display_name: &'a str,
    access_level: AccessLevel,
    busy_times: Option<TimelineReport<'a>>,
}

#[derive(Serialize)]
struct TimelineReport<'a> {
    blocks: Vec<BlockReport<'a>>,
    appointments: &'a [Appointment],
    orphans: usize,
}

#[derive(Serialize)]
struct BlockReport<'a> {
    range: TimeRange,
    appointments: &'a [Appointment],
}

impl<'a> From<&'a Timeline> for TimelineReport<'a> {
    fn from(timeline: &'a Timeline) -> Self {
        Self {
            blocks: timeline
                .blocks()
                .map(|b| BlockReport {
                    range: b.range,
                    appointments: &b.appointments,
                })
                .collect(),
            appointments: timeline.appointments(),
            orphans: timeline.orphans().len(),
        }
    }
}

impl<'a> From<&'a User> for UserReport<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: &user.email,
            display_name: &user.display_name,
            access_level: user.access_level,
            busy_times: user.busy_times.as_ref().map(TimelineReport::from),
        }
    }
}

pub fn render<'a>(users: impl Iterator<Item = &'a User>) -> serde_json::Result<String> {
    let reports: Vec<UserReport<'_>> = users.map(UserReport::from).collect();
    serde_json::to_string_pretty(&reports)
}
