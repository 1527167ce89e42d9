//! Reconcile aggregate free/busy ranges with appointment records.
//!
//! Each free/busy range that touches the window becomes a busy-time block,
//! keyed by its start. Non-free appointments are then attached to every block
//! they overlap, and each block's appointments are sorted by `(start, end)`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::interval::IntervalTree;
use crate::model::{Appointment, BusyTimeBlock, ClassifiedFreeBusy, Timeline};
use crate::range::TimeRange;

/// Build the annotated timeline for one user.
///
/// An empty `appointments` list still yields every block (with no
/// annotations). Appointments that overlap no block are kept only in the
/// timeline's flat appointment list.
pub fn merge_free_busy_with_appointments(
    window: &TimeRange,
    free_busy: &ClassifiedFreeBusy,
    appointments: Vec<Appointment>,
) -> Timeline {
    let started = Instant::now();
    let combined = free_busy.combined();
    let appointment_count = appointments.len();

    let mut timeline = Timeline::new();
    let busy_intervals = build_blocks(window, &combined, &mut timeline);

    for appt in appointments {
        debug!(
            subject = %appt.subject,
            range = %appt.range,
            response = ?appt.response_status,
            meeting = ?appt.meeting_status,
            busy = ?appt.busy_status,
            "considering appointment"
        );

        if appt.is_free() {
            continue;
        }

        let hits: Vec<DateTime<Utc>> = busy_intervals
            .find_overlapping(&appt.range)
            .into_iter()
            .copied()
            .collect();
        debug!(count = hits.len(), range = %appt.range, "overlapping blocks found");

        for start in hits {
            if let Some(block) = timeline.block_at_mut(start) {
                block.appointments.push(appt.clone());
            }
        }
        timeline.push_appointment(appt);
    }

    for block in timeline.blocks_mut() {
        block.appointments.sort_by(|a, b| a.range.cmp(&b.range));
    }

    info!(
        ranges = combined.len(),
        appointments = appointment_count,
        blocks = timeline.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "merged free/busy ranges with appointments"
    );

    timeline
}

/// Turn in-window ranges into blocks; the index maps each block's range to its start key.
fn build_blocks(
    window: &TimeRange,
    ranges: &[TimeRange],
    timeline: &mut Timeline,
) -> IntervalTree<DateTime<Utc>> {
    let mut intervals = IntervalTree::new();
    for range in ranges {
        if !range.touches_window(window) {
            continue;
        }
        if timeline.insert_block(BusyTimeBlock::new(*range)) {
            intervals.insert(*range, range.start);
        }
    }
    intervals
}
