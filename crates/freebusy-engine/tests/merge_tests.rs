//! Tests for per-user free/busy + appointment reconciliation.

use chrono::{DateTime, TimeZone, Utc};
use freebusy_engine::{
    merge_free_busy_with_appointments, Appointment, BusyStatus, ClassifiedFreeBusy, TimeRange,
};

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn range(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> TimeRange {
    TimeRange::new(at(start_hour, start_min), at(end_hour, end_min))
}

fn busy(subject: &str, r: TimeRange) -> Appointment {
    Appointment::new(subject, r, BusyStatus::Busy)
}

fn workday() -> TimeRange {
    range(9, 0, 17, 0)
}

fn subjects(appts: &[Appointment]) -> Vec<&str> {
    appts.iter().map(|a| a.subject.as_str()).collect()
}

#[test]
fn appointment_annotates_enclosing_block() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0)],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(
        &workday(),
        &fb,
        vec![busy("Standup", range(9, 0, 9, 30))],
    );

    assert_eq!(timeline.len(), 1);
    let block = timeline.block_at(at(9, 0)).unwrap();
    assert_eq!(block.range, range(9, 0, 10, 0));
    assert_eq!(subjects(&block.appointments), vec!["Standup"]);
    assert_eq!(subjects(timeline.appointments()), vec!["Standup"]);
    assert!(timeline.orphans().is_empty());
}

#[test]
fn no_appointments_still_yields_blocks() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0), range(13, 0, 14, 0)],
        tentative: vec![range(15, 0, 15, 30)],
    };
    let timeline = merge_free_busy_with_appointments(&workday(), &fb, Vec::new());

    assert_eq!(timeline.len(), 3);
    assert!(timeline.blocks().all(|b| b.appointments.is_empty()));
    assert!(timeline.appointments().is_empty());
}

#[test]
fn free_appointment_is_dropped_everywhere() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(10, 0, 12, 0)],
        tentative: vec![],
    };
    let lunch = Appointment::new("Lunch", range(11, 0, 11, 30), BusyStatus::Free);
    let timeline = merge_free_busy_with_appointments(&workday(), &fb, vec![lunch]);

    assert_eq!(timeline.len(), 1, "block still comes from the free/busy range");
    assert!(timeline.block_at(at(10, 0)).unwrap().appointments.is_empty());
    assert!(timeline.appointments().is_empty());
}

#[test]
fn tentative_and_confirmed_ranges_stay_separate() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 11, 0)],
        tentative: vec![range(10, 0, 12, 0)],
    };
    let timeline = merge_free_busy_with_appointments(
        &workday(),
        &fb,
        vec![busy("Review", range(10, 15, 10, 45))],
    );

    assert_eq!(timeline.len(), 2);
    for block in timeline.blocks() {
        assert_eq!(subjects(&block.appointments), vec!["Review"]);
    }
    assert_eq!(timeline.appointments().len(), 1, "flat list holds it once");
}

#[test]
fn appointment_spanning_blocks_annotates_each() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0), range(10, 0, 11, 0), range(14, 0, 15, 0)],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(
        &workday(),
        &fb,
        vec![busy("Offsite", range(9, 30, 10, 30))],
    );

    assert_eq!(subjects(&timeline.block_at(at(9, 0)).unwrap().appointments), vec!["Offsite"]);
    assert_eq!(subjects(&timeline.block_at(at(10, 0)).unwrap().appointments), vec!["Offsite"]);
    assert!(timeline.block_at(at(14, 0)).unwrap().appointments.is_empty());
}

#[test]
fn back_to_back_appointment_does_not_annotate() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0)],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(
        &workday(),
        &fb,
        vec![busy("Next", range(10, 0, 10, 30))],
    );

    assert!(timeline.block_at(at(9, 0)).unwrap().appointments.is_empty());
    let orphans: Vec<Appointment> = timeline.orphans().into_iter().cloned().collect();
    assert_eq!(subjects(&orphans), vec!["Next"]);
}

#[test]
fn block_appointments_sorted_by_start_then_end() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 12, 0)],
        tentative: vec![],
    };
    let appts = vec![
        busy("C", range(11, 0, 11, 30)),
        busy("B", range(9, 0, 10, 0)),
        busy("A", range(9, 0, 9, 30)),
        busy("D", range(10, 0, 10, 15)),
    ];
    let timeline = merge_free_busy_with_appointments(&workday(), &fb, appts);

    let block = timeline.block_at(at(9, 0)).unwrap();
    assert_eq!(subjects(&block.appointments), vec!["A", "B", "D", "C"]);
    // Flat list keeps input order.
    assert_eq!(subjects(timeline.appointments()), vec!["C", "B", "A", "D"]);
}

#[test]
fn same_start_keeps_first_range() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0)],
        tentative: vec![range(9, 0, 13, 0)],
    };
    let timeline = merge_free_busy_with_appointments(&workday(), &fb, Vec::new());

    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.block_at(at(9, 0)).unwrap().range, range(9, 0, 10, 0));
}

#[test]
fn window_clipping_rules() {
    let fb = ClassifiedFreeBusy {
        all: vec![
            range(6, 0, 7, 0),   // entirely before
            range(8, 0, 9, 30),  // straddles start
            range(12, 0, 13, 0), // inside
            range(16, 30, 18, 0), // straddles end
            range(19, 0, 20, 0), // entirely after
            range(8, 0, 9, 0),   // ends exactly at window start (dup start, dropped)
            range(17, 0, 17, 30), // starts exactly at window end
        ],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(&workday(), &fb, Vec::new());

    let starts: Vec<DateTime<Utc>> = timeline.blocks().map(|b| b.range.start).collect();
    assert_eq!(starts, vec![at(8, 0), at(12, 0), at(16, 30), at(17, 0)]);
    assert_eq!(timeline.block_at(at(8, 0)).unwrap().range.end, at(9, 30));
}

#[test]
fn unbounded_window_retains_everything() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(0, 0, 1, 0), range(23, 0, 23, 59)],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(&TimeRange::UNBOUNDED, &fb, Vec::new());
    assert_eq!(timeline.len(), 2);
}

#[test]
fn orphan_outside_all_blocks_is_still_recorded() {
    let fb = ClassifiedFreeBusy {
        all: vec![range(9, 0, 10, 0)],
        tentative: vec![],
    };
    let timeline = merge_free_busy_with_appointments(
        &workday(),
        &fb,
        vec![busy("Standup", range(9, 0, 9, 15)), busy("Gym", range(15, 0, 16, 0))],
    );

    assert_eq!(timeline.appointments().len(), 2);
    let orphans = timeline.orphans();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].subject, "Gym");
}
