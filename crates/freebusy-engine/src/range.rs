//! Time ranges and window arithmetic.
//!
//! All timestamps are normalized to UTC at the boundary; [`TimeRange::from_local`]
//! is the entry point for wall-clock input in an IANA timezone.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// A `[start, end]` pair of UTC timestamps.
///
/// Ordering is by `start`, then by `end`. That is the order appointments are
/// sorted in within a busy-time block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Sentinel for "no range specified": the widest representable range.
    pub const UNBOUNDED: TimeRange = TimeRange {
        start: DateTime::<Utc>::MIN_UTC,
        end: DateTime::<Utc>::MAX_UTC,
    };

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "TimeRange start must not be after end");
        Self { start, end }
    }

    /// Checked constructor for untrusted input.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(BridgeError::InvalidArgument(format!(
                "range start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from two wall-clock strings interpreted in `timezone`.
    ///
    /// Each bound may be RFC 3339 (its own offset wins) or a naive
    /// `YYYY-MM-DDTHH:MM:SS` local time.
    ///
    /// # Errors
    /// `InvalidTimezone` for an unknown IANA name, `InvalidDateTime` for an
    /// unparseable string or a local time inside a DST gap, `InvalidArgument`
    /// when `start > end`.
    pub fn from_local(start: &str, end: &str, timezone: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| BridgeError::InvalidTimezone(timezone.to_string()))?;
        Self::try_new(parse_datetime(start, tz)?, parse_datetime(end, tz)?)
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    /// Open-interval overlap: ranges that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Inclusive at both ends.
    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// True when this range starts or ends inside `window` (inclusive).
    ///
    /// A range that swallows the whole window without either endpoint landing
    /// inside it is not retained.
    pub fn touches_window(&self, window: &TimeRange) -> bool {
        window.contains_instant(self.start) || window.contains_instant(self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Unchecked wire form; deserialization goes through [`TimeRange::try_new`].
#[derive(Deserialize)]
struct RawRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = BridgeError;

    fn try_from(raw: RawRange) -> Result<Self> {
        TimeRange::try_new(raw.start, raw.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "[unbounded]");
        }
        write!(f, "[{} - {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parse an RFC 3339 string, or a naive local datetime in `tz`, into UTC.
fn parse_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| BridgeError::InvalidDateTime(format!("'{}': {}", s, e)))?;
    // Ambiguous local times (fall back) resolve to the earlier instant.
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            BridgeError::InvalidDateTime(format!("'{}' does not exist in {}", s, tz.name()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn ordering_is_start_then_end() {
        let a = TimeRange::new(at(9, 0), at(10, 0));
        let b = TimeRange::new(at(9, 0), at(9, 30));
        let c = TimeRange::new(at(8, 0), at(11, 0));
        let mut v = vec![a, b, c];
        v.sort();
        assert_eq!(v, vec![c, b, a]);
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = TimeRange::new(at(9, 0), at(10, 0));
        let b = TimeRange::new(at(10, 0), at(11, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&TimeRange::new(at(9, 59), at(10, 30))));
    }

    #[test]
    fn window_test_is_inclusive() {
        let window = TimeRange::new(at(9, 0), at(17, 0));
        assert!(TimeRange::new(at(8, 0), at(9, 0)).touches_window(&window));
        assert!(TimeRange::new(at(17, 0), at(18, 0)).touches_window(&window));
        assert!(!TimeRange::new(at(7, 0), at(8, 0)).touches_window(&window));
        // Swallows the window without an endpoint inside it.
        assert!(!TimeRange::new(at(8, 0), at(18, 0)).touches_window(&window));
    }

    #[test]
    fn unbounded_sentinel() {
        assert!(TimeRange::UNBOUNDED.is_unbounded());
        assert!(!TimeRange::new(at(9, 0), at(10, 0)).is_unbounded());
        assert_eq!(TimeRange::UNBOUNDED.to_string(), "[unbounded]");
    }

    #[test]
    fn from_local_converts_to_utc() {
        let r = TimeRange::from_local(
            "2026-03-02T09:00:00",
            "2026-03-02T17:00:00",
            "America/New_York",
        )
        .unwrap();
        assert_eq!(r.start, Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap());
        assert_eq!(r.end, Utc.with_ymd_and_hms(2026, 3, 2, 22, 0, 0).unwrap());
    }

    #[test]
    fn from_local_accepts_rfc3339() {
        let r = TimeRange::from_local(
            "2026-03-02T09:00:00+01:00",
            "2026-03-02T10:00:00Z",
            "UTC",
        )
        .unwrap();
        assert_eq!(r.start, at(8, 0));
        assert_eq!(r.end, at(10, 0));
    }

    #[test]
    fn deserialize_rejects_inverted_range() {
        let err = serde_json::from_str::<TimeRange>(
            r#"{"start":"2026-03-02T10:00:00Z","end":"2026-03-02T09:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("is after end"), "{}", err);

        let ok: TimeRange = serde_json::from_str(
            r#"{"start":"2026-03-02T09:00:00Z","end":"2026-03-02T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok, TimeRange::new(at(9, 0), at(9, 0)));
    }

    #[test]
    fn from_local_rejects_bad_input() {
        assert!(matches!(
            TimeRange::from_local("2026-03-02T09:00:00", "2026-03-02T10:00:00", "Mars/Olympus"),
            Err(BridgeError::InvalidTimezone(_))
        ));
        assert!(matches!(
            TimeRange::from_local("yesterday", "2026-03-02T10:00:00", "UTC"),
            Err(BridgeError::InvalidDateTime(_))
        ));
        // Spring-forward gap in New York.
        assert!(matches!(
            TimeRange::from_local("2026-03-08T02:30:00", "2026-03-08T04:00:00", "America/New_York"),
            Err(BridgeError::InvalidDateTime(_))
        ));
        assert!(matches!(
            TimeRange::from_local("2026-03-02T10:00:00", "2026-03-02T09:00:00", "UTC"),
            Err(BridgeError::InvalidArgument(_))
        ));
    }
}
