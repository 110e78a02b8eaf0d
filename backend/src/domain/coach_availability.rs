//! Overlap rules for a coach's slots.
//!
//! Stored slots are checked by the repository; candidates inside one batch
//! are checked here before any I/O.

use super::TimeRange;

/// First pair of overlapping periods in `periods`, if any.
///
/// Sorting by start means only neighbours can overlap, so a single adjacent
/// scan suffices.
///
/// # Examples
/// ```
/// use booking::domain::{TimeRange, find_batch_overlap};
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2026, 5, 4, h, 0, 0).unwrap();
/// let morning = TimeRange::new(at(8), at(10)).unwrap();
/// let noon = TimeRange::new(at(9), at(12)).unwrap();
/// assert!(find_batch_overlap(&[noon, morning]).is_some());
/// ```
pub fn find_batch_overlap(periods: &[TimeRange]) -> Option<(TimeRange, TimeRange)> {
    let mut sorted = periods.to_vec();
    sorted.sort_by_key(|period| (period.start(), period.end()));
    sorted
        .windows(2)
        .find(|pair| pair[0].end() > pair[1].start())
        .map(|pair| (pair[0], pair[1]))
}
