//! Closed time window value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation error returned by [`TimeRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeRangeError {
    #[error("time range ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A time window with `start <= end`.
///
/// Overlap uses the half-open test, so two windows that only touch at an
/// endpoint do not overlap.
///
/// # Examples
/// ```
/// use booking::domain::TimeRange;
/// use chrono::{TimeZone, Utc};
///
/// let nine = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
/// let ten = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
/// let eleven = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
///
/// let morning = TimeRange::new(nine, ten)?;
/// let late = TimeRange::new(ten, eleven)?;
/// assert!(!morning.overlaps(&late));
/// # Ok::<(), booking::domain::TimeRangeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeDto", into = "TimeRangeDto")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeRangeError> {
        if end < start {
            return Err(TimeRangeError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when the window has no duration.
    ///
    /// Empty windows overlap nothing, not even themselves.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `self.start < other.end && self.end > other.start`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when `instant` lies inside the closed window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeRangeDto {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl From<TimeRange> for TimeRangeDto {
    fn from(value: TimeRange) -> Self {
        Self {
            start: value.start,
            end: value.end,
        }
    }
}

impl TryFrom<TimeRangeDto> for TimeRange {
    type Error = TimeRangeError;

    fn try_from(value: TimeRangeDto) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn window(base: DateTime<Utc>, from_min: i64, to_min: i64) -> TimeRange {
        TimeRange::new(
            base + Duration::minutes(from_min),
            base + Duration::minutes(to_min),
        )
        .expect("valid window")
    }

    #[rstest]
    fn rejects_end_before_start(base: DateTime<Utc>) {
        let result = TimeRange::new(base, base - Duration::seconds(1));
        assert!(matches!(result, Err(TimeRangeError::EndBeforeStart { .. })));
    }

    #[rstest]
    fn accepts_zero_length_window(base: DateTime<Utc>) {
        let range = TimeRange::new(base, base).expect("zero-length window");
        assert!(range.is_empty());
        assert!(!window(base, 0, 1).is_empty());
    }

    #[rstest]
    #[case(0, 60, 30, 90, true)]
    #[case(0, 60, 60, 120, false)]
    #[case(0, 120, 30, 60, true)]
    #[case(0, 60, 90, 120, false)]
    #[case(0, 60, 0, 60, true)]
    fn overlap_is_symmetric(
        base: DateTime<Utc>,
        #[case] a_from: i64,
        #[case] a_to: i64,
        #[case] b_from: i64,
        #[case] b_to: i64,
        #[case] expected: bool,
    ) {
        let a = window(base, a_from, a_to);
        let b = window(base, b_from, b_to);
        assert_eq!(a.overlaps(&b), expected);
        assert_eq!(b.overlaps(&a), expected);
    }

    #[rstest]
    fn deserialising_validates_order(base: DateTime<Utc>) {
        let payload = serde_json::json!({
            "start": base + Duration::hours(1),
            "end": base,
        });
        let result: Result<TimeRange, _> = serde_json::from_value(payload);
        assert!(result.is_err());
    }
}
