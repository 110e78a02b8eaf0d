//! Bookable training slots and their in-memory capacity rules.
//!
//! The persisted counter is the source of truth under concurrency; the
//! methods here validate a single writer's intent before the repository
//! applies the matching atomic operation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{TimeRange, UserId};

/// Check-in opens this long before a slot starts.
pub const CHECK_IN_OPENS_BEFORE: Duration = Duration::minutes(10);

/// Lifecycle state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainDateStatus {
    Active,
    Inactive,
}

impl TrainDateStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for TrainDateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status label: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TrainDateStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Guard violations and validation failures for [`TrainDate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrainDateError {
    #[error("train date id must not be empty")]
    EmptyId,
    #[error("location must not be empty")]
    EmptyLocation,
    #[error("max capacity must be greater than zero")]
    InvalidCapacity,
    #[error("available capacity {available} exceeds max capacity {max}")]
    InvalidAvailableCapacity { available: u32, max: u32 },
    #[error("seat count must be greater than zero")]
    InvalidCount,
    #[error("requested {requested} seats but only {available} remain")]
    CapacityNotEnough { requested: u32, available: u32 },
    #[error("training has already started")]
    TrainingOver,
    #[error("training still has {booked} booked seats")]
    HasAppointments { booked: u32 },
}

/// Fields required to schedule a brand-new slot.
#[derive(Debug, Clone)]
pub struct NewTrainDate {
    pub id: String,
    pub coach_id: UserId,
    pub location: String,
    pub capacity: u32,
    pub period: TimeRange,
}

/// Input payload for [`TrainDate::new`], used when rehydrating from storage.
#[derive(Debug, Clone)]
pub struct TrainDateDraft {
    pub id: String,
    pub coach_id: UserId,
    pub location: String,
    pub max_capacity: u32,
    pub available_capacity: u32,
    pub period: TimeRange,
    pub status: TrainDateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable slot with finite capacity.
///
/// # Examples
/// ```
/// use booking::domain::{NewTrainDate, TimeRange, TrainDate, UserId};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let period = TimeRange::new(now + Duration::hours(3), now + Duration::hours(4)).unwrap();
/// let mut slot = TrainDate::schedule(
///     NewTrainDate {
///         id: "td-1".into(),
///         coach_id: UserId::new("coach").unwrap(),
///         location: "Riverside court".into(),
///         capacity: 4,
///         period,
///     },
///     now,
/// )
/// .unwrap();
/// slot.reserve_spot(3, now).unwrap();
/// assert_eq!(slot.available_capacity(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainDate {
    id: String,
    coach_id: UserId,
    location: String,
    max_capacity: u32,
    available_capacity: u32,
    period: TimeRange,
    status: TrainDateStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrainDate {
    /// Create an active slot with every seat available.
    pub fn schedule(new: NewTrainDate, now: DateTime<Utc>) -> Result<Self, TrainDateError> {
        Self::new(TrainDateDraft {
            id: new.id,
            coach_id: new.coach_id,
            location: new.location,
            max_capacity: new.capacity,
            available_capacity: new.capacity,
            period: new.period,
            status: TrainDateStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate a stored slot.
    pub fn new(draft: TrainDateDraft) -> Result<Self, TrainDateError> {
        if draft.id.trim().is_empty() {
            return Err(TrainDateError::EmptyId);
        }
        if draft.location.trim().is_empty() {
            return Err(TrainDateError::EmptyLocation);
        }
        if draft.max_capacity == 0 {
            return Err(TrainDateError::InvalidCapacity);
        }
        if draft.available_capacity > draft.max_capacity {
            return Err(TrainDateError::InvalidAvailableCapacity {
                available: draft.available_capacity,
                max: draft.max_capacity,
            });
        }
        Ok(Self {
            id: draft.id,
            coach_id: draft.coach_id,
            location: draft.location,
            max_capacity: draft.max_capacity,
            available_capacity: draft.available_capacity,
            period: draft.period,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn coach_id(&self) -> &UserId {
        &self.coach_id
    }

    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn available_capacity(&self) -> u32 {
        self.available_capacity
    }

    /// Seats currently held by bookings.
    pub fn booked_count(&self) -> u32 {
        self.max_capacity - self.available_capacity
    }

    pub fn period(&self) -> TimeRange {
        self.period
    }

    pub fn status(&self) -> TrainDateStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_full(&self) -> bool {
        self.available_capacity == 0
    }

    /// Take `count` seats.
    pub fn reserve_spot(&mut self, count: u32, now: DateTime<Utc>) -> Result<(), TrainDateError> {
        if count == 0 {
            return Err(TrainDateError::InvalidCount);
        }
        if self.available_capacity < count {
            return Err(TrainDateError::CapacityNotEnough {
                requested: count,
                available: self.available_capacity,
            });
        }
        if now > self.period.start() {
            return Err(TrainDateError::TrainingOver);
        }
        self.available_capacity -= count;
        self.updated_at = now;
        Ok(())
    }

    /// Return `count` seats, saturating at `max_capacity`.
    pub fn release_spot(&mut self, count: u32, now: DateTime<Utc>) -> Result<(), TrainDateError> {
        if count == 0 {
            return Err(TrainDateError::InvalidCount);
        }
        let released = self.available_capacity.saturating_add(count);
        if released > self.max_capacity {
            warn!(
                train_date_id = %self.id,
                available = self.available_capacity,
                max = self.max_capacity,
                count,
                "over-release clamped to max capacity"
            );
        }
        self.available_capacity = released.min(self.max_capacity);
        self.updated_at = now;
        Ok(())
    }

    /// Overwrite the seat counter with the store's value, capped at
    /// `max_capacity`.
    pub(crate) fn sync_available_capacity(&mut self, available: u32) {
        self.available_capacity = available.min(self.max_capacity);
    }

    /// Check-in is open from ten minutes before the start onwards.
    pub fn can_verify_attendance(&self, now: DateTime<Utc>) -> bool {
        now >= self.period.start() - CHECK_IN_OPENS_BEFORE
    }

    /// Retire the slot. Only allowed when no seat is held.
    pub fn delete(&mut self, now: DateTime<Utc>) -> Result<(), TrainDateError> {
        if self.available_capacity != self.max_capacity {
            return Err(TrainDateError::HasAppointments {
                booked: self.booked_count(),
            });
        }
        self.status = TrainDateStatus::Inactive;
        self.updated_at = now;
        Ok(())
    }
}
