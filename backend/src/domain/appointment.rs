//! Appointments (one child's seat in one slot) and the leave workflow.
//!
//! State machine:
//!
//! ```text
//! CONFIRMED --cancel_as_mistake--> CANCELLED
//! CONFIRMED --mark_as_attended---> ATTENDED (idempotent once attended)
//! CONFIRMED --append_leave_record-> CANCELLED_LEAVE --cancel_leave--> CONFIRMED
//! ```
//!
//! Every guard failure leaves the appointment untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::train_date::{CHECK_IN_OPENS_BEFORE, UnknownStatus};
use super::{User, UserId};

/// Self-service cancellation window measured from booking time.
pub const MISTAKE_CANCEL_GRACE: Duration = Duration::hours(24);
/// Check-in closes this long after the slot starts.
pub const CHECK_IN_CLOSES_AFTER: Duration = Duration::hours(72);
/// Minimum notice for a leave request.
pub const LEAVE_NOTICE: Duration = Duration::hours(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Confirmed,
    Attended,
    Cancelled,
    CancelledLeave,
}

impl AppointmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Attended => "ATTENDED",
            Self::Cancelled => "CANCELLED",
            Self::CancelledLeave => "CANCELLED_LEAVE",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CONFIRMED" => Ok(Self::Confirmed),
            "ATTENDED" => Ok(Self::Attended),
            "CANCELLED" => Ok(Self::Cancelled),
            "CANCELLED_LEAVE" => Ok(Self::CancelledLeave),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for LeaveStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "NONE" | "" => Ok(Self::None),
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Leave sub-record. Empty when `status` is [`LeaveStatus::None`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveInfo {
    reason: String,
    status: LeaveStatus,
    created_at: Option<DateTime<Utc>>,
}

impl LeaveInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(reason: impl Into<String>, status: LeaveStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            reason: reason.into(),
            status,
            created_at: Some(created_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status == LeaveStatus::None
    }

    pub fn reason(&self) -> &str {
        self.reason.as_str()
    }

    pub fn status(&self) -> LeaveStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Validation failures and guard violations for [`Appointment`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentError {
    #[error("appointment id must not be empty")]
    EmptyId,
    #[error("train date id must not be empty")]
    EmptyTrainDateId,
    #[error("child label must not be empty")]
    EmptyChildLabel,
    #[error("appointment does not belong to the caller")]
    NotBelongToUser,
    #[error("appointment can only be cancelled within 24 hours of booking")]
    CancelTimeout,
    #[error("cannot {action} an appointment in status {status}")]
    InvalidStatus {
        action: &'static str,
        status: AppointmentStatus,
    },
    #[error("check-in is not open yet")]
    CheckInNotOpen,
    #[error("check-in window has closed")]
    CheckInTooLate,
    #[error("appointment is on leave")]
    OnLeave,
    #[error("leave reason must not be empty")]
    LeaveReasonEmpty,
    #[error("leave must be requested at least two hours before the start")]
    LeaveTooLate,
    #[error("leave is only possible for confirmed appointments")]
    CannotLeave,
    #[error("leave is not approved or pending")]
    LeaveNotApproved,
}

/// Fields required to book a new appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: String,
    pub train_date_id: String,
    pub user: User,
    pub child_label: String,
}

/// Input payload for [`Appointment::new`], used when rehydrating.
#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    pub id: String,
    pub train_date_id: String,
    pub user: User,
    pub child_label: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub leave: LeaveInfo,
}

/// One child's seat in one slot, owned by one user.
///
/// Uniqueness key: `(user id, train date id, child label)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    id: String,
    train_date_id: String,
    user: User,
    child_label: String,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
    leave: LeaveInfo,
}

impl Appointment {
    /// Create a confirmed booking.
    pub fn book(new: NewAppointment, now: DateTime<Utc>) -> Result<Self, AppointmentError> {
        Self::new(AppointmentDraft {
            id: new.id,
            train_date_id: new.train_date_id,
            user: new.user,
            child_label: new.child_label,
            status: AppointmentStatus::Confirmed,
            created_at: now,
            updated_at: now,
            verified_at: None,
            leave: LeaveInfo::empty(),
        })
    }

    pub fn new(draft: AppointmentDraft) -> Result<Self, AppointmentError> {
        if draft.id.trim().is_empty() {
            return Err(AppointmentError::EmptyId);
        }
        if draft.train_date_id.trim().is_empty() {
            return Err(AppointmentError::EmptyTrainDateId);
        }
        if draft.child_label.trim().is_empty() {
            return Err(AppointmentError::EmptyChildLabel);
        }
        Ok(Self {
            id: draft.id,
            train_date_id: draft.train_date_id,
            user: draft.user,
            child_label: draft.child_label,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
            verified_at: draft.verified_at,
            leave: draft.leave,
        })
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn train_date_id(&self) -> &str {
        self.train_date_id.as_str()
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn child_label(&self) -> &str {
        self.child_label.as_str()
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn leave(&self) -> &LeaveInfo {
        &self.leave
    }

    pub fn is_checked_in(&self) -> bool {
        self.status == AppointmentStatus::Attended
    }

    pub fn is_on_leave(&self) -> bool {
        self.status == AppointmentStatus::CancelledLeave
    }

    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        self.user.id() == user_id
    }

    fn ensure_owner(&self, caller: &UserId) -> Result<(), AppointmentError> {
        if self.belongs_to(caller) {
            Ok(())
        } else {
            Err(AppointmentError::NotBelongToUser)
        }
    }

    /// Self-service cancellation shortly after booking by mistake.
    pub fn cancel_as_mistake(
        &mut self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        self.ensure_owner(caller)?;
        if now - self.created_at > MISTAKE_CANCEL_GRACE {
            return Err(AppointmentError::CancelTimeout);
        }
        if self.status != AppointmentStatus::Confirmed {
            return Err(AppointmentError::InvalidStatus {
                action: "cancel",
                status: self.status,
            });
        }
        self.status = AppointmentStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Record attendance for a slot starting at `slot_start`.
    pub fn mark_as_attended(
        &mut self,
        slot_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if now < slot_start - CHECK_IN_OPENS_BEFORE {
            return Err(AppointmentError::CheckInNotOpen);
        }
        if now > slot_start + CHECK_IN_CLOSES_AFTER {
            return Err(AppointmentError::CheckInTooLate);
        }
        match self.status {
            AppointmentStatus::Confirmed => {}
            // Repeated check-in keeps the first verification time.
            AppointmentStatus::Attended => return Ok(()),
            AppointmentStatus::CancelledLeave => return Err(AppointmentError::OnLeave),
            status @ AppointmentStatus::Cancelled => {
                return Err(AppointmentError::InvalidStatus {
                    action: "check in",
                    status,
                });
            }
        }
        self.status = AppointmentStatus::Attended;
        self.verified_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Take leave with `reason`; approved immediately.
    pub fn append_leave_record(
        &mut self,
        reason: &str,
        slot_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if reason.trim().is_empty() {
            return Err(AppointmentError::LeaveReasonEmpty);
        }
        if slot_start - now < LEAVE_NOTICE {
            return Err(AppointmentError::LeaveTooLate);
        }
        if self.status != AppointmentStatus::Confirmed {
            return Err(AppointmentError::CannotLeave);
        }
        self.status = AppointmentStatus::CancelledLeave;
        self.leave = LeaveInfo::new(reason.trim(), LeaveStatus::Approved, now);
        self.updated_at = now;
        Ok(())
    }

    /// Withdraw a leave record and reclaim the seat.
    pub fn cancel_leave(&mut self, caller: &UserId, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        self.ensure_owner(caller)?;
        if self.status != AppointmentStatus::CancelledLeave {
            return Err(AppointmentError::InvalidStatus {
                action: "cancel leave for",
                status: self.status,
            });
        }
        if !matches!(
            self.leave.status(),
            LeaveStatus::Approved | LeaveStatus::Pending
        ) {
            return Err(AppointmentError::LeaveNotApproved);
        }
        self.status = AppointmentStatus::Confirmed;
        self.leave = LeaveInfo::empty();
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
#[path = "appointment_tests.rs"]
mod tests;
