//! Error returned across the use-case boundary.
//!
//! Errors are transport agnostic. Each carries a stable [`ErrorCode`] that an
//! inbound adapter maps to a protocol status, the use case that raised it
//! (`category`), the step that failed (`reason`), and the original domain or
//! repository error as its [`std::error::Error::source`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ports::{RepositoryError, RepositoryErrorKind};
use super::{AppointmentError, TimeRangeError, TrainDateError, UserValidationError};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The caller may not act on the addressed resource.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// A business rule or concurrent write rejected the request.
    Conflict,
    /// An unexpected error occurred; retrying may help.
    InternalError,
}

impl ErrorCode {
    /// HTTP-equivalent status for adapters.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }
}

/// Layer the failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An entity guard rejected the change.
    Domain,
    /// The store failed or rejected the operation.
    Repository,
    /// The request was rejected before any I/O.
    UseCase,
}

/// Original error wrapped by an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCause {
    #[error(transparent)]
    TimeRange(#[from] TimeRangeError),
    #[error(transparent)]
    User(#[from] UserValidationError),
    #[error(transparent)]
    TrainDate(#[from] TrainDateError),
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ErrorCause {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Repository(_) => ErrorKind::Repository,
            Self::TimeRange(_) | Self::User(_) | Self::TrainDate(_) | Self::Appointment(_) => {
                ErrorKind::Domain
            }
        }
    }

    /// Default code for this cause.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TimeRange(_) | Self::User(_) => ErrorCode::InvalidRequest,
            Self::TrainDate(err) => match err {
                TrainDateError::EmptyId
                | TrainDateError::EmptyLocation
                | TrainDateError::InvalidCapacity
                | TrainDateError::InvalidAvailableCapacity { .. }
                | TrainDateError::InvalidCount => ErrorCode::InvalidRequest,
                TrainDateError::CapacityNotEnough { .. }
                | TrainDateError::TrainingOver
                | TrainDateError::HasAppointments { .. } => ErrorCode::Conflict,
            },
            Self::Appointment(err) => match err {
                AppointmentError::EmptyId
                | AppointmentError::EmptyTrainDateId
                | AppointmentError::EmptyChildLabel
                | AppointmentError::LeaveReasonEmpty => ErrorCode::InvalidRequest,
                AppointmentError::NotBelongToUser => ErrorCode::Forbidden,
                _ => ErrorCode::Conflict,
            },
            Self::Repository(err) => match err.kind() {
                RepositoryErrorKind::NotFound => ErrorCode::NotFound,
                RepositoryErrorKind::Conflict | RepositoryErrorKind::CapacityNotEnough => {
                    ErrorCode::Conflict
                }
                RepositoryErrorKind::InvalidDocumentId | RepositoryErrorKind::InvalidCursor => {
                    ErrorCode::InvalidRequest
                }
                RepositoryErrorKind::Internal => ErrorCode::InternalError,
            },
        }
    }
}

/// Use-case error payload.
///
/// # Examples
/// ```
/// use booking::domain::{Error, ErrorCode, ErrorKind};
///
/// let err = Error::invalid_request("CreateAppointment", "NO_CHILDREN", "no children listed");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// assert_eq!(err.kind(), ErrorKind::UseCase);
/// assert_eq!(err.code().http_status(), 400);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{category}/{reason}: {message}")]
pub struct Error {
    kind: ErrorKind,
    code: ErrorCode,
    category: &'static str,
    reason: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip)]
    #[source]
    cause: Option<ErrorCause>,
}

impl Error {
    pub fn new(
        kind: ErrorKind,
        code: ErrorCode,
        category: &'static str,
        reason: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code,
            category,
            reason,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Wrap a domain or repository error, deriving kind and code from it.
    pub fn wrap(category: &'static str, reason: &'static str, cause: impl Into<ErrorCause>) -> Self {
        let cause = cause.into();
        Self {
            kind: cause.kind(),
            code: cause.code(),
            category,
            reason,
            message: cause.to_string(),
            details: None,
            cause: Some(cause),
        }
    }

    /// Input rejected before any I/O.
    pub fn invalid_request(
        category: &'static str,
        reason: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::UseCase,
            ErrorCode::InvalidRequest,
            category,
            reason,
            message,
        )
    }

    /// A lookup found nothing.
    pub fn not_found(
        category: &'static str,
        reason: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Repository,
            ErrorCode::NotFound,
            category,
            reason,
            message,
        )
    }

    /// A business rule outside a single entity rejected the request.
    pub fn conflict(
        category: &'static str,
        reason: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Domain, ErrorCode::Conflict, category, reason, message)
    }

    /// The caller may not act on the resource.
    pub fn forbidden(
        category: &'static str,
        reason: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Domain, ErrorCode::Forbidden, category, reason, message)
    }

    /// Attach structured details for adapters.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Name of the use case that failed.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Step of the use case that failed.
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Original error, if this wraps one.
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// True when the wrapped cause is this repository error kind.
    pub fn is_repository(&self, kind: RepositoryErrorKind) -> bool {
        matches!(&self.cause, Some(ErrorCause::Repository(err)) if err.kind() == kind)
    }
}
