//! Error type shared by the booking repository ports.

use pagination::{Cursor, CursorError};

use super::define_port_error;
use super::AppointmentPageKey;

define_port_error! {
    /// Errors raised by booking repository adapters.
    ///
    /// Every variant names the repository operation that failed so logs can
    /// pinpoint the call without the caller knowing storage details.
    pub enum RepositoryError {
        /// The addressed record does not exist.
        NotFound { operation: String, message: String } =>
            "[{operation}] record not found: {message}",
        /// A uniqueness constraint or delete guard rejected the write.
        Conflict { operation: String, message: String } =>
            "[{operation}] conflicting write: {message}",
        /// A record id is malformed for the backing store.
        InvalidDocumentId { operation: String, message: String } =>
            "[{operation}] invalid record id: {message}",
        /// A pagination cursor could not be decoded.
        InvalidCursor { operation: String, message: String } =>
            "[{operation}] invalid cursor: {message}",
        /// An atomic capacity deduction found too few seats.
        CapacityNotEnough { operation: String, message: String } =>
            "[{operation}] not enough capacity: {message}",
        /// The store failed; the caller may retry.
        Internal { operation: String, message: String } =>
            "[{operation}] storage failure: {message}",
    }
}

impl RepositoryError {
    /// Name of the repository operation that raised the error.
    pub fn operation(&self) -> &str {
        match self {
            Self::NotFound { operation, .. }
            | Self::Conflict { operation, .. }
            | Self::InvalidDocumentId { operation, .. }
            | Self::InvalidCursor { operation, .. }
            | Self::CapacityNotEnough { operation, .. }
            | Self::Internal { operation, .. } => operation.as_str(),
        }
    }

    /// Only transient storage failures are safe to retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == RepositoryErrorKind::Internal
    }
}

/// Cursor over appointments joined with their slots.
pub type AppointmentCursor = Cursor<AppointmentPageKey>;

/// Decode a page token for `operation`, mapping failures to
/// [`RepositoryError::InvalidCursor`].
pub fn decode_appointment_cursor(
    operation: &str,
    token: &str,
) -> Result<AppointmentCursor, RepositoryError> {
    AppointmentCursor::decode(token)
        .map_err(|err: CursorError| RepositoryError::invalid_cursor(operation, err.to_string()))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn operation_is_preserved() {
        let err = RepositoryError::not_found("find_train_date_by_id", "td-1");
        assert_eq!(err.operation(), "find_train_date_by_id");
        assert_eq!(
            err.to_string(),
            "[find_train_date_by_id] record not found: td-1"
        );
    }

    #[rstest]
    #[case(RepositoryError::internal("op", "io"), true)]
    #[case(RepositoryError::not_found("op", "x"), false)]
    #[case(RepositoryError::conflict("op", "x"), false)]
    #[case(RepositoryError::invalid_document_id("op", "x"), false)]
    #[case(RepositoryError::invalid_cursor("op", "x"), false)]
    #[case(RepositoryError::capacity_not_enough("op", "x"), false)]
    fn only_internal_errors_are_retryable(#[case] err: RepositoryError, #[case] expected: bool) {
        assert_eq!(err.is_retryable(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-cursor")]
    fn garbage_cursors_are_invalid(#[case] token: &str) {
        let err = decode_appointment_cursor("page", token).expect_err("cursor rejected");
        assert_eq!(err.kind(), RepositoryErrorKind::InvalidCursor);
    }
}
