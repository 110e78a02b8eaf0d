//! Translation of pool and Diesel failures into [`RepositoryError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Pool failures are transient from the caller's point of view.
pub(crate) fn map_pool_error(operation: &str, error: PoolError) -> RepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    RepositoryError::internal(operation, message)
}

/// Map a Diesel failure for `operation` onto the repository taxonomy.
///
/// Unique violations become `Conflict` and foreign key violations `NotFound`
/// (the referenced slot is missing); everything else is `Internal`.
pub(crate) fn map_diesel_error(operation: &str, error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(operation, ?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(operation, error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => RepositoryError::not_found(operation, "record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::conflict(operation, info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            RepositoryError::not_found(operation, info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
            RepositoryError::conflict(operation, info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::internal(operation, "database connection closed")
        }
        _ => RepositoryError::internal(operation, "database error"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::RepositoryErrorKind;

    #[rstest]
    #[case(PoolError::checkout("timed out"))]
    #[case(PoolError::build("bad url"))]
    fn pool_errors_are_retryable(#[case] error: PoolError) {
        let mapped = map_pool_error("find_train_date_by_id", error);

        assert!(mapped.is_retryable());
        assert_eq!(mapped.operation(), "find_train_date_by_id");
    }

    #[rstest]
    #[case(DieselError::NotFound, RepositoryErrorKind::NotFound)]
    #[case(DieselError::RollbackTransaction, RepositoryErrorKind::Internal)]
    #[case(DieselError::BrokenTransactionManager, RepositoryErrorKind::Internal)]
    fn diesel_errors_map_to_kinds(#[case] error: DieselError, #[case] expected: RepositoryErrorKind) {
        assert_eq!(map_diesel_error("save_appointment", error).kind(), expected);
    }

    #[rstest]
    fn unique_violation_is_a_conflict() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value violates appointments_seat_key")),
        );

        let mapped = map_diesel_error("save_many_appointments", error);
        assert_eq!(mapped.kind(), RepositoryErrorKind::Conflict);
        assert!(mapped.to_string().contains("appointments_seat_key"));
    }
}
