//! Error types for repository operations
//!
//! Every store (PostgreSQL or in-memory) reports failures through
//! [`RepositoryError`]. The HTTP layer maps each variant to one status code.
//!
//! # Error Categories
//!
//! - **Lookup**: `NotFound`
//! - **Uniqueness**: `Duplicate` (raised by the pre-check or translated from a unique index)
//! - **Integrity**: `ConstraintViolation` (foreign key, check and not-null failures)
//! - **Internal**: `Unexpected`

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::database::connection::DatabaseError;

/// Unique index on `lower(companies.name)`
pub const COMPANY_NAME_CONSTRAINT: &str = "uq_companies_name_lower";

/// Unique index on `lower(companies.ticker)`
pub const COMPANY_TICKER_CONSTRAINT: &str = "uq_companies_ticker_lower";

/// Unique constraint on `(company_id, period_end, period_type)`
pub const METRICS_PERIOD_CONSTRAINT: &str = "uq_financial_metrics_company_period";

pub const DUPLICATE_COMPANY_NAME: &str = "Company name already exists";
pub const DUPLICATE_COMPANY_TICKER: &str = "Company ticker already exists";
pub const DUPLICATE_METRICS_PERIOD: &str =
    "Financial metrics for this company, period end, and period type already exist";

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The entity with the given id does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// A uniqueness rule was violated; the message names the rule
    #[error("{0}")]
    Duplicate(String),

    /// Any other integrity rule of the store was violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Anything else (connection failures, driver errors)
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl RepositoryError {
    pub fn company_not_found(id: i32) -> Self {
        RepositoryError::NotFound {
            entity: "Company",
            id,
        }
    }

    pub fn metrics_not_found(id: i32) -> Self {
        RepositoryError::NotFound {
            entity: "Financial metrics",
            id,
        }
    }

    pub fn unknown_company(company_id: i32) -> Self {
        RepositoryError::ConstraintViolation(format!("company {} does not exist", company_id))
    }

    /// Returns true if the error is caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RepositoryError::Unexpected(_))
    }
}

/// Message for a unique-constraint violation reported by the database
fn duplicate_message(constraint: Option<&str>) -> String {
    match constraint {
        Some(COMPANY_NAME_CONSTRAINT) => DUPLICATE_COMPANY_NAME.to_string(),
        Some(COMPANY_TICKER_CONSTRAINT) => DUPLICATE_COMPANY_TICKER.to_string(),
        Some(METRICS_PERIOD_CONSTRAINT) => DUPLICATE_METRICS_PERIOD.to_string(),
        Some(other) => format!("Unique constraint {} violated", other),
        None => "Unique constraint violated".to_string(),
    }
}

// Constraint violations that slip past the pre-check (concurrent writers)
// surface here; the database is the authority.
impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepositoryError::Duplicate(duplicate_message(info.constraint_name()))
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => RepositoryError::ConstraintViolation(info.message().to_string()),
            // SQLSTATE 22001 has no kind of its own
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
                if info.message().starts_with("value too long") =>
            {
                RepositoryError::ConstraintViolation(info.message().to_string())
            }
            other => RepositoryError::Unexpected(other.to_string()),
        }
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DieselError(inner) => inner.into(),
            other => RepositoryError::Unexpected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;

    struct FakeInfo {
        message: &'static str,
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for FakeInfo {
        fn message(&self) -> &str {
            self.message
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(FakeInfo {
                message: "violates constraint",
                constraint,
            }),
        )
    }

    #[test]
    fn test_unique_violation_names_the_constraint() {
        let err: RepositoryError =
            db_error(DatabaseErrorKind::UniqueViolation, Some(COMPANY_TICKER_CONSTRAINT)).into();
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_COMPANY_TICKER));

        let err: RepositoryError =
            db_error(DatabaseErrorKind::UniqueViolation, Some(METRICS_PERIOD_CONSTRAINT)).into();
        assert!(matches!(&err, RepositoryError::Duplicate(msg) if msg == DUPLICATE_METRICS_PERIOD));
    }

    #[test]
    fn test_foreign_key_violation_is_constraint_violation() {
        let err: RepositoryError = db_error(DatabaseErrorKind::ForeignKeyViolation, None).into();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_value_too_long_is_constraint_violation() {
        let err: RepositoryError = DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(FakeInfo {
                message: "value too long for type character varying(3)",
                constraint: None,
            }),
        )
        .into();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
        assert!(err.is_client_error());

        let err: RepositoryError = db_error(DatabaseErrorKind::Unknown, None).into();
        assert!(matches!(err, RepositoryError::Unexpected(_)));
    }

    #[test]
    fn test_other_errors_are_unexpected() {
        let err: RepositoryError = DieselError::RollbackTransaction.into();
        assert!(matches!(err, RepositoryError::Unexpected(_)));
        assert!(!err.is_client_error());

        let err: RepositoryError =
            DatabaseError::ConnectionPoolError("timed out".to_string()).into();
        assert!(matches!(err, RepositoryError::Unexpected(_)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RepositoryError::company_not_found(42).to_string(),
            "Company 42 not found"
        );
        assert_eq!(
            RepositoryError::unknown_company(9).to_string(),
            "Constraint violation: company 9 does not exist"
        );
    }
}
