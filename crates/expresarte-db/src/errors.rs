//! Mapping of constraint violations that raced past a service pre-check.

use expresarte_core::AppError;

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Turn a unique-constraint violation into a conflict; anything else is a
/// storage failure.
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    if is_unique_violation(&err) {
        return AppError::conflict(anyhow::anyhow!("{}", message));
    }
    AppError::storage(err)
}

/// Turn a foreign-key violation (a restricted delete or a dangling
/// reference) into a conflict; anything else is a storage failure.
pub fn conflict_on_foreign_key(err: sqlx::Error, message: &str) -> AppError {
    if is_foreign_key_violation(&err) {
        return AppError::conflict(anyhow::anyhow!("{}", message));
    }
    AppError::storage(err)
}

/// Turn a foreign-key violation on insert into `NotFound`: the referenced row
/// was deleted after it was checked.
pub fn not_found_on_foreign_key(err: sqlx::Error, message: &str) -> AppError {
    if is_foreign_key_violation(&err) {
        return AppError::not_found(anyhow::anyhow!("{}", message));
    }
    AppError::storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use expresarte_core::ErrorKind;

    #[test]
    fn test_non_database_errors_are_storage() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "duplicate");
        assert_eq!(err.kind, ErrorKind::Storage);

        let err = conflict_on_foreign_key(sqlx::Error::PoolTimedOut, "in use");
        assert_eq!(err.kind, ErrorKind::Storage);

        let err = not_found_on_foreign_key(sqlx::Error::RowNotFound, "gone");
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }
}
