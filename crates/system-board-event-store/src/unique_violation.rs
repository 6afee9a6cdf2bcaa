//! Uniqueness-violation detection for the PostgreSQL driver.

/// Returns whether `error` is a unique-key violation, optionally restricted
/// to one named constraint.
pub(crate) fn is_unique_violation(error: &sqlx::Error, constraint: Option<&str>) -> bool {
    match error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            constraint.is_none_or(|name| db_error.constraint() == Some(name))
        }
        _ => false,
    }
}

/// Maps a driver error onto the transport failure kind.
pub(crate) fn transport(error: sqlx::Error) -> system_board_core::error::DomainError {
    system_board_core::error::DomainError::Transport(error.to_string())
}
