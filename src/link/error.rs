//! Error types for link store operations.

use std::fmt;

use thiserror::Error;

/// Structured classification for store/database failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDbErrorKind {
    /// `SQLite` returned busy/locked under concurrent access.
    BusyOrLocked,
    /// The links URL uniqueness constraint was violated.
    UniqueViolation,
    /// A history row referenced a link that no longer exists.
    ForeignKeyViolation,
    /// Some other constraint failure (check/not-null).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Expected row was not found.
    RowNotFound,
    /// Filesystem or transport IO failure.
    Io,
    /// SQL protocol/driver error.
    Protocol,
    /// Unclassified database failure.
    Other,
}

impl StoreDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Protocol(_) => Self::Protocol,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }

    /// True for any flavor of constraint failure.
    #[must_use]
    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            Self::UniqueViolation | Self::ForeignKeyViolation | Self::ConstraintViolation
        )
    }
}

impl fmt::Display for StoreDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::UniqueViolation => "unique_violation",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::RowNotFound => "row_not_found",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> StoreDbErrorKind {
    // Constraint failures first: `add` hits uniqueness on duplicate URLs,
    // `append_history` hits the FK when its link was removed mid-attempt.
    if database_error.is_unique_violation() {
        return StoreDbErrorKind::UniqueViolation;
    }
    if database_error.is_foreign_key_violation() {
        return StoreDbErrorKind::ForeignKeyViolation;
    }

    match database_error.code().as_deref() {
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6") => StoreDbErrorKind::BusyOrLocked,
        Some(code) if code.starts_with("SQLITE_CONSTRAINT") => {
            StoreDbErrorKind::ConstraintViolation
        }
        _ if database_error.is_check_violation() => StoreDbErrorKind::ConstraintViolation,
        _ => {
            let message = database_error.message().to_ascii_lowercase();
            if message.contains("locked") || message.contains("busy") {
                StoreDbErrorKind::BusyOrLocked
            } else {
                StoreDbErrorKind::Other
            }
        }
    }
}

/// Errors that can occur during link store operations.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification used for failure handling.
        kind: StoreDbErrorKind,
        /// Human-readable database error text.
        message: String,
    },

    /// Link not found.
    #[error("link not found: id {0}")]
    LinkNotFound(i64),

    /// Invalid status value.
    #[error(
        "invalid status '{status}': {reason}\n  Suggestion: Use one of: idle, monitoring, downloading, recording, error"
    )]
    InvalidStatus {
        /// The invalid status value
        status: String,
        /// Why it's invalid
        reason: String,
    },
}

impl From<sqlx::Error> for LinkError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: StoreDbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl LinkError {
    /// Creates an `InvalidStatus` error for an unrecognized status string.
    #[must_use]
    pub fn invalid_status(status: &str) -> Self {
        Self::InvalidStatus {
            status: status.to_string(),
            reason: "unrecognized status value".to_string(),
        }
    }

    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<StoreDbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::LinkNotFound(_) | Self::InvalidStatus { .. } => None,
        }
    }

    /// Returns true when this error is any kind of constraint violation
    /// (URL uniqueness, history FK, check).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        self.database_kind()
            .is_some_and(StoreDbErrorKind::is_constraint)
    }
}
