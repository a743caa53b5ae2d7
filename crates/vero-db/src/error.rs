//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! sqlx::Error
//!      │
//!      ▼
//! DbError (this module)   adds context and categorization
//!      │
//!      ▼
//! EngineError (vero-settle)   either re-mapped to a domain rejection
//!                             (e.g. the open-till unique index) or
//!                             collapsed into a support-contact error
//! ```

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// UNIQUE index violation. `constraint` carries the SQLite text
    /// ("cash_registers.kind" for the open-till guard), which the service
    /// layer inspects to translate guard trips back into domain errors.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Connection or pool construction failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// All pool connections are in use.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that fits none of the above.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// True when this error is the open-till unique index firing.
    pub fn is_open_till_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint } if constraint.contains("cash_registers.kind")
        )
    }
}

/// Classifies sqlx errors.
///
/// SQLite reports constraint failures as database errors with a message
/// prefix; we parse the prefix rather than the extended result code so the
/// mapping stays driver-version independent.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let constraint = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { constraint }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
