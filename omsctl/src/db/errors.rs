use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Text longer than its column allows (SQLSTATE 22001)
    #[error("Value too long: {message}")]
    ValueTooLong { max_length: Option<u32>, message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(|s| s.to_string());
                let table = db_err.table().map(|s| s.to_string());
                let message = match db_err.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
                    // The detail line says whether a FK violation came from a delete ("is still referenced")
                    Some(pg_err) => match pg_err.detail() {
                        Some(detail) => format!("{}; {}", db_err.message(), detail),
                        None => db_err.message().to_string(),
                    },
                    None => db_err.message().to_string(),
                };

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.code().as_deref() == Some("22001") {
                    DbError::ValueTooLong {
                        max_length: declared_length(db_err.message()),
                        message,
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Length from a message such as "value too long for type character varying(100)"
fn declared_length(message: &str) -> Option<u32> {
    let (_, rest) = message.rsplit_once('(')?;
    rest.strip_suffix(')')?.parse().ok()
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
