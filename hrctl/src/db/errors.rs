use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// An update addressed a row that no longer exists (zero rows affected)
    #[error("Unable to update {entity} with id = {id}")]
    StaleUpdate { entity: &'static str, id: i64 },

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

    /// Check constraint violation (e.g. an enum value outside the allowed set)
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// NOT NULL constraint violation
    #[error("Not-null constraint violation")]
    NotNullViolation { table: Option<String>, message: String },

    /// A column could not be read as the declared type. This is a mapping bug, not a data
    /// condition callers are expected to recover from.
    #[error("Column {column} cannot be read as {expected}")]
    ColumnMismatch { column: String, expected: &'static str },

    /// A filter or sort referenced a column the primary table does not have
    #[error("Table {table} has no column {column}")]
    InvalidColumn { table: &'static str, column: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// PostgreSQL SQLSTATE for not_null_violation. sqlx has no helper for it.
const NOT_NULL_VIOLATION: &str = "23502";

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::ColumnNotFound(column) => DbError::ColumnMismatch {
                column: column.clone(),
                expected: "present column",
            },
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(|s| s.to_string());
                let table = db_err.table().map(|s| s.to_string());
                let message = db_err.message().to_string();

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation { constraint, table, message }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { constraint, table, message }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation { constraint, table, message }
                } else if db_err.code().as_deref() == Some(NOT_NULL_VIOLATION) {
                    DbError::NotNullViolation { table, message }
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

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
