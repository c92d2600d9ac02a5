use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// Convert from sqlx errors
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                // Busy/locked failures are transient; callers retry them
                if message.contains("locked") || message.contains("busy") {
                    StoreError::Conflict(format!("Database busy: {}", message))
                } else {
                    StoreError::Internal(format!("Database error: {}", message))
                }
            }
            _ => StoreError::Internal("Internal database error".to_string()),
        }
    }
}
