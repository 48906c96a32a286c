use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Lock wait timed out: {0}")]
    LockTimeout(String),

    #[error("Custom: {0}")]
    Custom(String),
}

impl RepositoryError {
    /// Maps Postgres constraint violations and lock timeouts onto the typed
    /// variants and keeps everything else as a raw database error.
    pub fn classify(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => return RepositoryError::AlreadyExists(constraint),
                Some("23503") => return RepositoryError::ForeignKey(constraint),
                Some("23514") => return RepositoryError::Conflict(constraint),
                Some("55P03") => {
                    return RepositoryError::LockTimeout(db_err.message().to_string());
                }
                _ => {}
            }
        }
        RepositoryError::Sqlx(err)
    }
}
