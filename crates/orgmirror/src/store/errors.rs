use sea_orm::DbErr;
use thiserror::Error;

/// Errors returned by [`Store`](super::Store) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The backing store refused the operation.
    #[error("Store unavailable: {operation}")]
    Unavailable { operation: String },
}

impl StoreError {
    pub fn unavailable(operation: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
