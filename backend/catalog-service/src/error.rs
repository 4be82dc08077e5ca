/// Error types for catalog-service
///
/// Store and cache errors are folded into [`AppError`] here; the resource
/// layer maps each variant to a response status.
use thiserror::Error;
use video_cache::CacheError;
use video_store::StoreError;

/// Result type for catalog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (duplicate resource, etc.)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Cache operation failed
    #[error("Cache error: {0}")]
    Cache(String),
}

impl AppError {
    /// HTTP status a resource layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 400,
            AppError::Conflict(_) => 409,
            AppError::Database(_) | AppError::Cache(_) => 500,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::ReferentialIntegrity { .. } | StoreError::Model(_) => {
                AppError::Validation(err.to_string())
            }
            StoreError::DuplicateSegment { .. } => AppError::Conflict(err.to_string()),
            StoreError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err.to_string())
    }
}
