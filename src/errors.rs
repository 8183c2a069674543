use thiserror::Error;

/// Failures reported by the persistence and export collaborators. The engine
/// never retries; each failure surfaces once, wrapped in
/// [`EngineError::StorageError`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide error type. Messages name the affected order, line or delivery
/// so the hosting application can surface them directly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status transition: {0}")]
    InvalidStatusTransition(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::ValidationError(err.to_string())
    }
}

impl EngineError {
    /// Whether the error is caused by the caller (bad input or an illegal
    /// state change) rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidStatusTransition(_)
                | Self::InvalidOperation(_)
                | Self::NotFound(_)
        )
    }
}
