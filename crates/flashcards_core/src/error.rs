//! crates/flashcards_core/src/error.rs
//!
//! The error taxonomy surfaced by the engines.

use crate::domain::GenerationId;
use crate::ports::{PortError, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or out-of-range input. Always fixable by the caller.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing or invalid identity")]
    Auth,

    /// The entity is absent or owned by someone else; both look the same to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown generation ids: {missing:?}")]
    ReferentialIntegrity { missing: Vec<GenerationId> },

    #[error("Completion provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error ({code}): {message}")]
    Storage { code: String, message: String },
}

impl CoreError {
    /// Machine-readable code, kept for logs.
    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ReferentialIntegrity { .. } => "INVALID_GENERATION_ID",
            Self::Provider(e) => e.code(),
            Self::Storage { code, .. } => code,
        }
    }
}

impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => Self::NotFound(what),
            PortError::Unauthorized => Self::Auth,
            PortError::Provider(e) => Self::Provider(e),
            PortError::Storage { code, message } => Self::Storage { code, message },
            PortError::Conflict(message) => Self::Storage {
                code: "CONFLICT".to_string(),
                message,
            },
            PortError::Unexpected(message) => Self::Storage {
                code: "UNEXPECTED".to_string(),
                message,
            },
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
