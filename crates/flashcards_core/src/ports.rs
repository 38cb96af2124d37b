//! crates/flashcards_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the database, the identity provider and the language model.

use crate::domain::{
    AuthSession, Flashcard, FlashcardChanges, FlashcardId, FlashcardQuery, Generation,
    GenerationId, NewFlashcard, NewGeneration, NewGenerationErrorLog, Page, PageRequest, User,
    UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A classified failure of the completion provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("completion provider timed out")]
    Timeout,
    #[error("completion provider returned a malformed response: {0}")]
    MalformedResponse(String),
    #[error("completion provider request failed ({code}): {message}")]
    Transport { code: String, message: String },
}

impl ProviderError {
    /// Machine-readable code recorded in the generation error log.
    pub fn code(&self) -> &str {
        match self {
            Self::Timeout => "PROVIDER_TIMEOUT",
            Self::MalformedResponse(_) => "PROVIDER_FORMAT_ERROR",
            Self::Transport { code, .. } => code,
        }
    }
}

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Storage error ({code}): {message}")]
    Storage { code: String, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence gateway. Every read and write is scoped by the owning user where the
/// entity has one.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users and Auth Sessions ---
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Generations ---
    async fn insert_generation(&self, generation: NewGeneration) -> PortResult<Generation>;

    /// Generations of `user_id` with at least one accepted proposal, newest first.
    async fn list_accepted_generations(
        &self,
        user_id: Uuid,
        window: PageRequest,
    ) -> PortResult<Page<Generation>>;

    async fn get_generation(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Option<Generation>>;

    /// Returns the subset of `ids` that exist and belong to `user_id`, in one query.
    async fn existing_generation_ids(
        &self,
        user_id: Uuid,
        ids: &[GenerationId],
    ) -> PortResult<Vec<GenerationId>>;

    /// Adds the deltas to the generation's acceptance counters in a single statement.
    async fn increment_acceptance_counts(
        &self,
        generation_id: GenerationId,
        unedited: i32,
        edited: i32,
    ) -> PortResult<()>;

    // --- Error Log ---
    async fn insert_generation_error_log(&self, entry: NewGenerationErrorLog) -> PortResult<()>;

    // --- Flashcards ---
    /// Inserts every card or none of them.
    async fn insert_flashcards(
        &self,
        user_id: Uuid,
        flashcards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>>;

    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardQuery,
    ) -> PortResult<Page<Flashcard>>;

    async fn list_generation_flashcards(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Vec<Flashcard>>;

    async fn get_flashcard(&self, user_id: Uuid, id: FlashcardId)
        -> PortResult<Option<Flashcard>>;

    async fn update_flashcard(
        &self,
        user_id: Uuid,
        id: FlashcardId,
        changes: &FlashcardChanges,
    ) -> PortResult<Option<Flashcard>>;

    /// Returns whether a row was actually removed.
    async fn delete_flashcard(&self, user_id: Uuid, id: FlashcardId) -> PortResult<bool>;
}

/// Everything the completion provider needs for one call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema_name: String,
    pub response_schema: serde_json::Value,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// The model name recorded on generations and error logs.
    fn model(&self) -> &str;

    /// Returns the raw structured-output text produced by the model.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<String>;
}

/// Identity/session gate. Resolves who the caller is.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<(User, AuthSession)>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<(User, AuthSession)>;

    async fn sign_out(&self, session_id: &str) -> PortResult<()>;

    async fn current_user(&self, session_id: &str) -> PortResult<Uuid>;
}
