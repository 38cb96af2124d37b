//! crates/flashcards_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier assigned by storage to a generation row.
pub type GenerationId = i64;

/// Identifier assigned by storage to a flashcard row.
pub type FlashcardId = i64;

//=========================================================================================
// Users and Auth Sessions
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Generations
//=========================================================================================

/// One invocation of the completion provider.
///
/// The two acceptance counters are cumulative: they record how many proposals were
/// kept at batch-creation time and are never decremented when flashcards are deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub id: GenerationId,
    pub user_id: Uuid,
    pub model: String,
    pub generated_count: i32,
    pub accepted_unedited_count: Option<i32>,
    pub accepted_edited_count: Option<i32>,
    pub source_text_hash: String,
    pub source_text_length: i32,
    pub generation_duration: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Generation {
    /// Total number of proposals accepted so far, treating missing counters as zero.
    pub fn total_accepted(&self) -> i32 {
        self.accepted_unedited_count.unwrap_or(0) + self.accepted_edited_count.unwrap_or(0)
    }
}

/// The metadata persisted after a successful completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneration {
    pub user_id: Uuid,
    pub model: String,
    pub generated_count: i32,
    pub source_text_hash: String,
    pub source_text_length: i32,
    pub generation_duration: i32,
}

/// A generation together with the flashcards that reference it.
#[derive(Debug, Clone)]
pub struct GenerationDetail {
    pub generation: Generation,
    pub flashcards: Vec<Flashcard>,
}

/// Append-only diagnostic record for a failed generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGenerationErrorLog {
    pub user_id: Uuid,
    pub error_code: String,
    pub error_message: String,
    pub model: String,
    pub source_text_hash: String,
    pub source_text_length: i32,
}

/// An AI-suggested front/back pair that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
}

/// What a successful generation hands back to the caller.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub generation_id: GenerationId,
    pub proposals: Vec<Proposal>,
    pub generated_count: usize,
}

//=========================================================================================
// Flashcards
//=========================================================================================

/// Where a flashcard came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashcardSource {
    /// Authored by the user, never linked to a generation.
    Manual,
    /// Accepted verbatim from a generation.
    AiFull,
    /// Originated from a generation but edited before acceptance.
    AiEdited,
}

impl FlashcardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AiFull => "ai-full",
            Self::AiEdited => "ai-edited",
        }
    }

    /// Whether cards of this source must reference a generation.
    pub fn requires_generation(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for FlashcardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlashcardSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "ai-full" => Ok(Self::AiFull),
            "ai-edited" => Ok(Self::AiEdited),
            other => Err(format!("unknown flashcard source '{}'", other)),
        }
    }
}

/// A single question/answer pair owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub user_id: Uuid,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<GenerationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item of a create batch, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<GenerationId>,
}

/// A partial update as submitted by the caller. At least one field must be set.
///
/// `generation_id` is doubly optional: `None` leaves it untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlashcardPatch {
    pub front: Option<String>,
    pub back: Option<String>,
    pub source: Option<FlashcardSource>,
    pub generation_id: Option<Option<GenerationId>>,
}

impl FlashcardPatch {
    pub fn is_empty(&self) -> bool {
        self.front.is_none()
            && self.back.is_none()
            && self.source.is_none()
            && self.generation_id.is_none()
    }
}

/// The fully resolved column values written by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardChanges {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<GenerationId>,
}

//=========================================================================================
// Listing
//=========================================================================================

/// Columns a flashcard listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Front,
    Back,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            other => Err(format!("cannot sort by '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// A 1-indexed page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 100;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Filters, ordering and window for a flashcard listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlashcardQuery {
    pub window: PageRequest,
    pub sort: SortField,
    pub order: SortOrder,
    pub source: Option<FlashcardSource>,
    pub generation_id: Option<GenerationId>,
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
