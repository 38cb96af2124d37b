//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API and their mapping from the
//! core domain types.

use chrono::{DateTime, Utc};
use flashcards_core::domain::{
    Flashcard, FlashcardPatch, FlashcardSource, Generation, GenerationDetail,
    GenerationOutcome, NewFlashcard, PageRequest, Proposal,
};
use flashcards_core::pagination::total_pages;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Shared
//=========================================================================================

/// Body of every error response. Details stay in the server logs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct PaginationDto {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    /// Never less than one, so an empty listing still has a first page.
    pub total_pages: u64,
}

impl PaginationDto {
    pub fn new(window: PageRequest, total: u64) -> Self {
        Self {
            page: window.page,
            limit: window.limit,
            total,
            total_pages: total_pages(total, window.limit),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceDto {
    Manual,
    AiFull,
    AiEdited,
}

impl From<SourceDto> for FlashcardSource {
    fn from(source: SourceDto) -> Self {
        match source {
            SourceDto::Manual => Self::Manual,
            SourceDto::AiFull => Self::AiFull,
            SourceDto::AiEdited => Self::AiEdited,
        }
    }
}

impl From<FlashcardSource> for SourceDto {
    fn from(source: FlashcardSource) -> Self {
        match source {
            FlashcardSource::Manual => Self::Manual,
            FlashcardSource::AiFull => Self::AiFull,
            FlashcardSource::AiEdited => Self::AiEdited,
        }
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

//=========================================================================================
// Generations
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateFlashcardsRequest {
    pub source_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProposalDto {
    pub front: String,
    pub back: String,
    pub source: SourceDto,
}

impl From<Proposal> for ProposalDto {
    fn from(p: Proposal) -> Self {
        Self {
            front: p.front,
            back: p.back,
            source: p.source.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerationCreateResponse {
    pub generation_id: i64,
    pub flashcards_proposals: Vec<ProposalDto>,
    pub generated_count: usize,
}

impl From<GenerationOutcome> for GenerationCreateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            generation_id: outcome.generation_id,
            generated_count: outcome.generated_count,
            flashcards_proposals: outcome.proposals.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerationDto {
    pub id: i64,
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

impl From<Generation> for GenerationDto {
    fn from(g: Generation) -> Self {
        Self {
            id: g.id,
            model: g.model,
            generated_count: g.generated_count,
            accepted_unedited_count: g.accepted_unedited_count,
            accepted_edited_count: g.accepted_edited_count,
            source_text_hash: g.source_text_hash,
            source_text_length: g.source_text_length,
            generation_duration: g.generation_duration,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerationDetailDto {
    #[serde(flatten)]
    pub generation: GenerationDto,
    pub flashcards: Vec<FlashcardDto>,
}

impl From<GenerationDetail> for GenerationDetailDto {
    fn from(detail: GenerationDetail) -> Self {
        Self {
            generation: detail.generation.into(),
            flashcards: detail.flashcards.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerationsListResponse {
    pub data: Vec<GenerationDto>,
    pub pagination: PaginationDto,
}

#[derive(Deserialize, IntoParams)]
pub struct GenerationsListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

//=========================================================================================
// Flashcards
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct FlashcardDto {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub source: SourceDto,
    pub generation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Flashcard> for FlashcardDto {
    fn from(f: Flashcard) -> Self {
        Self {
            id: f.id,
            front: f.front,
            back: f.back,
            source: f.source.into(),
            generation_id: f.generation_id,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct FlashcardCreateItem {
    pub front: String,
    pub back: String,
    pub source: SourceDto,
    #[serde(default)]
    pub generation_id: Option<i64>,
}

impl From<FlashcardCreateItem> for NewFlashcard {
    fn from(item: FlashcardCreateItem) -> Self {
        Self {
            front: item.front,
            back: item.back,
            source: item.source.into(),
            generation_id: item.generation_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFlashcardsRequest {
    pub flashcards: Vec<FlashcardCreateItem>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateFlashcardsResponse {
    pub flashcards: Vec<FlashcardDto>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateFlashcardRequest {
    pub front: Option<String>,
    pub back: Option<String>,
    pub source: Option<SourceDto>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>)]
    pub generation_id: Option<Option<i64>>,
}

impl From<UpdateFlashcardRequest> for FlashcardPatch {
    fn from(req: UpdateFlashcardRequest) -> Self {
        Self {
            front: req.front,
            back: req.back,
            source: req.source.map(Into::into),
            generation_id: req.generation_id,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardsListResponse {
    pub data: Vec<FlashcardDto>,
    pub pagination: PaginationDto,
}

#[derive(Deserialize, IntoParams)]
pub struct FlashcardsListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// One of `created_at`, `updated_at`, `front`, `back`.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
    /// `manual`, `ai-full` or `ai-edited`.
    pub source: Option<String>,
    pub generation_id: Option<i64>,
}

impl From<FlashcardsListParams> for flashcards_core::validation::FlashcardQueryParams {
    fn from(p: FlashcardsListParams) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            sort: p.sort,
            order: p.order,
            source: p.source,
            generation_id: p.generation_id,
        }
    }
}
