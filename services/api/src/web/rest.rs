//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the translation of
//! core errors into HTTP responses shared by all REST handlers.

use crate::web::dto::{
    AuthResponse, CreateFlashcardsRequest, CreateFlashcardsResponse, ErrorResponse,
    FlashcardCreateItem, FlashcardDto, FlashcardsListResponse, GenerateFlashcardsRequest,
    GenerationCreateResponse, GenerationDetailDto, GenerationDto, GenerationsListResponse,
    LoginRequest, PaginationDto, ProposalDto, RegisterRequest, SourceDto, UpdateFlashcardRequest,
};
use crate::web::{auth, flashcards, generations};
use axum::{http::StatusCode, Json};
use flashcards_core::CoreError;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        generations::create_generation_handler,
        generations::list_generations_handler,
        generations::get_generation_handler,
        flashcards::list_flashcards_handler,
        flashcards::create_flashcards_handler,
        flashcards::get_flashcard_handler,
        flashcards::update_flashcard_handler,
        flashcards::delete_flashcard_handler,
    ),
    components(
        schemas(
            ErrorResponse, PaginationDto, SourceDto,
            RegisterRequest, LoginRequest, AuthResponse,
            GenerateFlashcardsRequest, ProposalDto, GenerationCreateResponse,
            GenerationDto, GenerationDetailDto, GenerationsListResponse,
            FlashcardDto, FlashcardCreateItem, CreateFlashcardsRequest, CreateFlashcardsResponse,
            UpdateFlashcardRequest, FlashcardsListResponse,
        )
    ),
    tags(
        (name = "Flashcards API", description = "Generate flashcard proposals from text and curate a personal deck.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Translation
//=========================================================================================

/// The error half of every handler's `Result`.
pub type RestError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> RestError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Maps a core error to a status and a client-safe message. Server-side failures are
/// logged in full and answered with an opaque message.
pub fn core_error_response(err: CoreError) -> RestError {
    match err {
        CoreError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        CoreError::Auth => error_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
        CoreError::NotFound(message) => error_response(StatusCode::NOT_FOUND, message),
        CoreError::ReferentialIntegrity { missing } => {
            warn!(?missing, "Rejected reference to unknown generations.");
            error_response(
                StatusCode::BAD_REQUEST,
                "One or more generation_id values do not exist",
            )
        }
        e @ CoreError::Provider(_) => {
            error!(code = e.code(), "Flashcard generation failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate flashcards",
            )
        }
        e @ CoreError::Storage { .. } => {
            error!(code = e.code(), "Storage failure: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Rejects non-positive path ids before they reach the engines.
pub fn positive_id(id: i64) -> Result<i64, RestError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(error_response(
            StatusCode::BAD_REQUEST,
            "id must be a positive integer",
        ))
    }
}
