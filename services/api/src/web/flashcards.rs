//! services/api/src/web/flashcards.rs
//!
//! CRUD handlers for the caller's flashcard deck.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use flashcards_core::domain::{FlashcardPatch, NewFlashcard};
use flashcards_core::validation::FlashcardQueryParams;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    CreateFlashcardsRequest, CreateFlashcardsResponse, ErrorResponse, FlashcardDto,
    FlashcardsListParams, FlashcardsListResponse, PaginationDto, UpdateFlashcardRequest,
};
use crate::web::rest::{core_error_response, error_response, positive_id, RestError};
use crate::web::state::AppState;

fn bad_request(message: String) -> RestError {
    error_response(StatusCode::BAD_REQUEST, message)
}

fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, RestError> {
    let Path(id) = id.map_err(|e| bad_request(e.body_text()))?;
    positive_id(id)
}

/// List the caller's flashcards with paging, sorting and filters.
#[utoipa::path(
    get,
    path = "/flashcards",
    params(FlashcardsListParams),
    responses(
        (status = 200, description = "A page of flashcards", body = FlashcardsListResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn list_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    params: Result<Query<FlashcardsListParams>, QueryRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let query = FlashcardQueryParams::from(params)
        .validate()
        .map_err(core_error_response)?;

    let page = state
        .curation
        .list(user_id, &query)
        .await
        .map_err(core_error_response)?;

    Ok(Json(FlashcardsListResponse {
        pagination: PaginationDto::new(query.window, page.total),
        data: page.items.into_iter().map(Into::into).collect(),
    }))
}

/// Save a batch of flashcards: hand-written ones or accepted AI proposals.
#[utoipa::path(
    post,
    path = "/flashcards",
    request_body = CreateFlashcardsRequest,
    responses(
        (status = 201, description = "Flashcards created", body = CreateFlashcardsResponse),
        (status = 400, description = "Invalid flashcard or unknown generation_id", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    body: Result<Json<CreateFlashcardsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let items: Vec<NewFlashcard> = req.flashcards.into_iter().map(Into::into).collect();

    let created = state
        .curation
        .create_batch(user_id, &items)
        .await
        .map_err(core_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateFlashcardsResponse {
            flashcards: created.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/flashcards/{id}",
    params(("id" = i64, Path, description = "Flashcard id")),
    responses(
        (status = 200, description = "The flashcard", body = FlashcardDto),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "No such flashcard for this user", body = ErrorResponse)
    )
)]
pub async fn get_flashcard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, RestError> {
    let id = path_id(id)?;
    let card = state
        .curation
        .get(user_id, id)
        .await
        .map_err(core_error_response)?;
    Ok(Json(FlashcardDto::from(card)))
}

/// Partially update a flashcard. Editing the text of an `ai-full` card relabels it
/// `ai-edited`.
#[utoipa::path(
    put,
    path = "/flashcards/{id}",
    params(("id" = i64, Path, description = "Flashcard id")),
    request_body = UpdateFlashcardRequest,
    responses(
        (status = 200, description = "The updated flashcard", body = FlashcardDto),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "No such flashcard for this user", body = ErrorResponse)
    )
)]
pub async fn update_flashcard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateFlashcardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let id = path_id(id)?;
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let patch = FlashcardPatch::from(req);

    let card = state
        .curation
        .update(user_id, id, &patch)
        .await
        .map_err(core_error_response)?;
    Ok(Json(FlashcardDto::from(card)))
}

#[utoipa::path(
    delete,
    path = "/flashcards/{id}",
    params(("id" = i64, Path, description = "Flashcard id")),
    responses(
        (status = 204, description = "Flashcard deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "No such flashcard for this user", body = ErrorResponse)
    )
)]
pub async fn delete_flashcard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, RestError> {
    let id = path_id(id)?;
    let deleted = state
        .curation
        .delete(user_id, id)
        .await
        .map_err(core_error_response)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Flashcard {} not found", id),
        ))
    }
}
