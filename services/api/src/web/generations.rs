//! services/api/src/web/generations.rs
//!
//! Handlers for requesting AI flashcard proposals and browsing past generations.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use flashcards_core::validation::{validate_page_request, validate_source_text};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    ErrorResponse, GenerateFlashcardsRequest, GenerationCreateResponse, GenerationDetailDto,
    GenerationsListParams, GenerationsListResponse, PaginationDto,
};
use crate::web::rest::{core_error_response, error_response, positive_id, RestError};
use crate::web::state::AppState;

/// Generate flashcard proposals from a block of text.
///
/// The proposals are not saved as flashcards; the client accepts them later through
/// `POST /flashcards`.
#[utoipa::path(
    post,
    path = "/generations",
    request_body = GenerateFlashcardsRequest,
    responses(
        (status = 201, description = "Proposals generated", body = GenerationCreateResponse),
        (status = 400, description = "Source text missing or out of range", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Generation or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_generation_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    body: Result<Json<GenerateFlashcardsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(req) =
        body.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    validate_source_text(&req.source_text).map_err(core_error_response)?;

    let outcome = state
        .generations
        .generate(user_id, &req.source_text)
        .await
        .map_err(core_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(GenerationCreateResponse::from(outcome)),
    ))
}

/// List the caller's generations that produced at least one accepted flashcard.
#[utoipa::path(
    get,
    path = "/generations",
    params(GenerationsListParams),
    responses(
        (status = 200, description = "A page of generations", body = GenerationsListResponse),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn list_generations_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    params: Result<Query<GenerationsListParams>, QueryRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Query(params) =
        params.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    let window =
        validate_page_request(params.page, params.limit).map_err(core_error_response)?;

    let page = state
        .generations
        .list(user_id, window)
        .await
        .map_err(core_error_response)?;

    Ok(Json(GenerationsListResponse {
        pagination: PaginationDto::new(window, page.total),
        data: page.items.into_iter().map(Into::into).collect(),
    }))
}

/// Fetch one generation with the flashcards that were accepted from it.
#[utoipa::path(
    get,
    path = "/generations/{id}",
    params(("id" = i64, Path, description = "Generation id")),
    responses(
        (status = 200, description = "The generation and its flashcards", body = GenerationDetailDto),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "No such generation for this user", body = ErrorResponse)
    )
)]
pub async fn get_generation_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Path(id) = id.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    let id = positive_id(id)?;

    let detail = state
        .generations
        .detail(user_id, id)
        .await
        .map_err(core_error_response)?;

    Ok(Json(GenerationDetailDto::from(detail)))
}
