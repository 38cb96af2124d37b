//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use flashcards_core::domain::AuthSession;
use flashcards_core::ports::PortError;
use flashcards_core::validation::{validate_email, validate_new_password};
use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::identity::SESSION_LIFETIME_DAYS;
use crate::web::dto::{AuthResponse, ErrorResponse, LoginRequest, RegisterRequest};
use crate::web::middleware::{session_id, SESSION_COOKIE};
use crate::web::rest::{core_error_response, error_response, RestError};
use crate::web::state::AppState;

//=========================================================================================
// Helpers
//=========================================================================================

fn session_cookie(session: &AuthSession) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session.id,
        chrono::Duration::days(SESSION_LIFETIME_DAYS).num_seconds()
    )
}

fn identity_error(e: PortError, action: &str) -> RestError {
    match e {
        PortError::Unauthorized => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid email or password")
        }
        PortError::Conflict(_) => {
            error_response(StatusCode::CONFLICT, "Email is already registered")
        }
        e => {
            error!("Failed to {}: {:?}", action, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Login runs the registration email rules; the password only has to be present.
fn validate_login(email: &str, password: &str) -> Result<(), RestError> {
    validate_email(email).map_err(core_error_response)?;
    if password.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Password is required",
        ));
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(req) =
        body.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    let email = req.email.trim().to_lowercase();
    validate_email(&email).map_err(core_error_response)?;
    validate_new_password(&req.password).map_err(core_error_response)?;

    let (user, session) = state
        .identity
        .sign_up(&email, &req.password)
        .await
        .map_err(|e| identity_error(e, "register user"))?;
    info!(user_id = %user.user_id, "User registered.");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session))],
        Json(AuthResponse {
            user_id: user.user_id,
            email: user.email,
        }),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Malformed email or missing password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(req) =
        body.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    let email = req.email.trim().to_lowercase();
    validate_login(&email, &req.password)?;

    let (user, session) = state
        .identity
        .sign_in(&email, &req.password)
        .await
        .map_err(|e| identity_error(e, "log in"))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&session))],
        Json(AuthResponse {
            user_id: user.user_id,
            email: user.email,
        }),
    ))
}

/// POST /auth/logout - Invalidate the current session, if any
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, RestError> {
    if let Some(auth_session_id) = session_id(&headers) {
        state
            .identity
            .sign_out(auth_session_id)
            .await
            .map_err(|e| identity_error(e, "log out"))?;
    }

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
