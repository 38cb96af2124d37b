//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::dto::ErrorResponse;
use crate::web::state::AppState;
use flashcards_core::ports::PortError;

pub const SESSION_COOKIE: &str = "session";

/// Pulls the auth session id out of the `Cookie` header, if there is one.
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_session_id) = session_id(req.headers()) else {
        return unauthorized();
    };

    let user_id = match state.identity.current_user(auth_session_id).await {
        Ok(user_id) => user_id,
        Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
            debug!("Rejected expired or unknown auth session.");
            return unauthorized();
        }
        Err(e) => {
            error!("Failed to validate auth session: {:?}", e);
            return unauthorized();
        }
    };

    req.extensions_mut().insert(user_id);
    next.run(req).await
}
