//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes, plus the session cookie helpers
//! shared with the auth handlers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use bizchinese_core::ports::PortError;
use chrono::Duration;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

/// How long a login lasts.
pub fn session_lifetime() -> Duration {
    Duration::days(30)
}

pub fn session_cookie(auth_session_id: &str) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        session_lifetime().num_seconds()
    )
}

pub const CLEARED_SESSION_COOKIE: &str =
    "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

/// Pulls the session id out of the `Cookie` header.
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Resolves the signed-in user for routes that also serve anonymous visitors.
pub async fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    let auth_session_id = session_id(headers)?;
    match state.db.validate_auth_session(auth_session_id).await {
        Ok(user_id) => Some(user_id),
        Err(PortError::Unauthorized) => None,
        Err(e) => {
            error!("Failed to validate auth session: {:?}", e);
            None
        }
    }
}

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let auth_session_id = session_id(req.headers()).ok_or_else(HttpError::unauthorized)?;

    let user_id = state
        .db
        .validate_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            if !matches!(e, PortError::Unauthorized) {
                error!("Failed to validate auth session: {:?}", e);
            }
            HttpError::unauthorized()
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
