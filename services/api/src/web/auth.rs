//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bizchinese_core::domain::AuthSession;
use bizchinese_core::invite::normalize_invite_code;
use bizchinese_core::ports::PortError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::{session_cookie, session_id, session_lifetime, CLEARED_SESSION_COOKIE};
use crate::web::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// A referral code from another user.
    #[serde(default)]
    pub invite_code: Option<String>,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_redeemed: Option<bool>,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Opens a new auth session and returns the cookie that carries it.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, HttpError> {
    let auth_session = AuthSession {
        id: Uuid::new_v4().to_string(),
        user_id,
        expires_at: Utc::now() + session_lifetime(),
    };
    let cookie = session_cookie(&auth_session.id);
    state
        .db
        .create_auth_session(auth_session)
        .await
        .map_err(|e| HttpError::from_port("Failed to create auth session", e))?;
    Ok(cookie)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let email = normalize_email(&req.email);
    if !email.contains('@') {
        return Err(HttpError::bad_request("A valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(HttpError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal()
        })?
        .to_string();

    let user = state
        .db
        .create_user(&email, &password_hash)
        .await
        .map_err(|e| HttpError::from_port("Failed to create user", e))?;
    info!("Created user {}", user.id);

    // A bad invite code never blocks signup.
    let invite_redeemed = match req.invite_code.as_deref().and_then(normalize_invite_code) {
        Some(code) => match state.db.redeem_invite_code(&code, user.id).await {
            Ok(true) => {
                info!("User {} redeemed invite code {}", user.id, code);
                Some(true)
            }
            Ok(false) => {
                warn!("Invite code {} is unknown or already used", code);
                Some(false)
            }
            Err(e) => {
                error!("Failed to redeem invite code {}: {:?}", code, e);
                Some(false)
            }
        },
        None => None,
    };

    let cookie = start_session(&state, user.id).await?;
    let response = AuthResponse {
        user_id: user.id,
        email: user.email,
        invite_redeemed,
    };
    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let invalid = || HttpError::new(StatusCode::UNAUTHORIZED, "Invalid email or password");

    let user_creds = match state.db.get_user_by_email(&normalize_email(&req.email)).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(HttpError::from_port("Failed to get user", e)),
    };

    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal()
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let cookie = start_session(&state, user_creds.user_id).await?;
    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
        invite_redeemed: None,
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let auth_session_id = session_id(&headers)
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "No session found"))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to delete auth session", e))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, CLEARED_SESSION_COOKIE.to_string())],
        Json(serde_json::json!({ "success": true })),
    ))
}
