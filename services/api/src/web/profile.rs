//! services/api/src/web/profile.rs
//!
//! The signed-in user's profile, referral codes and course wishes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use bizchinese_core::invite::{generate_invite_code, invite_link};
use bizchinese_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;
use crate::web::views::{InviteCodeView, UserView, WishView};

/// Fresh codes to try before giving up on collisions.
const INVITE_CODE_ATTEMPTS: usize = 5;
const MAX_WISH_TITLE_CHARS: usize = 200;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserView,
    pub enrolled_courses: usize,
    pub completed_courses: usize,
}

#[derive(Serialize, ToSchema)]
pub struct CreateInviteResponse {
    pub code: String,
    pub link: String,
}

#[derive(Serialize, ToSchema)]
pub struct InviteListResponse {
    pub codes: Vec<InviteCodeView>,
    pub used_count: usize,
    pub invite_quota: i32,
    pub invited_count: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateWishRequest {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WishListResponse {
    pub wishes: Vec<WishView>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /profile - The signed-in user with plan and course counts
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (user, enrollments) = tokio::try_join!(
        state.db.get_user(user_id),
        state.db.list_enrollments(user_id),
    )
    .map_err(|e| HttpError::from_port("Failed to load profile", e))?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        enrolled_courses: enrollments.len(),
        completed_courses: enrollments.iter().filter(|e| e.is_completed).count(),
    }))
}

/// POST /invites - Generate a new referral code
#[utoipa::path(
    post,
    path = "/invites",
    responses(
        (status = 201, description = "Code created", body = CreateInviteResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_invite_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let code = generate_invite_code();
        match state.db.create_invite_code(user_id, &code).await {
            Ok(invite) => {
                info!("User {} generated invite code {}", user_id, invite.code);
                let link = invite_link(&state.config.app_url, &invite.code);
                return Ok((
                    StatusCode::CREATED,
                    Json(CreateInviteResponse {
                        code: invite.code,
                        link,
                    }),
                ));
            }
            Err(PortError::Conflict(_)) => warn!("Invite code collision on {}, retrying", code),
            Err(e) => return Err(HttpError::from_port("Failed to create invite code", e)),
        }
    }
    Err(HttpError::from_port(
        "Failed to create invite code",
        PortError::Unexpected("no free invite code after retries".to_string()),
    ))
}

/// GET /invites - The user's referral codes
#[utoipa::path(
    get,
    path = "/invites",
    responses(
        (status = 200, description = "Codes, newest first", body = InviteListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_invites_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (user, codes) = tokio::try_join!(
        state.db.get_user(user_id),
        state.db.list_invite_codes(user_id),
    )
    .map_err(|e| HttpError::from_port("Failed to list invite codes", e))?;

    Ok(Json(InviteListResponse {
        used_count: codes.iter().filter(|c| c.is_used).count(),
        codes: codes.into_iter().map(Into::into).collect(),
        invite_quota: user.invite_quota,
        invited_count: user.invited_count,
    }))
}

/// POST /wishes - Ask for a course that does not exist yet
#[utoipa::path(
    post,
    path = "/wishes",
    request_body = CreateWishRequest,
    responses(
        (status = 201, description = "Wish saved", body = WishView),
        (status = 400, description = "Missing title or category"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_wish_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateWishRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let title = req.title.trim();
    let category = req.category.trim();
    if title.is_empty() || category.is_empty() {
        return Err(HttpError::bad_request("Title and category are required"));
    }
    if title.chars().count() > MAX_WISH_TITLE_CHARS {
        return Err(HttpError::bad_request("Title is too long"));
    }
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let wish = state
        .db
        .create_wish(user_id, title, category, description)
        .await
        .map_err(|e| HttpError::from_port("Failed to save wish", e))?;

    Ok((StatusCode::CREATED, Json(WishView::from(wish))))
}

/// GET /wishes - The user's course wishes
#[utoipa::path(
    get,
    path = "/wishes",
    responses(
        (status = 200, description = "Wishes, newest first", body = WishListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_wishes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let wishes = state
        .db
        .list_wishes(user_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to list wishes", e))?;
    Ok(Json(WishListResponse {
        wishes: wishes.into_iter().map(Into::into).collect(),
    }))
}
