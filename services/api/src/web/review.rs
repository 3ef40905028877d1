//! services/api/src/web/review.rs
//!
//! Spaced-repetition answers, the daily review queue and achievements.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use bizchinese_core::achievements::{streak_days, Achievements, Milestone, MilestoneKind};
use bizchinese_core::scheduling::{
    estimated_review_minutes, review_window_end, ProgressUpdate, ReviewAnswer,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;
use crate::web::views::{ProgressView, ReviewItemView};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ProgressRequest {
    pub word_id: i32,
    pub known: bool,
    /// `true` when answering from the review queue.
    #[serde(default)]
    pub is_review: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub success: bool,
    pub progress: ProgressView,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewQueueResponse {
    pub total: usize,
    pub words: Vec<ReviewItemView>,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewSourceView {
    pub course_title: String,
    pub course_slug: String,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewSummaryResponse {
    pub due_count: i64,
    pub sources: Vec<ReviewSourceView>,
    pub mastered_count: i64,
    pub estimated_minutes: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MilestoneView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub target: i64,
    /// `words_mastered` or `streak_days`.
    pub kind: &'static str,
    pub icon: &'static str,
}

impl From<Milestone> for MilestoneView {
    fn from(m: Milestone) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            target: m.target,
            kind: match m.kind {
                MilestoneKind::WordsMastered => "words_mastered",
                MilestoneKind::StreakDays => "streak_days",
            },
            icon: m.icon,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AchievementsResponse {
    pub streak_days: i64,
    pub total_mastered: i64,
    pub milestones: Vec<MilestoneView>,
    pub next_milestone: Option<MilestoneView>,
    pub encouragement: String,
}

impl From<Achievements> for AchievementsResponse {
    fn from(a: Achievements) -> Self {
        Self {
            streak_days: a.streak_days,
            total_mastered: a.total_mastered,
            milestones: a.milestones.into_iter().map(Into::into).collect(),
            next_milestone: a.next_milestone.map(Into::into),
            encouragement: a.encouragement,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /progress - Record an answer and schedule the next review
#[utoipa::path(
    post,
    path = "/progress",
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress saved", body = ProgressResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Word not found")
    )
)]
pub async fn record_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<impl IntoResponse, HttpError> {
    if req.word_id <= 0 {
        return Err(HttpError::bad_request("Invalid word ID"));
    }

    let update = ProgressUpdate::from_answer(ReviewAnswer::new(req.is_review, req.known), Utc::now());
    let progress = state
        .db
        .record_answer(user_id, req.word_id, &update)
        .await
        .map_err(|e| HttpError::from_port("Failed to record progress", e))?;

    Ok(Json(ProgressResponse {
        success: true,
        progress: progress.into(),
    }))
}

/// GET /review - Words due for review today
#[utoipa::path(
    get,
    path = "/review",
    responses(
        (status = 200, description = "Due words, oldest first", body = ReviewQueueResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn review_queue_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let due = state
        .db
        .due_reviews(user_id, review_window_end(Utc::now()))
        .await
        .map_err(|e| HttpError::from_port("Failed to load review queue", e))?;

    Ok(Json(ReviewQueueResponse {
        total: due.len(),
        words: due.into_iter().map(Into::into).collect(),
    }))
}

/// GET /review/summary - Due count, where the words come from, and time needed
#[utoipa::path(
    get,
    path = "/review/summary",
    responses(
        (status = 200, description = "Review summary", body = ReviewSummaryResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn review_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let window_end = review_window_end(Utc::now());
    let (sources, mastered_count) = tokio::try_join!(
        state.db.review_sources(user_id, window_end),
        state.db.count_mastered(user_id),
    )
    .map_err(|e| HttpError::from_port("Failed to load review summary", e))?;

    let due_count = sources.iter().map(|s| s.count).sum();
    Ok(Json(ReviewSummaryResponse {
        due_count,
        sources: sources
            .into_iter()
            .map(|s| ReviewSourceView {
                course_title: s.course_title,
                course_slug: s.course_slug,
                count: s.count,
            })
            .collect(),
        mastered_count,
        estimated_minutes: estimated_review_minutes(due_count),
    }))
}

/// GET /achievements - Milestones, streak and encouragement
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Achievements", body = AchievementsResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn achievements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (total_mastered, activity) = tokio::try_join!(
        state.db.count_mastered(user_id),
        state.db.activity_dates(user_id),
    )
    .map_err(|e| HttpError::from_port("Failed to load achievements", e))?;

    let streak = streak_days(&activity, Utc::now().date_naive());
    Ok(Json(AchievementsResponse::from(Achievements::evaluate(
        total_mastered,
        streak,
    ))))
}
