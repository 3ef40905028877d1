//! services/api/src/web/practice.rs
//!
//! Saves finished practice sessions and advances course progress.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use bizchinese_core::domain::{NewPracticeRecord, PracticeMode};
use bizchinese_core::scheduling::{ProgressUpdate, ReviewAnswer};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;
use crate::web::views::PracticeRecordView;

#[derive(Deserialize, ToSchema)]
pub struct WordResult {
    pub word_id: i32,
    pub known: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct PracticeRecordRequest {
    pub course_slug: String,
    /// One of `picture-match`, `tone-practice`, `translation`, `dictation`.
    pub mode: String,
    pub correct_count: i32,
    pub total_count: i32,
    /// Seconds spent.
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub word_results: Vec<WordResult>,
}

#[derive(Serialize, ToSchema)]
pub struct PracticeRecordResponse {
    pub success: bool,
    pub record: PracticeRecordView,
    /// Course progress after this session; absent when not enrolled.
    pub progress: Option<i32>,
    pub words_recorded: usize,
    pub message: String,
}

/// POST /practice/record - Save a finished practice session
#[utoipa::path(
    post,
    path = "/practice/record",
    request_body = PracticeRecordRequest,
    responses(
        (status = 200, description = "Record saved", body = PracticeRecordResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn record_practice_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<PracticeRecordRequest>,
) -> Result<impl IntoResponse, HttpError> {
    if req.course_slug.trim().is_empty() {
        return Err(HttpError::bad_request("Missing required fields"));
    }
    let mode = PracticeMode::parse(&req.mode)
        .ok_or_else(|| HttpError::bad_request(format!("Unknown practice mode '{}'", req.mode)))?;
    if req.correct_count < 0 || req.total_count < 0 || req.correct_count > req.total_count {
        return Err(HttpError::bad_request("Invalid answer counts"));
    }

    let course = state
        .db
        .get_course_by_slug(&req.course_slug)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course", e))?;

    let record = state
        .db
        .save_practice_record(NewPracticeRecord {
            user_id,
            course_id: course.id,
            mode,
            duration: req.duration,
            correct_count: req.correct_count,
            total_count: req.total_count,
        })
        .await
        .map_err(|e| HttpError::from_port("Failed to save practice record", e))?;

    let now = Utc::now();
    let progress = state
        .db
        .advance_enrollment(user_id, course.id, now)
        .await
        .map_err(|e| HttpError::from_port("Failed to update course progress", e))?;

    // Per-word answers are best effort.
    let mut words_recorded = 0;
    for result in &req.word_results {
        let update = ProgressUpdate::from_answer(ReviewAnswer::new(false, result.known), now);
        match state.db.record_answer(user_id, result.word_id, &update).await {
            Ok(_) => words_recorded += 1,
            Err(e) => error!("Failed to record word {} for user {}: {:?}", result.word_id, user_id, e),
        }
    }

    info!(
        "User {} finished {} on {} ({}/{})",
        user_id,
        mode.as_str(),
        course.slug,
        req.correct_count,
        req.total_count
    );

    Ok(Json(PracticeRecordResponse {
        success: true,
        record: record.into(),
        progress,
        words_recorded,
        message: "Practice record saved successfully".to_string(),
    }))
}
