//! services/api/src/web/analyze.rs
//!
//! Turns pasted text into a list of new words the user could build a course from.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use bizchinese_core::analysis::{
    detect_mode, rank_new_words, suggested_course_title, validate_text, AnalysisMode,
    SuggestedWord, MASTERED_THRESHOLD,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct SuggestedWordView {
    pub id: i32,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub frequency: usize,
}

impl From<SuggestedWord> for SuggestedWordView {
    fn from(w: SuggestedWord) -> Self {
        Self {
            id: w.id,
            chinese: w.chinese,
            pinyin: w.pinyin,
            english: w.english,
            frequency: w.frequency,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeTextResponse {
    pub success: bool,
    /// `extract` for Chinese text, `recommend` for a described need.
    pub mode: &'static str,
    pub total_chars: usize,
    pub extracted_count: usize,
    pub matched_count: usize,
    pub new_words_count: usize,
    pub new_words: Vec<SuggestedWordView>,
    pub suggested_course_title: String,
}

/// POST /analyze-text - Extract or recommend words for a custom course
#[utoipa::path(
    post,
    path = "/analyze-text",
    request_body = AnalyzeTextRequest,
    responses(
        (status = 200, description = "Suggested words", body = AnalyzeTextResponse),
        (status = 400, description = "Invalid text or nothing found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn analyze_text_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let text = req.text;
    validate_text(&text).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mode = detect_mode(&text);
    let extracted = match mode {
        AnalysisMode::Extract => state.vocab.extract_words(&text).await,
        AnalysisMode::Recommend => state.vocab.recommend_words(&text).await,
    }
    .map_err(|e| HttpError::from_port("Failed to analyze text", e))?;

    if extracted.is_empty() {
        return Err(HttpError::bad_request(match mode {
            AnalysisMode::Extract => "No Chinese words found in text",
            AnalysisMode::Recommend => {
                "Could not generate word recommendations. Please try a different description."
            }
        }));
    }

    let (matched, mastered) = tokio::try_join!(
        state.db.words_by_chinese(&extracted),
        state.db.mastered_word_ids(user_id, MASTERED_THRESHOLD),
    )
    .map_err(|e| HttpError::from_port("Failed to match words", e))?;
    let mastered: HashSet<i32> = mastered.into_iter().collect();

    let new_words_count = matched.iter().filter(|w| !mastered.contains(&w.id)).count();
    let new_words = rank_new_words(&extracted, &matched, &mastered);
    info!(
        "Analyzed text for user {}: {} extracted, {} matched, {} new",
        user_id,
        extracted.len(),
        matched.len(),
        new_words_count
    );

    Ok(Json(AnalyzeTextResponse {
        success: true,
        mode: match mode {
            AnalysisMode::Extract => "extract",
            AnalysisMode::Recommend => "recommend",
        },
        total_chars: text.chars().count(),
        extracted_count: extracted.len(),
        matched_count: matched.len(),
        new_words_count,
        new_words: new_words.into_iter().map(Into::into).collect(),
        suggested_course_title: suggested_course_title(mode, &text, Utc::now().date_naive()),
    }))
}
