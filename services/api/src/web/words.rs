//! services/api/src/web/words.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bizchinese_core::courses::{is_word_bank_category, WORD_BANK_PAGE_SIZE};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::HttpError;
use crate::web::state::AppState;
use crate::web::views::WordView;

#[derive(Serialize, ToSchema)]
pub struct WordBankResponse {
    pub category: String,
    pub words: Vec<WordView>,
}

/// GET /wordbanks/{category} - A page of words from one word bank
#[utoipa::path(
    get,
    path = "/wordbanks/{category}",
    params(("category" = String, Path, description = "business, hsk1 .. hsk6")),
    responses(
        (status = 200, description = "Words ordered by frequency", body = WordBankResponse),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn word_bank_handler(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    if !is_word_bank_category(&category) {
        return Err(HttpError::bad_request("Invalid category"));
    }

    let words = state
        .db
        .words_by_category(&category, WORD_BANK_PAGE_SIZE)
        .await
        .map_err(|e| HttpError::from_port("Failed to load word bank", e))?;

    Ok(Json(WordBankResponse {
        category,
        words: words.into_iter().map(Into::into).collect(),
    }))
}
