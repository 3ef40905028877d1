//! crates/bizchinese_core/src/courses.rs
//!
//! Course catalog rules: word-bank categories, user-generated courses and
//! enrollment progress.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::NewCourse;

pub const WORD_BANK_CATEGORIES: [&str; 7] = ["business", "hsk1", "hsk2", "hsk3", "hsk4", "hsk5", "hsk6"];
pub const WORD_BANK_PAGE_SIZE: i64 = 10;

pub const CUSTOM_COURSE_CATEGORY: &str = "custom";
pub const MAX_CUSTOM_COURSE_WORDS: usize = 50;
pub const MAX_COURSE_TITLE_CHARS: usize = 100;
pub const MAX_SOURCE_TEXT_CHARS: usize = 10_000;

/// Progress added to an enrollment for every finished practice session.
pub const PROGRESS_PER_PRACTICE: i32 = 5;
pub const MAX_PROGRESS: i32 = 100;

pub fn is_word_bank_category(category: &str) -> bool {
    WORD_BANK_CATEGORIES.contains(&category)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomCourseError {
    #[error("Title and at least one word are required")]
    Empty,
    #[error("Maximum 50 words per course")]
    TooManyWords,
}

/// URL identifier for a user-generated course: unique per user and millisecond.
pub fn custom_course_slug(user_id: Uuid, now: DateTime<Utc>) -> String {
    let simple = user_id.simple().to_string();
    format!("custom-{}-{}", &simple[..8], now.timestamp_millis())
}

/// Builds the course row for a user-generated course. Word order is kept.
pub fn build_custom_course(
    user_id: Uuid,
    title: &str,
    word_ids: Vec<i32>,
    source_text: Option<&str>,
    now: DateTime<Utc>,
) -> Result<NewCourse, CustomCourseError> {
    let title = title.trim();
    if title.is_empty() || word_ids.is_empty() {
        return Err(CustomCourseError::Empty);
    }
    if word_ids.len() > MAX_CUSTOM_COURSE_WORDS {
        return Err(CustomCourseError::TooManyWords);
    }

    let mut seen = std::collections::HashSet::new();
    let word_ids: Vec<i32> = word_ids.into_iter().filter(|id| seen.insert(*id)).collect();

    Ok(NewCourse {
        title: title.chars().take(MAX_COURSE_TITLE_CHARS).collect(),
        slug: custom_course_slug(user_id, now),
        category: CUSTOM_COURSE_CATEGORY.to_string(),
        description: Some(format!("Custom course with {} words", word_ids.len())),
        difficulty: "intermediate".to_string(),
        is_custom: true,
        created_by: Some(user_id),
        source_text: source_text.map(|s| s.chars().take(MAX_SOURCE_TEXT_CHARS).collect()),
        word_ids,
    })
}
