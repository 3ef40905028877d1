//! crates/bizchinese_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP representation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subscription::Plan;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub invite_quota: i32,
    pub invited_count: i32,
    pub custom_course_usage_count: i32,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A vocabulary unit. Static reference data loaded from CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i32,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub scene: Option<String>,
    pub example: Option<String>,
    pub category: String,
    pub frequency: i32,
}

/// A word row as read from a seed file, before it has an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewWord {
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub scene: Option<String>,
    pub example: Option<String>,
    pub category: String,
    pub frequency: i32,
}

/// A named bundle of words.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub total_words: i32,
    pub difficulty: String,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert a course together with its ordered words.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub description: Option<String>,
    pub difficulty: String,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub source_text: Option<String>,
    pub word_ids: Vec<i32>,
}

/// A word at its position inside a course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseWordEntry {
    pub order: i32,
    pub word: Word,
}

/// A user's enrollment in a course (`user_courses`).
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: i32,
    pub user_id: Uuid,
    pub course_id: i32,
    pub progress: i32,
    pub last_learned_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub added_at: DateTime<Utc>,
}

/// Outcome of an enroll request. Enrolling twice is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
}

/// Per-user-per-word mastery record. One row per (user, word).
#[derive(Debug, Clone, PartialEq)]
pub struct UserProgress {
    pub id: i32,
    pub user_id: Uuid,
    pub word_id: i32,
    pub mastery_score: i32,
    pub mastered: bool,
    pub review_count: i32,
    pub correct_count: i32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

/// The practice modes offered for an enrolled course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeMode {
    PictureMatch,
    TonePractice,
    Translation,
    Dictation,
}

impl PracticeMode {
    pub const ALL: [PracticeMode; 4] = [
        PracticeMode::PictureMatch,
        PracticeMode::TonePractice,
        PracticeMode::Translation,
        PracticeMode::Dictation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeMode::PictureMatch => "picture-match",
            PracticeMode::TonePractice => "tone-practice",
            PracticeMode::Translation => "translation",
            PracticeMode::Dictation => "dictation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PracticeMode::PictureMatch => "Picture Match",
            PracticeMode::TonePractice => "Tone Training",
            PracticeMode::Translation => "Translation",
            PracticeMode::Dictation => "Dictation",
        }
    }

    /// 1 is the easiest.
    pub fn difficulty_level(&self) -> u8 {
        match self {
            PracticeMode::PictureMatch => 1,
            PracticeMode::TonePractice => 2,
            PracticeMode::Translation => 3,
            PracticeMode::Dictation => 4,
        }
    }
}

/// Append-only log entry of a completed practice session.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeRecord {
    pub id: i32,
    pub user_id: Uuid,
    pub course_id: i32,
    pub mode: PracticeMode,
    pub duration: Option<i32>,
    pub correct_count: i32,
    pub total_count: i32,
    pub accuracy: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPracticeRecord {
    pub user_id: Uuid,
    pub course_id: i32,
    pub mode: PracticeMode,
    pub duration: Option<i32>,
    pub correct_count: i32,
    pub total_count: i32,
}

impl NewPracticeRecord {
    /// Percentage of correct answers, rounded. Zero when nothing was asked.
    pub fn accuracy(&self) -> i32 {
        if self.total_count <= 0 {
            return 0;
        }
        ((self.correct_count as f64 / self.total_count as f64) * 100.0).round() as i32
    }
}

/// A due word in the review queue, with the course it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub progress_id: i32,
    pub word: Word,
    pub course_id: i32,
    pub course_title: String,
    pub course_slug: String,
    pub next_review_at: DateTime<Utc>,
}

/// How many due words each course contributes to the review queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSource {
    pub course_title: String,
    pub course_slug: String,
    pub count: i64,
}

/// A referral code generated by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub generated_by: Uuid,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A user's request for a new course.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWish {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Dates on which a user did something: reviewed a word or finished a practice.
#[derive(Debug, Clone, Default)]
pub struct ActivityDates {
    pub review_dates: Vec<NaiveDate>,
    pub practice_dates: Vec<NaiveDate>,
}
