//! crates/bizchinese_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    ActivityDates, AuthSession, Course, CourseWordEntry, EnrollOutcome, Enrollment, InviteCode,
    NewCourse, NewPracticeRecord, NewWord, PracticeRecord, ReviewItem, ReviewSource, User,
    UserCredentials, UserProgress, UserWish, Word,
};
use crate::scheduling::ProgressUpdate;
use crate::subscription::Plan;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Limit reached: {0}")]
    LimitReached(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn set_user_plan(&self, user_id: Uuid, plan: Plan) -> PortResult<()>;

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()>;

    /// Returns the owner of a live (unexpired) session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Words ---
    async fn words_by_category(&self, category: &str, limit: i64) -> PortResult<Vec<Word>>;

    async fn words_by_chinese(&self, chinese: &[String]) -> PortResult<Vec<Word>>;

    /// Inserts words that are not present yet (by chinese + category).
    /// Returns how many rows were added.
    async fn insert_words(&self, words: &[NewWord]) -> PortResult<u64>;

    // --- Courses & Enrollment ---
    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn get_course(&self, course_id: i32) -> PortResult<Course>;

    async fn get_course_by_slug(&self, slug: &str) -> PortResult<Course>;

    async fn course_words(&self, course_id: i32) -> PortResult<Vec<CourseWordEntry>>;

    /// Creates a course with its ordered word list. When the course has a
    /// creator, also enrolls them and counts it against their usage. With a
    /// `usage_limit`, fails with `LimitReached` if the creator has already
    /// used that many; the check and the count happen atomically.
    async fn create_course(&self, course: NewCourse, usage_limit: Option<i32>) -> PortResult<Course>;

    async fn enroll(&self, user_id: Uuid, course_id: i32) -> PortResult<EnrollOutcome>;

    async fn get_enrollment(&self, user_id: Uuid, course_id: i32) -> PortResult<Option<Enrollment>>;

    async fn list_enrollments(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>>;

    /// Adds one practice session's worth of progress in place.
    /// Returns the new progress, or `None` when the user is not enrolled.
    async fn advance_enrollment(
        &self,
        user_id: Uuid,
        course_id: i32,
        learned_at: DateTime<Utc>,
    ) -> PortResult<Option<i32>>;

    // --- Spaced repetition ---
    /// Upserts the (user, word) progress row.
    async fn record_answer(
        &self,
        user_id: Uuid,
        word_id: i32,
        update: &ProgressUpdate,
    ) -> PortResult<UserProgress>;

    /// Words whose next review falls before `due_before`, oldest first.
    async fn due_reviews(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewItem>>;

    async fn review_sources(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewSource>>;

    async fn count_mastered(&self, user_id: Uuid) -> PortResult<i64>;

    async fn mastered_word_ids(&self, user_id: Uuid, min_score: i32) -> PortResult<Vec<i32>>;

    async fn activity_dates(&self, user_id: Uuid) -> PortResult<ActivityDates>;

    // --- Practice ---
    async fn save_practice_record(&self, record: NewPracticeRecord) -> PortResult<PracticeRecord>;

    // --- Usage ---
    /// Counts one play for `day` unless `limit` plays are already counted.
    /// Returns the new total, or `None` when the play was refused.
    async fn consume_pronunciation(&self, user_id: Uuid, day: NaiveDate, limit: i32) -> PortResult<Option<i32>>;

    // --- Invites & Wishes ---
    async fn create_invite_code(&self, generated_by: Uuid, code: &str) -> PortResult<InviteCode>;

    async fn list_invite_codes(&self, generated_by: Uuid) -> PortResult<Vec<InviteCode>>;

    /// Marks an unused code as used by `new_user` and rewards both users.
    /// Returns `false` if the code does not exist or was already used.
    async fn redeem_invite_code(&self, code: &str, new_user: Uuid) -> PortResult<bool>;

    async fn create_wish(
        &self,
        user_id: Uuid,
        title: &str,
        category: &str,
        description: Option<&str>,
    ) -> PortResult<UserWish>;

    async fn list_wishes(&self, user_id: Uuid) -> PortResult<Vec<UserWish>>;
}

#[async_trait]
pub trait VocabularyExtractionService: Send + Sync {
    /// Pulls study-worthy Chinese words out of a Chinese text.
    async fn extract_words(&self, text: &str) -> PortResult<Vec<String>>;

    /// Suggests Chinese words for a learning need described in another language.
    async fn recommend_words(&self, description: &str) -> PortResult<Vec<String>>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Starts a hosted checkout and returns the URL to send the user to.
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
        product_id: &str,
        plan: Plan,
    ) -> PortResult<String>;
}
