//! services/api/src/web/views.rs
//!
//! JSON shapes of the domain types as the API returns them.

use bizchinese_core::domain::{
    Course, CourseWordEntry, Enrollment, InviteCode, PracticeMode, PracticeRecord, ReviewItem,
    User, UserProgress, UserWish, Word,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct WordView {
    pub id: i32,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub scene: Option<String>,
    pub example: Option<String>,
    pub category: String,
    pub frequency: i32,
}

impl From<Word> for WordView {
    fn from(w: Word) -> Self {
        Self {
            id: w.id,
            chinese: w.chinese,
            pinyin: w.pinyin,
            english: w.english,
            scene: w.scene,
            example: w.example,
            category: w.category,
            frequency: w.frequency,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseWordView {
    pub order: i32,
    #[serde(flatten)]
    pub word: WordView,
}

impl From<CourseWordEntry> for CourseWordView {
    fn from(entry: CourseWordEntry) -> Self {
        Self {
            order: entry.order,
            word: entry.word.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseView {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub total_words: i32,
    pub difficulty: String,
    pub is_custom: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseView {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
            slug: c.slug,
            category: c.category,
            cover_image: c.cover_image,
            description: c.description,
            total_words: c.total_words,
            difficulty: c.difficulty,
            is_custom: c.is_custom,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentView {
    pub progress: i32,
    pub is_completed: bool,
    pub last_learned_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentView {
    fn from(e: Enrollment) -> Self {
        Self {
            progress: e.progress,
            is_completed: e.is_completed,
            last_learned_at: e.last_learned_at,
            added_at: e.added_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressView {
    pub word_id: i32,
    pub mastery_score: i32,
    pub mastered: bool,
    pub review_count: i32,
    pub correct_count: i32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

impl From<UserProgress> for ProgressView {
    fn from(p: UserProgress) -> Self {
        Self {
            word_id: p.word_id,
            mastery_score: p.mastery_score,
            mastered: p.mastered,
            review_count: p.review_count,
            correct_count: p.correct_count,
            last_reviewed_at: p.last_reviewed_at,
            next_review_at: p.next_review_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewItemView {
    pub progress_id: i32,
    pub word: WordView,
    pub course_id: i32,
    pub course_title: String,
    pub course_slug: String,
    pub next_review_at: DateTime<Utc>,
}

impl From<ReviewItem> for ReviewItemView {
    fn from(r: ReviewItem) -> Self {
        Self {
            progress_id: r.progress_id,
            word: r.word.into(),
            course_id: r.course_id,
            course_title: r.course_title,
            course_slug: r.course_slug,
            next_review_at: r.next_review_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PracticeModeView {
    pub id: &'static str,
    pub name: &'static str,
    pub difficulty: u8,
}

impl From<PracticeMode> for PracticeModeView {
    fn from(mode: PracticeMode) -> Self {
        Self {
            id: mode.as_str(),
            name: mode.name(),
            difficulty: mode.difficulty_level(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PracticeRecordView {
    pub id: i32,
    pub course_id: i32,
    pub mode: &'static str,
    pub duration: Option<i32>,
    pub correct_count: i32,
    pub total_count: i32,
    pub accuracy: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PracticeRecord> for PracticeRecordView {
    fn from(r: PracticeRecord) -> Self {
        Self {
            id: r.id,
            course_id: r.course_id,
            mode: r.mode.as_str(),
            duration: r.duration,
            correct_count: r.correct_count,
            total_count: r.total_count,
            accuracy: r.accuracy,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub plan: &'static str,
    pub invite_quota: i32,
    pub invited_count: i32,
    pub custom_course_usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            plan: u.plan.as_str(),
            invite_quota: u.invite_quota,
            invited_count: u.invited_count,
            custom_course_usage_count: u.custom_course_usage_count,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCodeView {
    pub code: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InviteCode> for InviteCodeView {
    fn from(c: InviteCode) -> Self {
        Self {
            code: c.code,
            is_used: c.is_used,
            used_at: c.used_at,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishView {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserWish> for WishView {
    fn from(w: UserWish) -> Self {
        Self {
            id: w.id,
            title: w.title,
            category: w.category,
            description: w.description,
            status: w.status,
            created_at: w.created_at,
        }
    }
}
