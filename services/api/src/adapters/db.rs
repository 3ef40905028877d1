//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use crate::adapters::retry::{QueryError, RetryPolicy};
use async_trait::async_trait;
use bizchinese_core::domain::{
    ActivityDates, AuthSession, Course, CourseWordEntry, EnrollOutcome, Enrollment, InviteCode,
    NewCourse, NewPracticeRecord, NewWord, PracticeMode, PracticeRecord, ReviewItem, ReviewSource,
    User, UserCredentials, UserProgress, UserWish, Word,
};
use bizchinese_core::courses::{MAX_PROGRESS, PROGRESS_PER_PRACTICE};
use bizchinese_core::invite::INVITE_REWARD;
use bizchinese_core::ports::{DatabaseService, PortError, PortResult};
use bizchinese_core::scheduling::ProgressUpdate;
use bizchinese_core::subscription::Plan;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

/// Rows per statement when bulk-loading words.
const WORD_BATCH_SIZE: usize = 500;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    retry: RetryPolicy,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Maps a failed query onto the port's error type.
fn port_error(context: &str, err: QueryError) -> PortError {
    match err.as_sqlx() {
        Some(sqlx::Error::RowNotFound) => PortError::NotFound(context.to_string()),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            PortError::Conflict(context.to_string())
        }
        Some(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            PortError::NotFound(format!("{}: referenced row does not exist", context))
        }
        _ => PortError::Unexpected(format!("{}: {}", context, err)),
    }
}

fn tx_error(context: &str) -> impl Fn(sqlx::Error) -> PortError + '_ {
    move |e| port_error(context, QueryError::Sqlx(e))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    plan: String,
    invite_quota: i32,
    invited_count: i32,
    custom_course_usage_count: i32,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        let plan = Plan::parse(&self.plan).unwrap_or_else(|| {
            warn!("User {} has unknown plan '{}', treating as free", self.id, self.plan);
            Plan::Free
        });
        User {
            id: self.id,
            email: self.email,
            plan,
            invite_quota: self.invite_quota,
            invited_count: self.invited_count,
            custom_course_usage_count: self.custom_course_usage_count,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, email, plan, invite_quota, invited_count, custom_course_usage_count, created_at";

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct WordRecord {
    id: i32,
    chinese: String,
    pinyin: String,
    english: String,
    scene: Option<String>,
    example: Option<String>,
    category: String,
    frequency: i32,
}
impl WordRecord {
    fn to_domain(self) -> Word {
        Word {
            id: self.id,
            chinese: self.chinese,
            pinyin: self.pinyin,
            english: self.english,
            scene: self.scene,
            example: self.example,
            category: self.category,
            frequency: self.frequency,
        }
    }
}

const WORD_COLUMNS: &str = "id, chinese, pinyin, english, scene, example, category, frequency";

#[derive(FromRow)]
struct CourseRecord {
    id: i32,
    title: String,
    slug: String,
    category: String,
    cover_image: Option<String>,
    description: Option<String>,
    total_words: i32,
    difficulty: String,
    is_custom: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            slug: self.slug,
            category: self.category,
            cover_image: self.cover_image,
            description: self.description,
            total_words: self.total_words,
            difficulty: self.difficulty,
            is_custom: self.is_custom,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

const COURSE_COLUMNS: &str = "id, title, slug, category, cover_image, description, total_words, \
     difficulty, is_custom, created_by, created_at";

#[derive(FromRow)]
struct CourseWordRecord {
    word_order: i32,
    #[sqlx(flatten)]
    word: WordRecord,
}

#[derive(FromRow)]
struct EnrollmentRecord {
    id: i32,
    user_id: Uuid,
    course_id: i32,
    progress: i32,
    last_learned_at: Option<DateTime<Utc>>,
    is_completed: bool,
    added_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            progress: self.progress,
            last_learned_at: self.last_learned_at,
            is_completed: self.is_completed,
            added_at: self.added_at,
        }
    }
}

const ENROLLMENT_COLUMNS: &str =
    "id, user_id, course_id, progress, last_learned_at, is_completed, added_at";

#[derive(FromRow)]
struct ProgressRecord {
    id: i32,
    user_id: Uuid,
    word_id: i32,
    mastery_score: i32,
    mastered: bool,
    review_count: i32,
    correct_count: i32,
    last_reviewed_at: DateTime<Utc>,
    next_review_at: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> UserProgress {
        UserProgress {
            id: self.id,
            user_id: self.user_id,
            word_id: self.word_id,
            mastery_score: self.mastery_score,
            mastered: self.mastered,
            review_count: self.review_count,
            correct_count: self.correct_count,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    progress_id: i32,
    next_review_at: DateTime<Utc>,
    course_id: i32,
    course_title: String,
    course_slug: String,
    #[sqlx(flatten)]
    word: WordRecord,
}
impl ReviewRecord {
    fn to_domain(self) -> ReviewItem {
        ReviewItem {
            progress_id: self.progress_id,
            word: self.word.to_domain(),
            course_id: self.course_id,
            course_title: self.course_title,
            course_slug: self.course_slug,
            next_review_at: self.next_review_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewSourceRecord {
    course_title: String,
    course_slug: String,
    count: i64,
}

#[derive(FromRow)]
struct PracticeRecordRow {
    id: i32,
    user_id: Uuid,
    course_id: i32,
    mode: String,
    duration: Option<i32>,
    correct_count: i32,
    total_count: i32,
    accuracy: i32,
    created_at: DateTime<Utc>,
}
impl PracticeRecordRow {
    fn to_domain(self) -> PortResult<PracticeRecord> {
        let mode = PracticeMode::parse(&self.mode).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown practice mode '{}'", self.mode))
        })?;
        Ok(PracticeRecord {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            mode,
            duration: self.duration,
            correct_count: self.correct_count,
            total_count: self.total_count,
            accuracy: self.accuracy,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct InviteCodeRecord {
    id: Uuid,
    code: String,
    generated_by: Uuid,
    is_used: bool,
    used_by: Option<Uuid>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl InviteCodeRecord {
    fn to_domain(self) -> InviteCode {
        InviteCode {
            id: self.id,
            code: self.code,
            generated_by: self.generated_by,
            is_used: self.is_used,
            used_by: self.used_by,
            used_at: self.used_at,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct WishRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    category: String,
    description: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}
impl WishRecord {
    fn to_domain(self) -> UserWish {
        UserWish {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            category: self.category,
            description: self.description,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Due words with one source course per word (the lowest course id).
const DUE_WORDS_SQL: &str = r#"
    SELECT DISTINCT ON (up.word_id)
        up.id AS progress_id,
        up.next_review_at,
        c.id AS course_id,
        c.title AS course_title,
        c.slug AS course_slug,
        w.id, w.chinese, w.pinyin, w.english, w.scene, w.example, w.category, w.frequency
    FROM user_progress up
    JOIN words w ON w.id = up.word_id
    JOIN course_words cw ON cw.word_id = up.word_id
    JOIN courses c ON c.id = cw.course_id
    WHERE up.user_id = $1 AND up.next_review_at < $2
    ORDER BY up.word_id, c.id
"#;

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, hashed_password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let id = Uuid::new_v4();
        let record = self
            .retry
            .run_write(|| {
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(id)
                    .bind(email)
                    .bind(hashed_password)
                    .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Email already registered", e))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = self
            .retry
            .run(|| {
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(user_id)
                    .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error(&format!("User {} not found", user_id), e))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = self
            .retry
            .run(|| {
                sqlx::query_as::<_, CredentialsRecord>(
                    "SELECT id, email, hashed_password FROM users \
                     WHERE lower(email) = lower($1) AND hashed_password IS NOT NULL",
                )
                .bind(email)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("User not found", e))?;
        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn set_user_plan(&self, user_id: Uuid, plan: Plan) -> PortResult<()> {
        let result = self
            .retry
            .run(|| {
                sqlx::query("UPDATE users SET plan = $1, updated_at = now() WHERE id = $2")
                    .bind(plan.as_str())
                    .bind(user_id)
                    .execute(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to update plan", e))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        self.retry
            .run_write(|| {
                sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
                    .bind(&session.id)
                    .bind(session.user_id)
                    .bind(session.expires_at)
                    .execute(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to create auth session", e))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = self
            .retry
            .run(|| {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
                )
                .bind(session_id)
                .fetch_optional(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to validate auth session", e))?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.retry
            .run(|| {
                sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
                    .bind(session_id)
                    .execute(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to delete auth session", e))?;
        Ok(())
    }

    async fn words_by_category(&self, category: &str, limit: i64) -> PortResult<Vec<Word>> {
        let sql = format!(
            "SELECT {} FROM words WHERE category = $1 ORDER BY frequency, id LIMIT $2",
            WORD_COLUMNS
        );
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, WordRecord>(&sql)
                    .bind(category)
                    .bind(limit)
                    .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load words", e))?;
        Ok(records.into_iter().map(WordRecord::to_domain).collect())
    }

    async fn words_by_chinese(&self, chinese: &[String]) -> PortResult<Vec<Word>> {
        if chinese.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM words WHERE chinese = ANY($1) ORDER BY id",
            WORD_COLUMNS
        );
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, WordRecord>(&sql)
                    .bind(chinese)
                    .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to match words", e))?;
        Ok(records.into_iter().map(WordRecord::to_domain).collect())
    }

    async fn insert_words(&self, words: &[NewWord]) -> PortResult<u64> {
        let mut inserted = 0;
        for batch in words.chunks(WORD_BATCH_SIZE) {
            let chinese: Vec<&str> = batch.iter().map(|w| w.chinese.as_str()).collect();
            let pinyin: Vec<&str> = batch.iter().map(|w| w.pinyin.as_str()).collect();
            let english: Vec<&str> = batch.iter().map(|w| w.english.as_str()).collect();
            let scene: Vec<Option<&str>> = batch.iter().map(|w| w.scene.as_deref()).collect();
            let example: Vec<Option<&str>> = batch.iter().map(|w| w.example.as_deref()).collect();
            let category: Vec<&str> = batch.iter().map(|w| w.category.as_str()).collect();
            let frequency: Vec<i32> = batch.iter().map(|w| w.frequency).collect();

            let result = self
                .retry
                .run(|| {
                    sqlx::query(
                        "INSERT INTO words (chinese, pinyin, english, scene, example, category, frequency) \
                         SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[], $7::int4[]) \
                         ON CONFLICT (chinese, category) DO NOTHING",
                    )
                    .bind(&chinese)
                    .bind(&pinyin)
                    .bind(&english)
                    .bind(&scene)
                    .bind(&example)
                    .bind(&category)
                    .bind(&frequency)
                    .execute(&self.pool)
                })
                .await
                .map_err(|e| port_error("Failed to insert words", e))?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let sql = format!("SELECT {} FROM courses ORDER BY created_at, id", COURSE_COLUMNS);
        let records = self
            .retry
            .run(|| sqlx::query_as::<_, CourseRecord>(&sql).fetch_all(&self.pool))
            .await
            .map_err(|e| port_error("Failed to list courses", e))?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn get_course(&self, course_id: i32) -> PortResult<Course> {
        let sql = format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS);
        let record = self
            .retry
            .run(|| {
                sqlx::query_as::<_, CourseRecord>(&sql)
                    .bind(course_id)
                    .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Course not found", e))?;
        Ok(record.to_domain())
    }

    async fn get_course_by_slug(&self, slug: &str) -> PortResult<Course> {
        let sql = format!("SELECT {} FROM courses WHERE slug = $1", COURSE_COLUMNS);
        let record = self
            .retry
            .run(|| {
                sqlx::query_as::<_, CourseRecord>(&sql)
                    .bind(slug)
                    .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Course not found", e))?;
        Ok(record.to_domain())
    }

    async fn course_words(&self, course_id: i32) -> PortResult<Vec<CourseWordEntry>> {
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, CourseWordRecord>(
                    "SELECT cw.\"order\" AS word_order, \
                            w.id, w.chinese, w.pinyin, w.english, w.scene, w.example, w.category, w.frequency \
                     FROM course_words cw JOIN words w ON w.id = cw.word_id \
                     WHERE cw.course_id = $1 ORDER BY cw.\"order\"",
                )
                .bind(course_id)
                .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load course words", e))?;
        Ok(records
            .into_iter()
            .map(|r| CourseWordEntry {
                order: r.word_order,
                word: r.word.to_domain(),
            })
            .collect())
    }

    /// Runs in one transaction; not retried as a whole. The creator's usage is
    /// counted first so that the row lock serializes concurrent creations.
    async fn create_course(&self, course: NewCourse, usage_limit: Option<i32>) -> PortResult<Course> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(tx_error("Failed to start transaction"))?;

        if let Some(user_id) = course.created_by {
            let counted = sqlx::query_scalar::<_, i32>(
                "UPDATE users SET custom_course_usage_count = custom_course_usage_count + 1, updated_at = now() \
                 WHERE id = $1 AND ($2::int4 IS NULL OR custom_course_usage_count < $2) \
                 RETURNING custom_course_usage_count",
            )
            .bind(user_id)
            .bind(usage_limit)
            .fetch_optional(&mut *tx)
            .await
            .map_err(tx_error("Failed to count course usage"))?;

            if counted.is_none() {
                tx.rollback()
                    .await
                    .map_err(tx_error("Failed to roll back"))?;
                return Err(PortError::LimitReached(format!(
                    "User {} has no custom courses left",
                    user_id
                )));
            }
        }

        let sql = format!(
            "INSERT INTO courses (title, slug, category, description, total_words, difficulty, is_custom, created_by, source_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COURSE_COLUMNS
        );
        let record = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(&course.title)
            .bind(&course.slug)
            .bind(&course.category)
            .bind(&course.description)
            .bind(course.word_ids.len() as i32)
            .bind(&course.difficulty)
            .bind(course.is_custom)
            .bind(course.created_by)
            .bind(&course.source_text)
            .fetch_one(&mut *tx)
            .await
            .map_err(tx_error("Course slug already exists"))?;

        sqlx::query(
            "INSERT INTO course_words (course_id, word_id, \"order\") \
             SELECT $1, t.word_id, t.ord::int4 FROM UNNEST($2::int4[]) WITH ORDINALITY AS t(word_id, ord)",
        )
        .bind(record.id)
        .bind(&course.word_ids)
        .execute(&mut *tx)
        .await
        .map_err(tx_error("Failed to add course words"))?;

        if let Some(user_id) = course.created_by {
            sqlx::query("INSERT INTO user_courses (user_id, course_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(user_id)
                .bind(record.id)
                .execute(&mut *tx)
                .await
                .map_err(tx_error("Failed to enroll creator"))?;
        }

        tx.commit()
            .await
            .map_err(tx_error("Failed to commit course"))?;
        Ok(record.to_domain())
    }

    async fn enroll(&self, user_id: Uuid, course_id: i32) -> PortResult<EnrollOutcome> {
        let result = self
            .retry
            .run(|| {
                sqlx::query(
                    "INSERT INTO user_courses (user_id, course_id) VALUES ($1, $2) \
                     ON CONFLICT (user_id, course_id) DO NOTHING",
                )
                .bind(user_id)
                .bind(course_id)
                .execute(&self.pool)
            })
            .await
            .map_err(|e| port_error("Course not found", e))?;
        Ok(if result.rows_affected() == 1 {
            EnrollOutcome::Enrolled
        } else {
            EnrollOutcome::AlreadyEnrolled
        })
    }

    async fn get_enrollment(&self, user_id: Uuid, course_id: i32) -> PortResult<Option<Enrollment>> {
        let sql = format!(
            "SELECT {} FROM user_courses WHERE user_id = $1 AND course_id = $2",
            ENROLLMENT_COLUMNS
        );
        let record = self
            .retry
            .run(|| {
                sqlx::query_as::<_, EnrollmentRecord>(&sql)
                    .bind(user_id)
                    .bind(course_id)
                    .fetch_optional(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load enrollment", e))?;
        Ok(record.map(EnrollmentRecord::to_domain))
    }

    async fn list_enrollments(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>> {
        let sql = format!(
            "SELECT {} FROM user_courses WHERE user_id = $1 ORDER BY added_at",
            ENROLLMENT_COLUMNS
        );
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, EnrollmentRecord>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to list enrollments", e))?;
        Ok(records.into_iter().map(EnrollmentRecord::to_domain).collect())
    }

    async fn advance_enrollment(
        &self,
        user_id: Uuid,
        course_id: i32,
        learned_at: DateTime<Utc>,
    ) -> PortResult<Option<i32>> {
        self.retry
            .run_write(|| {
                sqlx::query_scalar::<_, i32>(
                    "UPDATE user_courses SET progress = LEAST(progress + $3, $4), \
                         is_completed = progress + $3 >= $4, last_learned_at = $5 \
                     WHERE user_id = $1 AND course_id = $2 \
                     RETURNING progress",
                )
                .bind(user_id)
                .bind(course_id)
                .bind(PROGRESS_PER_PRACTICE)
                .bind(MAX_PROGRESS)
                .bind(learned_at)
                .fetch_optional(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to update course progress", e))
    }

    async fn record_answer(
        &self,
        user_id: Uuid,
        word_id: i32,
        update: &ProgressUpdate,
    ) -> PortResult<UserProgress> {
        let record = self
            .retry
            .run_write(|| {
                sqlx::query_as::<_, ProgressRecord>(
                    r#"
                    INSERT INTO user_progress
                        (user_id, word_id, mastery_score, mastered, review_count, correct_count, last_reviewed_at, next_review_at)
                    VALUES ($1, $2, $3, $4, 1, $5, $6, $7)
                    ON CONFLICT (user_id, word_id) DO UPDATE SET
                        mastery_score = EXCLUDED.mastery_score,
                        mastered = EXCLUDED.mastered,
                        review_count = user_progress.review_count + 1,
                        correct_count = user_progress.correct_count + EXCLUDED.correct_count,
                        last_reviewed_at = EXCLUDED.last_reviewed_at,
                        next_review_at = EXCLUDED.next_review_at
                    RETURNING id, user_id, word_id, mastery_score, mastered, review_count, correct_count,
                              last_reviewed_at, next_review_at
                    "#,
                )
                .bind(user_id)
                .bind(word_id)
                .bind(update.mastery_score)
                .bind(update.mastered)
                .bind(i32::from(update.correct))
                .bind(update.last_reviewed_at)
                .bind(update.next_review_at)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error(&format!("Word {}", word_id), e))?;
        Ok(record.to_domain())
    }

    async fn due_reviews(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewItem>> {
        let sql = format!(
            "SELECT * FROM ({}) due ORDER BY next_review_at, id",
            DUE_WORDS_SQL
        );
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, ReviewRecord>(&sql)
                    .bind(user_id)
                    .bind(due_before)
                    .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load reviews", e))?;
        Ok(records.into_iter().map(ReviewRecord::to_domain).collect())
    }

    async fn review_sources(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewSource>> {
        let sql = format!(
            "SELECT course_title, course_slug, COUNT(*) AS count FROM ({}) due \
             GROUP BY course_title, course_slug ORDER BY count DESC, course_title",
            DUE_WORDS_SQL
        );
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, ReviewSourceRecord>(&sql)
                    .bind(user_id)
                    .bind(due_before)
                    .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load review sources", e))?;
        Ok(records
            .into_iter()
            .map(|r| ReviewSource {
                course_title: r.course_title,
                course_slug: r.course_slug,
                count: r.count,
            })
            .collect())
    }

    async fn count_mastered(&self, user_id: Uuid) -> PortResult<i64> {
        self.retry
            .run(|| {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM user_progress WHERE user_id = $1 AND mastered",
                )
                .bind(user_id)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to count mastered words", e))
    }

    async fn mastered_word_ids(&self, user_id: Uuid, min_score: i32) -> PortResult<Vec<i32>> {
        self.retry
            .run(|| {
                sqlx::query_scalar::<_, i32>(
                    "SELECT word_id FROM user_progress WHERE user_id = $1 AND mastery_score >= $2",
                )
                .bind(user_id)
                .bind(min_score)
                .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to load mastered words", e))
    }

    async fn activity_dates(&self, user_id: Uuid) -> PortResult<ActivityDates> {
        let (review_dates, practice_dates) = tokio::try_join!(
            self.retry.run(|| {
                sqlx::query_scalar::<_, NaiveDate>(
                    "SELECT DISTINCT (last_reviewed_at AT TIME ZONE 'UTC')::date FROM user_progress WHERE user_id = $1",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
            }),
            self.retry.run(|| {
                sqlx::query_scalar::<_, NaiveDate>(
                    "SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::date FROM practice_records WHERE user_id = $1",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
            }),
        )
        .map_err(|e| port_error("Failed to load activity", e))?;
        Ok(ActivityDates {
            review_dates,
            practice_dates,
        })
    }

    async fn save_practice_record(&self, record: NewPracticeRecord) -> PortResult<PracticeRecord> {
        let accuracy = record.accuracy();
        let row = self
            .retry
            .run_write(|| {
                sqlx::query_as::<_, PracticeRecordRow>(
                    "INSERT INTO practice_records (user_id, course_id, mode, duration, correct_count, total_count, accuracy) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     RETURNING id, user_id, course_id, mode, duration, correct_count, total_count, accuracy, created_at",
                )
                .bind(record.user_id)
                .bind(record.course_id)
                .bind(record.mode.as_str())
                .bind(record.duration)
                .bind(record.correct_count)
                .bind(record.total_count)
                .bind(accuracy)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to save practice record", e))?;
        row.to_domain()
    }

    /// The conditional upsert makes the limit check and the count one statement.
    async fn consume_pronunciation(&self, user_id: Uuid, day: NaiveDate, limit: i32) -> PortResult<Option<i32>> {
        self.retry
            .run_write(|| {
                sqlx::query_scalar::<_, i32>(
                    "INSERT INTO user_usage (user_id, usage_date, pronunciation_count) \
                     SELECT $1, $2, 1 WHERE $3 > 0 \
                     ON CONFLICT (user_id, usage_date) \
                     DO UPDATE SET pronunciation_count = user_usage.pronunciation_count + 1 \
                     WHERE user_usage.pronunciation_count < $3 \
                     RETURNING pronunciation_count",
                )
                .bind(user_id)
                .bind(day)
                .bind(limit)
                .fetch_optional(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to record usage", e))
    }

    async fn create_invite_code(&self, generated_by: Uuid, code: &str) -> PortResult<InviteCode> {
        let record = self
            .retry
            .run_write(|| {
                sqlx::query_as::<_, InviteCodeRecord>(
                    "INSERT INTO invite_codes (id, code, generated_by) VALUES ($1, $2, $3) \
                     RETURNING id, code, generated_by, is_used, used_by, used_at, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(code)
                .bind(generated_by)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Invite code already exists", e))?;
        Ok(record.to_domain())
    }

    async fn list_invite_codes(&self, generated_by: Uuid) -> PortResult<Vec<InviteCode>> {
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, InviteCodeRecord>(
                    "SELECT id, code, generated_by, is_used, used_by, used_at, created_at \
                     FROM invite_codes WHERE generated_by = $1 ORDER BY created_at DESC",
                )
                .bind(generated_by)
                .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to list invite codes", e))?;
        Ok(records.into_iter().map(InviteCodeRecord::to_domain).collect())
    }

    /// Runs in one transaction; the conditional update makes a code redeemable once.
    async fn redeem_invite_code(&self, code: &str, new_user: Uuid) -> PortResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(tx_error("Failed to start transaction"))?;

        let inviter = sqlx::query_scalar::<_, Uuid>(
            "UPDATE invite_codes SET is_used = true, used_by = $2, used_at = now() \
             WHERE code = $1 AND is_used = false AND generated_by <> $2 \
             RETURNING generated_by",
        )
        .bind(code)
        .bind(new_user)
        .fetch_optional(&mut *tx)
        .await
        .map_err(tx_error("Failed to redeem invite code"))?;

        let Some(inviter) = inviter else {
            tx.rollback()
                .await
                .map_err(tx_error("Failed to roll back"))?;
            return Ok(false);
        };

        sqlx::query(
            "UPDATE users SET invite_quota = invite_quota + $2, invited_count = invited_count + 1, updated_at = now() \
             WHERE id = $1",
        )
        .bind(inviter)
        .bind(INVITE_REWARD)
        .execute(&mut *tx)
        .await
        .map_err(tx_error("Failed to reward inviter"))?;

        sqlx::query("UPDATE users SET invite_quota = invite_quota + $2, updated_at = now() WHERE id = $1")
            .bind(new_user)
            .bind(INVITE_REWARD)
            .execute(&mut *tx)
            .await
            .map_err(tx_error("Failed to reward new user"))?;

        tx.commit()
            .await
            .map_err(tx_error("Failed to commit invite redemption"))?;
        Ok(true)
    }

    async fn create_wish(
        &self,
        user_id: Uuid,
        title: &str,
        category: &str,
        description: Option<&str>,
    ) -> PortResult<UserWish> {
        let record = self
            .retry
            .run_write(|| {
                sqlx::query_as::<_, WishRecord>(
                    "INSERT INTO user_wishes (id, user_id, title, category, description) VALUES ($1, $2, $3, $4, $5) \
                     RETURNING id, user_id, title, category, description, status, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(title)
                .bind(category)
                .bind(description)
                .fetch_one(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to save wish", e))?;
        Ok(record.to_domain())
    }

    async fn list_wishes(&self, user_id: Uuid) -> PortResult<Vec<UserWish>> {
        let records = self
            .retry
            .run(|| {
                sqlx::query_as::<_, WishRecord>(
                    "SELECT id, user_id, title, category, description, status, created_at \
                     FROM user_wishes WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
            })
            .await
            .map_err(|e| port_error("Failed to list wishes", e))?;
        Ok(records.into_iter().map(WishRecord::to_domain).collect())
    }
}
