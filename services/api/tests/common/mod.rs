//! Shared helpers for the router tests: an in-memory `DatabaseService`,
//! canned vocabulary and payment adapters, and request helpers.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bizchinese_core::billing::ProductCatalog;
use bizchinese_core::courses::{MAX_PROGRESS, PROGRESS_PER_PRACTICE};
use bizchinese_core::domain::{
    ActivityDates, AuthSession, Course, CourseWordEntry, EnrollOutcome, Enrollment, InviteCode,
    NewCourse, NewPracticeRecord, NewWord, PracticeRecord, ReviewItem, ReviewSource, User,
    UserCredentials, UserProgress, UserWish, Word,
};
use bizchinese_core::invite::{DEFAULT_INVITE_QUOTA, INVITE_REWARD};
use bizchinese_core::ports::{
    DatabaseService, PaymentService, PortError, PortResult, VocabularyExtractionService,
};
use bizchinese_core::scheduling::ProgressUpdate;
use bizchinese_core::subscription::Plan;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test";

//=========================================================================================
// In-memory database
//=========================================================================================

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: HashMap<Uuid, User>,
    passwords: HashMap<Uuid, String>,
    sessions: HashMap<String, AuthSession>,
    words: Vec<Word>,
    courses: Vec<Course>,
    /// (course_id, word_id, order)
    course_words: Vec<(i32, i32, i32)>,
    enrollments: Vec<Enrollment>,
    progress: Vec<UserProgress>,
    practice: Vec<PracticeRecord>,
    usage: HashMap<(Uuid, NaiveDate), i32>,
    invites: Vec<InviteCode>,
    wishes: Vec<UserWish>,
}

impl Tables {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn word(&self, word_id: i32) -> PortResult<&Word> {
        self.words
            .iter()
            .find(|w| w.id == word_id)
            .ok_or_else(|| PortError::NotFound(format!("Word {}", word_id)))
    }

    /// One entry per due word, attributed to the lowest course id containing it.
    fn due(&self, user_id: Uuid, due_before: DateTime<Utc>) -> Vec<ReviewItem> {
        let mut by_word: BTreeMap<i32, ReviewItem> = BTreeMap::new();
        for p in self
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.next_review_at < due_before)
        {
            let course = self
                .course_words
                .iter()
                .filter(|(_, word_id, _)| *word_id == p.word_id)
                .filter_map(|(course_id, _, _)| self.courses.iter().find(|c| c.id == *course_id))
                .min_by_key(|c| c.id);
            let (Some(course), Ok(word)) = (course, self.word(p.word_id)) else {
                continue;
            };
            by_word.insert(
                p.word_id,
                ReviewItem {
                    progress_id: p.id,
                    word: word.clone(),
                    course_id: course.id,
                    course_title: course.title.clone(),
                    course_slug: course.slug.clone(),
                    next_review_at: p.next_review_at,
                },
            );
        }
        let mut items: Vec<ReviewItem> = by_word.into_values().collect();
        items.sort_by_key(|i| (i.next_review_at, i.word.id));
        items
    }
}

/// A `DatabaseService` kept in memory, with the same uniqueness and
/// not-found rules as the Postgres adapter.
#[derive(Default)]
pub struct FakeDb {
    tables: Mutex<Tables>,
}

impl FakeDb {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_word(&self, chinese: &str, category: &str, frequency: i32) -> Word {
        let mut t = self.lock();
        let word = Word {
            id: t.id(),
            chinese: chinese.to_string(),
            pinyin: format!("{}-pinyin", chinese),
            english: format!("{}-english", chinese),
            scene: None,
            example: None,
            category: category.to_string(),
            frequency,
        };
        t.words.push(word.clone());
        word
    }

    pub fn set_plan(&self, user_id: Uuid, plan: Plan) {
        if let Some(user) = self.lock().users.get_mut(&user_id) {
            user.plan = plan;
        }
    }

    pub fn user(&self, user_id: Uuid) -> User {
        self.lock().users[&user_id].clone()
    }

    pub fn progress_rows(&self, user_id: Uuid) -> Vec<UserProgress> {
        self.lock()
            .progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn practice_records(&self) -> Vec<PracticeRecord> {
        self.lock().practice.clone()
    }

    /// Moves every progress row of the user into the past so it is due now.
    pub fn make_all_due(&self, user_id: Uuid) {
        let past = Utc::now() - chrono::Duration::hours(1);
        for p in self.lock().progress.iter_mut().filter(|p| p.user_id == user_id) {
            p.next_review_at = past;
        }
    }

    pub fn insert_invite(&self, generated_by: Uuid, code: &str) {
        let mut t = self.lock();
        t.invites.push(InviteCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            generated_by,
            is_used: false,
            used_by: None,
            used_at: None,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut t = self.lock();
        if t.users.values().any(|u| u.email == email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            plan: Plan::Free,
            invite_quota: DEFAULT_INVITE_QUOTA,
            invited_count: 0,
            custom_course_usage_count: 0,
            created_at: Utc::now(),
        };
        t.passwords.insert(user.id, hashed_password.to_string());
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {}", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let t = self.lock();
        let user = t
            .users
            .values()
            .find(|u| u.email == email)
            .ok_or_else(|| PortError::NotFound("User".to_string()))?;
        Ok(UserCredentials {
            user_id: user.id,
            email: user.email.clone(),
            hashed_password: t.passwords.get(&user.id).cloned().unwrap_or_default(),
        })
    }

    async fn set_user_plan(&self, user_id: Uuid, plan: Plan) -> PortResult<()> {
        let mut t = self.lock();
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {}", user_id)))?;
        user.plan = plan;
        Ok(())
    }

    async fn create_auth_session(&self, session: AuthSession) -> PortResult<()> {
        self.lock().sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.lock()
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock().sessions.remove(session_id);
        Ok(())
    }

    async fn words_by_category(&self, category: &str, limit: i64) -> PortResult<Vec<Word>> {
        let mut words: Vec<Word> = self
            .lock()
            .words
            .iter()
            .filter(|w| w.category == category)
            .cloned()
            .collect();
        words.sort_by_key(|w| (w.frequency, w.id));
        words.truncate(limit.max(0) as usize);
        Ok(words)
    }

    async fn words_by_chinese(&self, chinese: &[String]) -> PortResult<Vec<Word>> {
        Ok(self
            .lock()
            .words
            .iter()
            .filter(|w| chinese.contains(&w.chinese))
            .cloned()
            .collect())
    }

    async fn insert_words(&self, words: &[NewWord]) -> PortResult<u64> {
        let mut t = self.lock();
        let mut inserted = 0;
        for w in words {
            if t.words.iter().any(|e| e.chinese == w.chinese && e.category == w.category) {
                continue;
            }
            let id = t.id();
            t.words.push(Word {
                id,
                chinese: w.chinese.clone(),
                pinyin: w.pinyin.clone(),
                english: w.english.clone(),
                scene: w.scene.clone(),
                example: w.example.clone(),
                category: w.category.clone(),
                frequency: w.frequency,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        Ok(self.lock().courses.clone())
    }

    async fn get_course(&self, course_id: i32) -> PortResult<Course> {
        self.lock()
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {}", course_id)))
    }

    async fn get_course_by_slug(&self, slug: &str) -> PortResult<Course> {
        self.lock()
            .courses
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {}", slug)))
    }

    async fn course_words(&self, course_id: i32) -> PortResult<Vec<CourseWordEntry>> {
        let t = self.lock();
        let mut entries: Vec<CourseWordEntry> = t
            .course_words
            .iter()
            .filter(|(c, _, _)| *c == course_id)
            .filter_map(|(_, word_id, order)| {
                t.word(*word_id).ok().map(|w| CourseWordEntry {
                    order: *order,
                    word: w.clone(),
                })
            })
            .collect();
        entries.sort_by_key(|e| e.order);
        Ok(entries)
    }

    async fn create_course(&self, course: NewCourse, usage_limit: Option<i32>) -> PortResult<Course> {
        let mut t = self.lock();
        if let (Some(user_id), Some(limit)) = (course.created_by, usage_limit) {
            let used = t.users.get(&user_id).map_or(0, |u| u.custom_course_usage_count);
            if used >= limit {
                return Err(PortError::LimitReached(format!("User {} has no custom courses left", user_id)));
            }
        }
        if t.courses.iter().any(|c| c.slug == course.slug) {
            return Err(PortError::Conflict("Course slug already exists".to_string()));
        }
        for word_id in &course.word_ids {
            t.word(*word_id)?;
        }
        let created = Course {
            id: t.id(),
            title: course.title,
            slug: course.slug,
            category: course.category,
            cover_image: None,
            description: course.description,
            total_words: course.word_ids.len() as i32,
            difficulty: course.difficulty,
            is_custom: course.is_custom,
            created_by: course.created_by,
            created_at: Utc::now(),
        };
        for (i, word_id) in course.word_ids.iter().enumerate() {
            t.course_words.push((created.id, *word_id, i as i32 + 1));
        }
        if let Some(user_id) = created.created_by {
            let id = t.id();
            t.enrollments.push(Enrollment {
                id,
                user_id,
                course_id: created.id,
                progress: 0,
                last_learned_at: None,
                is_completed: false,
                added_at: Utc::now(),
            });
            if let Some(user) = t.users.get_mut(&user_id) {
                user.custom_course_usage_count += 1;
            }
        }
        t.courses.push(created.clone());
        Ok(created)
    }

    async fn enroll(&self, user_id: Uuid, course_id: i32) -> PortResult<EnrollOutcome> {
        let mut t = self.lock();
        if !t.courses.iter().any(|c| c.id == course_id) {
            return Err(PortError::NotFound("Course not found".to_string()));
        }
        if t.enrollments.iter().any(|e| e.user_id == user_id && e.course_id == course_id) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }
        let id = t.id();
        t.enrollments.push(Enrollment {
            id,
            user_id,
            course_id,
            progress: 0,
            last_learned_at: None,
            is_completed: false,
            added_at: Utc::now(),
        });
        Ok(EnrollOutcome::Enrolled)
    }

    async fn get_enrollment(&self, user_id: Uuid, course_id: i32) -> PortResult<Option<Enrollment>> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_enrollments(&self, user_id: Uuid) -> PortResult<Vec<Enrollment>> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn advance_enrollment(
        &self,
        user_id: Uuid,
        course_id: i32,
        learned_at: DateTime<Utc>,
    ) -> PortResult<Option<i32>> {
        let mut t = self.lock();
        let Some(enrollment) = t
            .enrollments
            .iter_mut()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
        else {
            return Ok(None);
        };
        enrollment.progress = (enrollment.progress + PROGRESS_PER_PRACTICE).min(MAX_PROGRESS);
        enrollment.is_completed = enrollment.progress >= MAX_PROGRESS;
        enrollment.last_learned_at = Some(learned_at);
        Ok(Some(enrollment.progress))
    }

    async fn record_answer(
        &self,
        user_id: Uuid,
        word_id: i32,
        update: &ProgressUpdate,
    ) -> PortResult<UserProgress> {
        let mut t = self.lock();
        t.word(word_id)?;
        let correct = i32::from(update.correct);
        if let Some(row) = t
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.word_id == word_id)
        {
            row.mastery_score = update.mastery_score;
            row.mastered = update.mastered;
            row.review_count += 1;
            row.correct_count += correct;
            row.last_reviewed_at = update.last_reviewed_at;
            row.next_review_at = update.next_review_at;
            return Ok(row.clone());
        }
        let row = UserProgress {
            id: t.id(),
            user_id,
            word_id,
            mastery_score: update.mastery_score,
            mastered: update.mastered,
            review_count: 1,
            correct_count: correct,
            last_reviewed_at: update.last_reviewed_at,
            next_review_at: update.next_review_at,
        };
        t.progress.push(row.clone());
        Ok(row)
    }

    async fn due_reviews(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewItem>> {
        Ok(self.lock().due(user_id, due_before))
    }

    async fn review_sources(&self, user_id: Uuid, due_before: DateTime<Utc>) -> PortResult<Vec<ReviewSource>> {
        let mut counts: BTreeMap<(String, String), i64> = BTreeMap::new();
        for item in self.lock().due(user_id, due_before) {
            *counts.entry((item.course_title, item.course_slug)).or_default() += 1;
        }
        let mut sources: Vec<ReviewSource> = counts
            .into_iter()
            .map(|((course_title, course_slug), count)| ReviewSource {
                course_title,
                course_slug,
                count,
            })
            .collect();
        sources.sort_by(|a, b| b.count.cmp(&a.count).then(a.course_title.cmp(&b.course_title)));
        Ok(sources)
    }

    async fn count_mastered(&self, user_id: Uuid) -> PortResult<i64> {
        Ok(self
            .lock()
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.mastered)
            .count() as i64)
    }

    async fn mastered_word_ids(&self, user_id: Uuid, min_score: i32) -> PortResult<Vec<i32>> {
        Ok(self
            .lock()
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.mastery_score >= min_score)
            .map(|p| p.word_id)
            .collect())
    }

    async fn activity_dates(&self, user_id: Uuid) -> PortResult<ActivityDates> {
        let t = self.lock();
        let mut review_dates: Vec<NaiveDate> = t
            .progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.last_reviewed_at.date_naive())
            .collect();
        let mut practice_dates: Vec<NaiveDate> = t
            .practice
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.created_at.date_naive())
            .collect();
        review_dates.sort();
        review_dates.dedup();
        practice_dates.sort();
        practice_dates.dedup();
        Ok(ActivityDates {
            review_dates,
            practice_dates,
        })
    }

    async fn save_practice_record(&self, record: NewPracticeRecord) -> PortResult<PracticeRecord> {
        let mut t = self.lock();
        let saved = PracticeRecord {
            id: t.id(),
            user_id: record.user_id,
            course_id: record.course_id,
            mode: record.mode,
            duration: record.duration,
            correct_count: record.correct_count,
            total_count: record.total_count,
            accuracy: record.accuracy(),
            created_at: Utc::now(),
        };
        t.practice.push(saved.clone());
        Ok(saved)
    }

    async fn consume_pronunciation(&self, user_id: Uuid, day: NaiveDate, limit: i32) -> PortResult<Option<i32>> {
        let mut t = self.lock();
        let count = t.usage.entry((user_id, day)).or_insert(0);
        if *count >= limit {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }

    async fn create_invite_code(&self, generated_by: Uuid, code: &str) -> PortResult<InviteCode> {
        let mut t = self.lock();
        if t.invites.iter().any(|i| i.code == code) {
            return Err(PortError::Conflict(format!("Invite code {}", code)));
        }
        let invite = InviteCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            generated_by,
            is_used: false,
            used_by: None,
            used_at: None,
            created_at: Utc::now(),
        };
        t.invites.push(invite.clone());
        Ok(invite)
    }

    async fn list_invite_codes(&self, generated_by: Uuid) -> PortResult<Vec<InviteCode>> {
        let mut codes: Vec<InviteCode> = self
            .lock()
            .invites
            .iter()
            .filter(|i| i.generated_by == generated_by)
            .cloned()
            .collect();
        codes.reverse();
        Ok(codes)
    }

    async fn redeem_invite_code(&self, code: &str, new_user: Uuid) -> PortResult<bool> {
        let mut t = self.lock();
        let Some(invite) = t
            .invites
            .iter_mut()
            .find(|i| i.code == code && !i.is_used && i.generated_by != new_user)
        else {
            return Ok(false);
        };
        invite.is_used = true;
        invite.used_by = Some(new_user);
        invite.used_at = Some(Utc::now());
        let inviter = invite.generated_by;
        if let Some(user) = t.users.get_mut(&inviter) {
            user.invite_quota += INVITE_REWARD;
            user.invited_count += 1;
        }
        if let Some(user) = t.users.get_mut(&new_user) {
            user.invite_quota += INVITE_REWARD;
        }
        Ok(true)
    }

    async fn create_wish(
        &self,
        user_id: Uuid,
        title: &str,
        category: &str,
        description: Option<&str>,
    ) -> PortResult<UserWish> {
        let wish = UserWish {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            category: category.to_string(),
            description: description.map(str::to_string),
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        self.lock().wishes.push(wish.clone());
        Ok(wish)
    }

    async fn list_wishes(&self, user_id: Uuid) -> PortResult<Vec<UserWish>> {
        let mut wishes: Vec<UserWish> = self
            .lock()
            .wishes
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        wishes.reverse();
        Ok(wishes)
    }
}

//=========================================================================================
// Canned adapters
//=========================================================================================

/// Returns the same word list for every text.
pub struct FakeVocab {
    pub words: Vec<String>,
}

#[async_trait]
impl VocabularyExtractionService for FakeVocab {
    async fn extract_words(&self, _text: &str) -> PortResult<Vec<String>> {
        Ok(self.words.clone())
    }

    async fn recommend_words(&self, _description: &str) -> PortResult<Vec<String>> {
        Ok(self.words.clone())
    }
}

pub struct FakePayments;

#[async_trait]
impl PaymentService for FakePayments {
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
        product_id: &str,
        plan: Plan,
    ) -> PortResult<String> {
        Ok(format!(
            "https://checkout.test/{}?user={}&plan={}",
            product_id,
            user_id,
            plan.as_str()
        ))
    }
}

//=========================================================================================
// App and request helpers
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub db: Arc<FakeDb>,
}

pub fn test_config() -> Config {
    let mut config = Config::for_database("postgres://unused");
    config.creem_webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config.products = ProductCatalog {
        pro_monthly: Some("prod_pro_monthly".to_string()),
        pro_yearly: Some("prod_pro_yearly".to_string()),
        max_monthly: None,
        max_yearly: None,
    };
    config
}

pub fn test_app_with(config: Config, vocab_words: &[&str]) -> TestApp {
    let db = Arc::new(FakeDb::default());
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(config),
        vocab: Arc::new(FakeVocab {
            words: vocab_words.iter().map(|w| w.to_string()).collect(),
        }),
        payments: Arc::new(FakePayments),
    });
    TestApp {
        router: build_router(state),
        db,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(test_config(), &[])
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(request).await
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Signs up and returns `(user_id, cookie header value)`.
    pub async fn signup(&self, email: &str) -> (Uuid, String) {
        let res = self
            .send(
                "POST",
                "/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "signup failed: {}", res.body);
        let user_id = Uuid::parse_str(res.body["user_id"].as_str().unwrap()).unwrap();
        (user_id, cookie_pair(&res.set_cookie.unwrap()))
    }

    /// Seeds `n` words and a preset course holding them, returning the course.
    pub async fn preset_course(&self, slug: &str, n: usize) -> Course {
        let word_ids = (0..n)
            .map(|i| self.db.add_word(&format!("{}词{}", slug, i), "business", 3).id)
            .collect();
        let course = NewCourse {
            title: format!("Course {}", slug),
            slug: slug.to_string(),
            category: "business".to_string(),
            description: None,
            difficulty: "beginner".to_string(),
            is_custom: false,
            created_by: None,
            source_text: None,
            word_ids,
        };
        self.db.create_course(course, None).await.unwrap()
    }
}

/// `session=...` from a `Set-Cookie` header, ready for a `Cookie` header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}
