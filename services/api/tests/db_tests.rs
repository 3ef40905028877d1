//! `DbAdapter` against a real Postgres. These run only when `DATABASE_URL`
//! points at a database the tests may migrate and write to; otherwise each
//! test returns early. Every test works on its own fresh users, words and
//! courses, so they can share one database and run in parallel.

use api_lib::adapters::DbAdapter;
use bizchinese_core::domain::{EnrollOutcome, NewCourse, NewWord};
use bizchinese_core::invite::{generate_invite_code, DEFAULT_INVITE_QUOTA, INVITE_REWARD};
use bizchinese_core::ports::{DatabaseService, PortError};
use bizchinese_core::scheduling::{ProgressUpdate, ReviewAnswer};
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

async fn connect() -> Option<(DbAdapter, PgPool)> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set; skipping Postgres adapter test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(32)
        .connect(&url)
        .await
        .unwrap();
    let db = DbAdapter::new(pool.clone());
    db.run_migrations().await.unwrap();
    Some((db, pool))
}

async fn new_user(db: &DbAdapter) -> Uuid {
    db.create_user(&format!("{}@example.com", Uuid::new_v4()), "hash")
        .await
        .unwrap()
        .id
}

/// Inserts `n` words unique to this test and returns their ids.
async fn new_words(db: &DbAdapter, n: usize) -> Vec<i32> {
    let tag = Uuid::new_v4().simple().to_string();
    let words: Vec<NewWord> = (0..n)
        .map(|i| NewWord {
            chinese: format!("词{}{}", i, tag),
            pinyin: "ci".to_string(),
            english: "word".to_string(),
            scene: None,
            example: None,
            category: "business".to_string(),
            frequency: 3,
        })
        .collect();
    db.insert_words(&words).await.unwrap();
    let chinese: Vec<String> = words.into_iter().map(|w| w.chinese).collect();
    db.words_by_chinese(&chinese)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect()
}

fn course(word_ids: Vec<i32>, created_by: Option<Uuid>) -> NewCourse {
    NewCourse {
        title: "Test course".to_string(),
        slug: format!("test-{}", Uuid::new_v4()),
        category: "business".to_string(),
        description: None,
        difficulty: "beginner".to_string(),
        is_custom: created_by.is_some(),
        created_by,
        source_text: None,
        word_ids,
    }
}

#[tokio::test]
async fn answers_upsert_a_single_progress_row() {
    let Some((db, pool)) = connect().await else { return };
    let user = new_user(&db).await;
    let word = new_words(&db, 1).await[0];
    let now = Utc::now();

    let first = db
        .record_answer(user, word, &ProgressUpdate::from_answer(ReviewAnswer::new(false, false), now))
        .await
        .unwrap();
    let second = db
        .record_answer(user, word, &ProgressUpdate::from_answer(ReviewAnswer::new(true, true), now))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.review_count, 2);
    assert_eq!(second.correct_count, 1);
    assert!(second.mastered);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_progress WHERE user_id = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let missing = db
        .record_answer(user, -1, &ProgressUpdate::from_answer(ReviewAnswer::new(false, true), now))
        .await;
    assert!(matches!(missing, Err(PortError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_answers_still_share_one_row() {
    let Some((db, pool)) = connect().await else { return };
    let user = new_user(&db).await;
    let word = new_words(&db, 1).await[0];

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let db = db.clone();
        tasks.spawn(async move {
            let update = ProgressUpdate::from_answer(ReviewAnswer::new(false, true), Utc::now());
            db.record_answer(user, word, &update).await.unwrap();
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let (rows, reviews): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(review_count), 0)::int8 FROM user_progress WHERE user_id = $1",
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!((rows, reviews), (1, 8));
}

#[tokio::test]
async fn due_queue_takes_each_word_once_from_the_lowest_course() {
    let Some((db, _)) = connect().await else { return };
    let user = new_user(&db).await;
    let words = new_words(&db, 3).await;
    let first = db.create_course(course(words.clone(), None), None).await.unwrap();
    let second = db.create_course(course(words[..2].to_vec(), None), None).await.unwrap();
    assert!(first.id < second.id);

    let now = Utc::now();
    let overdue = ProgressUpdate {
        mastery_score: 0,
        mastered: false,
        correct: false,
        last_reviewed_at: now - Duration::days(3),
        next_review_at: now - Duration::days(1),
    };
    for word in &words[..2] {
        db.record_answer(user, *word, &overdue).await.unwrap();
    }
    let later = ProgressUpdate {
        next_review_at: now + Duration::days(2),
        ..overdue
    };
    db.record_answer(user, words[2], &later).await.unwrap();

    let due = db.due_reviews(user, now).await.unwrap();
    let mut due_words: Vec<i32> = due.iter().map(|item| item.word.id).collect();
    due_words.sort();
    assert_eq!(due_words, words[..2].to_vec());
    assert!(due.iter().all(|item| item.course_id == first.id));

    let sources = db.review_sources(user, now).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].course_slug, first.slug);
    assert_eq!(sources[0].count, 2);
}

#[tokio::test]
async fn enrolling_twice_keeps_one_enrollment() {
    let Some((db, _)) = connect().await else { return };
    let user = new_user(&db).await;
    let preset = db.create_course(course(new_words(&db, 1).await, None), None).await.unwrap();

    assert_eq!(db.enroll(user, preset.id).await.unwrap(), EnrollOutcome::Enrolled);
    assert_eq!(db.enroll(user, preset.id).await.unwrap(), EnrollOutcome::AlreadyEnrolled);
    assert_eq!(db.list_enrollments(user).await.unwrap().len(), 1);
    assert!(matches!(db.enroll(user, -1).await, Err(PortError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invite_code_is_redeemed_by_exactly_one_user() {
    let Some((db, _)) = connect().await else { return };
    let inviter = new_user(&db).await;
    let code = generate_invite_code();
    db.create_invite_code(inviter, &code).await.unwrap();
    assert!(!db.redeem_invite_code(&code, inviter).await.unwrap());

    let mut tasks = JoinSet::new();
    for _ in 0..5 {
        let db = db.clone();
        let code = code.clone();
        tasks.spawn(async move {
            let friend = new_user(&db).await;
            db.redeem_invite_code(&code, friend).await.unwrap()
        });
    }
    let mut redeemed = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap() {
            redeemed += 1;
        }
    }
    assert_eq!(redeemed, 1);

    let inviter = db.get_user(inviter).await.unwrap();
    assert_eq!(inviter.invited_count, 1);
    assert_eq!(inviter.invite_quota, DEFAULT_INVITE_QUOTA + INVITE_REWARD);
    assert!(db.list_invite_codes(inviter.id).await.unwrap()[0].is_used);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_plays_stop_at_the_daily_limit() {
    let Some((db, pool)) = connect().await else { return };
    let user = new_user(&db).await;
    let today = Utc::now().date_naive();

    let mut tasks = JoinSet::new();
    for _ in 0..30 {
        let db = db.clone();
        tasks.spawn(async move { db.consume_pronunciation(user, today, 10).await.unwrap() });
    }
    let mut allowed = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_some() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 10);

    let stored: i32 = sqlx::query_scalar(
        "SELECT pronunciation_count FROM user_usage WHERE user_id = $1 AND usage_date = $2",
    )
    .bind(user)
    .bind(today)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stored, 10);

    let tomorrow = today.succ_opt().unwrap();
    assert_eq!(db.consume_pronunciation(user, tomorrow, 10).await.unwrap(), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_custom_courses_respect_the_limit() {
    let Some((db, pool)) = connect().await else { return };
    let user = new_user(&db).await;
    let words = new_words(&db, 2).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let db = db.clone();
        let new_course = course(words.clone(), Some(user));
        tasks.spawn(async move { db.create_course(new_course, Some(3)).await });
    }
    let (mut created, mut refused) = (0, 0);
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => created += 1,
            Err(PortError::LimitReached(_)) => refused += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!((created, refused), (3, 5));
    assert_eq!(db.get_user(user).await.unwrap().custom_course_usage_count, 3);
    assert_eq!(db.list_enrollments(user).await.unwrap().len(), 3);

    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE created_by = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(owned, 3);

    // No limit means no refusal.
    db.create_course(course(words, Some(user)), None).await.unwrap();
    assert_eq!(db.get_user(user).await.unwrap().custom_course_usage_count, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_practice_sessions_all_count() {
    let Some((db, _)) = connect().await else { return };
    let user = new_user(&db).await;
    let course_id = db.create_course(course(new_words(&db, 1).await, None), None).await.unwrap().id;
    assert_eq!(db.advance_enrollment(user, course_id, Utc::now()).await.unwrap(), None);
    db.enroll(user, course_id).await.unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let db = db.clone();
        tasks.spawn(async move { db.advance_enrollment(user, course_id, Utc::now()).await.unwrap() });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(joined.unwrap().is_some());
    }
    let enrollment = db.get_enrollment(user, course_id).await.unwrap().unwrap();
    assert_eq!(enrollment.progress, 50);
    assert!(!enrollment.is_completed);

    for _ in 0..12 {
        db.advance_enrollment(user, course_id, Utc::now()).await.unwrap();
    }
    let enrollment = db.get_enrollment(user, course_id).await.unwrap().unwrap();
    assert_eq!(enrollment.progress, 100);
    assert!(enrollment.is_completed);
    assert!(enrollment.last_learned_at.is_some());
}
