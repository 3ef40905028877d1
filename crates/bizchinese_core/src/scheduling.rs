//! crates/bizchinese_core/src/scheduling.rs
//!
//! Spaced-repetition rules. A word's next review time is picked from four
//! fixed offsets depending on whether the answer was given while reviewing
//! or while learning, and whether the user knew the word.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// The score stored for a word the user knew on their latest answer.
pub const FULL_MASTERY: i32 = 100;

/// Average time spent on one review card, in minutes.
const MINUTES_PER_REVIEW: f64 = 0.2;

/// A single answer for a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewAnswer {
    /// `true` when answered from the review queue, `false` while learning.
    pub is_review: bool,
    pub known: bool,
}

impl ReviewAnswer {
    pub fn new(is_review: bool, known: bool) -> Self {
        Self { is_review, known }
    }

    /// Offset between the answer and the next review.
    pub fn interval(&self) -> Duration {
        match (self.is_review, self.known) {
            (true, true) => Duration::days(2),
            (true, false) => Duration::minutes(10),
            (false, true) => Duration::days(1),
            (false, false) => Duration::hours(1),
        }
    }

    pub fn next_review(&self, answered_at: DateTime<Utc>) -> DateTime<Utc> {
        answered_at + self.interval()
    }
}

/// The values written to a `user_progress` row for one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub mastery_score: i32,
    pub mastered: bool,
    pub correct: bool,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

impl ProgressUpdate {
    pub fn from_answer(answer: ReviewAnswer, answered_at: DateTime<Utc>) -> Self {
        Self {
            mastery_score: if answer.known { FULL_MASTERY } else { 0 },
            mastered: answer.known,
            correct: answer.known,
            last_reviewed_at: answered_at,
            next_review_at: answer.next_review(answered_at),
        }
    }
}

/// Last second of the UTC day containing `now`. Words scheduled before this
/// instant are due today.
pub fn review_window_end(now: DateTime<Utc>) -> DateTime<Utc> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    now.date_naive().and_time(end_of_day).and_utc()
}

/// Rough session length for `count` due words, never less than a minute.
pub fn estimated_review_minutes(count: i64) -> i64 {
    let minutes = (count.max(0) as f64 * MINUTES_PER_REVIEW).ceil() as i64;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn known_review_answer_is_scheduled_two_days_out() {
        let now = at(9, 30);
        let next = ReviewAnswer::new(true, true).next_review(now);
        assert_eq!(next - now, Duration::days(2));
    }

    #[test]
    fn each_cell_of_the_schedule_table() {
        let now = at(12, 0);
        assert_eq!(ReviewAnswer::new(true, false).next_review(now), now + Duration::minutes(10));
        assert_eq!(ReviewAnswer::new(false, true).next_review(now), now + Duration::hours(24));
        assert_eq!(ReviewAnswer::new(false, false).next_review(now), now + Duration::minutes(60));
    }

    #[test]
    fn progress_update_mirrors_the_answer() {
        let now = at(8, 0);
        let known = ProgressUpdate::from_answer(ReviewAnswer::new(false, true), now);
        assert_eq!(known.mastery_score, FULL_MASTERY);
        assert!(known.mastered);
        assert_eq!(known.last_reviewed_at, now);

        let forgot = ProgressUpdate::from_answer(ReviewAnswer::new(true, false), now);
        assert_eq!(forgot.mastery_score, 0);
        assert!(!forgot.mastered);
        assert!(!forgot.correct);
        assert_eq!(forgot.next_review_at, now + Duration::minutes(10));
    }

    #[test]
    fn window_ends_at_last_second_of_the_day() {
        let end = review_window_end(at(0, 5));
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn estimated_minutes_rounds_up_with_a_floor_of_one() {
        assert_eq!(estimated_review_minutes(0), 1);
        assert_eq!(estimated_review_minutes(3), 1);
        assert_eq!(estimated_review_minutes(6), 2);
        assert_eq!(estimated_review_minutes(50), 10);
    }
}
