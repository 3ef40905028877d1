//! crates/bizchinese_core/src/achievements.rs
//!
//! Milestones and study streaks, computed from data the app already stores:
//! the number of mastered words and the days on which the user was active.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::domain::ActivityDates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    WordsMastered,
    StreakDays,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub target: i64,
    pub kind: MilestoneKind,
    pub icon: &'static str,
}

const fn words(id: &'static str, name: &'static str, description: &'static str, target: i64, icon: &'static str) -> Milestone {
    Milestone { id, name, description, target, kind: MilestoneKind::WordsMastered, icon }
}

const fn streak(id: &'static str, name: &'static str, description: &'static str, target: i64, icon: &'static str) -> Milestone {
    Milestone { id, name, description, target, kind: MilestoneKind::StreakDays, icon }
}

pub const WORD_MILESTONES: [Milestone; 7] = [
    words("first-10", "First Steps", "Master 10 words", 10, "🌱"),
    words("first-25", "Getting Started", "Master 25 words", 25, "📚"),
    words("first-50", "Building Foundation", "Master 50 words", 50, "🏗️"),
    words("first-100", "Century Club", "Master 100 words", 100, "💯"),
    words("first-250", "Vocabulary Builder", "Master 250 words", 250, "📖"),
    words("first-500", "Word Master", "Master 500 words", 500, "👑"),
    words("first-1000", "Language Expert", "Master 1000 words", 1000, "🌟"),
];

pub const STREAK_MILESTONES: [Milestone; 5] = [
    streak("streak-3", "3-Day Streak", "Study for 3 days in a row", 3, "🔥"),
    streak("streak-7", "Week Warrior", "Study for 7 days in a row", 7, "💪"),
    streak("streak-14", "Two Weeks Strong", "Study for 14 days in a row", 14, "⚡"),
    streak("streak-30", "Monthly Champion", "Study for 30 days in a row", 30, "🏆"),
    streak("streak-100", "Century Streak", "Study for 100 days in a row", 100, "🎯"),
];

/// Number of consecutive active days ending today, or ending yesterday when
/// the user has not studied yet today.
pub fn streak_days(activity: &ActivityDates, today: NaiveDate) -> i64 {
    let days: BTreeSet<NaiveDate> = activity
        .review_dates
        .iter()
        .chain(activity.practice_dates.iter())
        .copied()
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievements {
    pub streak_days: i64,
    pub total_mastered: i64,
    pub milestones: Vec<Milestone>,
    pub next_milestone: Option<Milestone>,
    pub encouragement: String,
}

impl Achievements {
    pub fn evaluate(total_mastered: i64, streak_days: i64) -> Self {
        let mut achieved = Vec::new();
        let mut next_milestone = None;

        for milestone in WORD_MILESTONES.iter().chain(STREAK_MILESTONES.iter()) {
            let progress = match milestone.kind {
                MilestoneKind::WordsMastered => total_mastered,
                MilestoneKind::StreakDays => streak_days,
            };
            if progress >= milestone.target {
                achieved.push(milestone.clone());
            } else if next_milestone.is_none() {
                next_milestone = Some(milestone.clone());
            }
        }

        Self {
            streak_days,
            total_mastered,
            milestones: achieved,
            next_milestone,
            encouragement: encouragement_message(total_mastered, streak_days),
        }
    }
}

pub fn encouragement_message(total_mastered: i64, streak_days: i64) -> String {
    if streak_days >= 30 {
        format!("🎉 Amazing! You've maintained a {}-day streak!", streak_days)
    } else if streak_days >= 7 {
        format!("🔥 Great! You're on a {}-day streak!", streak_days)
    } else if total_mastered >= 100 {
        format!("🌟 Excellent! You've mastered {} words!", total_mastered)
    } else if total_mastered >= 50 {
        format!("💪 Keep going! You've mastered {} words!", total_mastered)
    } else {
        "🚀 You're building a solid foundation!".to_string()
    }
}
