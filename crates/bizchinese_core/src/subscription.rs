//! crates/bizchinese_core/src/subscription.rs
//!
//! Plan tiers and the usage limits attached to them.

use serde::{Deserialize, Serialize};

/// Daily pronunciation plays allowed on the free plan.
pub const FREE_DAILY_PRONUNCIATION_LIMIT: i32 = 10;

/// Custom courses a free user may generate over the account's lifetime.
pub const FREE_CUSTOM_COURSE_LIMIT: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Plan::Free),
            "pro" => Some(Plan::Pro),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }
}

/// Daily pronunciation plays a plan may use; `None` when unmetered.
pub fn pronunciation_limit(plan: Plan) -> Option<i32> {
    if plan.is_paid() {
        None
    } else {
        Some(FREE_DAILY_PRONUNCIATION_LIMIT)
    }
}

/// Outcome of a pronunciation play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Paid plans are not metered.
    Unlimited,
    /// The play was counted; `used` includes it.
    Allowed { used: i32, limit: i32 },
    Exceeded { used: i32, limit: i32 },
}

/// `counted` is the day's total after the store accepted the play, or
/// `None` when the store refused it because the limit was already reached.
pub fn pronunciation_decision(plan: Plan, counted: Option<i32>) -> QuotaDecision {
    match (pronunciation_limit(plan), counted) {
        (None, _) => QuotaDecision::Unlimited,
        (Some(limit), Some(used)) => QuotaDecision::Allowed { used, limit },
        (Some(limit), None) => QuotaDecision::Exceeded { used: limit, limit },
    }
}

/// Custom courses a plan may create; `None` means unlimited.
pub fn custom_course_limit(plan: Plan) -> Option<i32> {
    if plan.is_paid() {
        None
    } else {
        Some(FREE_CUSTOM_COURSE_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseUsage {
    pub count: i32,
    /// `None` means unlimited.
    pub limit: Option<i32>,
    pub is_over_limit: bool,
}

pub fn custom_course_usage(plan: Plan, count: i32) -> CourseUsage {
    let limit = custom_course_limit(plan);
    CourseUsage {
        count,
        limit,
        is_over_limit: limit.is_some_and(|l| count >= l),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_round_trips_through_its_name() {
        for plan in [Plan::Free, Plan::Pro, Plan::Enterprise] {
            assert_eq!(Plan::parse(plan.as_str()), Some(plan));
        }
        assert_eq!(Plan::parse("max"), None);
    }

    #[test]
    fn free_plan_is_capped_at_ten_plays() {
        assert_eq!(pronunciation_limit(Plan::Free), Some(10));
        assert_eq!(
            pronunciation_decision(Plan::Free, Some(10)),
            QuotaDecision::Allowed { used: 10, limit: 10 }
        );
        assert_eq!(
            pronunciation_decision(Plan::Free, None),
            QuotaDecision::Exceeded { used: 10, limit: 10 }
        );
    }

    #[test]
    fn paid_plans_are_unlimited() {
        assert_eq!(pronunciation_limit(Plan::Pro), None);
        assert_eq!(pronunciation_decision(Plan::Pro, None), QuotaDecision::Unlimited);
        assert_eq!(custom_course_limit(Plan::Enterprise), None);
        assert!(!custom_course_usage(Plan::Enterprise, 99).is_over_limit);
        assert_eq!(custom_course_usage(Plan::Pro, 4).limit, None);
    }

    #[test]
    fn free_users_get_three_custom_courses() {
        assert!(!custom_course_usage(Plan::Free, 2).is_over_limit);
        assert!(custom_course_usage(Plan::Free, 3).is_over_limit);
    }
}
