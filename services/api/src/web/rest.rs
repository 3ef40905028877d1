//! services/api/src/web/rest.rs
//!
//! Contains the health endpoint and the master definition for the OpenAPI specification.

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{analyze, auth, billing, courses, practice, profile, review, views, words};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        courses::list_courses_handler,
        courses::course_detail_handler,
        courses::enroll_handler,
        courses::create_custom_course_handler,
        courses::custom_course_usage_handler,
        courses::practice_hub_handler,
        words::word_bank_handler,
        practice::record_practice_handler,
        review::record_progress_handler,
        review::review_queue_handler,
        review::review_summary_handler,
        review::achievements_handler,
        analyze::analyze_text_handler,
        billing::pronunciation_usage_handler,
        billing::checkout_handler,
        billing::creem_webhook_handler,
        profile::profile_handler,
        profile::create_invite_handler,
        profile::list_invites_handler,
        profile::create_wish_handler,
        profile::list_wishes_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest, auth::LoginRequest, auth::AuthResponse,
            courses::CourseListItem, courses::CourseListResponse, courses::CourseDetailResponse,
            courses::EnrollRequest, courses::EnrollResponse,
            courses::CreateCustomCourseRequest, courses::CreateCustomCourseResponse,
            courses::CustomCourseUsageResponse, courses::PracticeHubResponse,
            words::WordBankResponse,
            practice::WordResult, practice::PracticeRecordRequest, practice::PracticeRecordResponse,
            review::ProgressRequest, review::ProgressResponse, review::ReviewQueueResponse,
            review::ReviewSourceView, review::ReviewSummaryResponse,
            review::MilestoneView, review::AchievementsResponse,
            analyze::AnalyzeTextRequest, analyze::AnalyzeTextResponse, analyze::SuggestedWordView,
            billing::PronunciationUsageResponse, billing::CheckoutRequest,
            billing::CheckoutResponse, billing::WebhookResponse,
            profile::ProfileResponse, profile::CreateInviteResponse, profile::InviteListResponse,
            profile::CreateWishRequest, profile::WishListResponse,
            views::WordView, views::CourseWordView, views::CourseView, views::EnrollmentView,
            views::ProgressView, views::ReviewItemView, views::PracticeModeView,
            views::PracticeRecordView, views::UserView, views::InviteCodeView, views::WishView,
        )
    ),
    tags(
        (name = "BizChinese API", description = "Courses, spaced-repetition review, practice and billing for Chinese learners.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
