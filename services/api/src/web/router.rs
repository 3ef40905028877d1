//! services/api/src/web/router.rs
//!
//! Assembles the public and protected routes around a shared `AppState`.

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    analyze::analyze_text_handler,
    auth::{login_handler, logout_handler, signup_handler},
    billing::{checkout_handler, creem_webhook_handler, pronunciation_usage_handler},
    courses::{
        course_detail_handler, create_custom_course_handler, custom_course_usage_handler,
        enroll_handler, list_courses_handler, practice_hub_handler,
    },
    middleware::require_auth,
    practice::record_practice_handler,
    profile::{
        create_invite_handler, create_wish_handler, list_invites_handler, list_wishes_handler,
        profile_handler,
    },
    rest::{health_handler, ApiDoc},
    review::{
        achievements_handler, record_progress_handler, review_queue_handler,
        review_summary_handler,
    },
    state::AppState,
    words::word_bank_handler,
};

/// Pasted texts are capped well below this.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full application router, Swagger UI included. Layers such as CORS
/// and request tracing are added by the caller.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/courses", get(list_courses_handler))
        .route("/courses/{slug}", get(course_detail_handler))
        .route("/wordbanks/{category}", get(word_bank_handler))
        .route("/webhooks/creem", post(creem_webhook_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/courses/enroll", post(enroll_handler))
        .route("/courses/custom", post(create_custom_course_handler))
        .route("/courses/custom/usage", get(custom_course_usage_handler))
        .route("/courses/{slug}/practice", get(practice_hub_handler))
        .route("/practice/record", post(record_practice_handler))
        .route("/progress", post(record_progress_handler))
        .route("/review", get(review_queue_handler))
        .route("/review/summary", get(review_summary_handler))
        .route("/achievements", get(achievements_handler))
        .route("/analyze-text", post(analyze_text_handler))
        .route("/usage/pronunciation", post(pronunciation_usage_handler))
        .route("/checkout", post(checkout_handler))
        .route("/profile", get(profile_handler))
        .route("/invites", post(create_invite_handler).get(list_invites_handler))
        .route("/wishes", post(create_wish_handler).get(list_wishes_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
