//! services/api/src/web/courses.rs
//!
//! Course catalogue, enrollment, user-generated courses and the practice hub.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use bizchinese_core::courses::build_custom_course;
use bizchinese_core::domain::{Course, EnrollOutcome, Enrollment, PracticeMode};
use bizchinese_core::ports::PortError;
use bizchinese_core::subscription::{custom_course_limit, custom_course_usage, CourseUsage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::middleware::optional_user;
use crate::web::state::AppState;
use crate::web::views::{CourseView, CourseWordView, EnrollmentView, PracticeModeView};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CourseListItem {
    #[serde(flatten)]
    pub course: CourseView,
    pub is_enrolled: bool,
    pub progress: i32,
}

#[derive(Serialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseListItem>,
}

#[derive(Serialize, ToSchema)]
pub struct CourseDetailResponse {
    pub course: CourseView,
    pub words: Vec<CourseWordView>,
    /// Present when the caller is signed in and enrolled.
    pub enrollment: Option<EnrollmentView>,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub course_id: i32,
}

#[derive(Serialize, ToSchema)]
pub struct EnrollResponse {
    pub success: bool,
    pub already_enrolled: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCustomCourseRequest {
    pub title: String,
    pub word_ids: Vec<i32>,
    #[serde(default)]
    pub source_text: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateCustomCourseResponse {
    pub success: bool,
    pub course: CourseView,
}

#[derive(Serialize, ToSchema)]
pub struct CustomCourseUsageResponse {
    pub count: i32,
    /// Absent for unlimited plans.
    pub limit: Option<i32>,
    pub is_over_limit: bool,
}

impl From<CourseUsage> for CustomCourseUsageResponse {
    fn from(u: CourseUsage) -> Self {
        Self {
            count: u.count,
            limit: u.limit,
            is_over_limit: u.is_over_limit,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PracticeHubResponse {
    pub course: CourseView,
    pub modes: Vec<PracticeModeView>,
    pub words: Vec<CourseWordView>,
    pub enrollment: EnrollmentView,
}

/// Other users' custom courses stay out of the catalogue.
fn visible_to(course: &Course, user_id: Option<Uuid>) -> bool {
    !course.is_custom || (user_id.is_some() && course.created_by == user_id)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /courses - List courses, with enrollment state for signed-in users
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All courses", body = CourseListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = optional_user(&state, &headers).await;

    let courses = state
        .db
        .list_courses()
        .await
        .map_err(|e| HttpError::from_port("Failed to list courses", e))?;

    let enrollments: HashMap<i32, Enrollment> = match user_id {
        Some(user_id) => state
            .db
            .list_enrollments(user_id)
            .await
            .map_err(|e| HttpError::from_port("Failed to list enrollments", e))?
            .into_iter()
            .map(|e| (e.course_id, e))
            .collect(),
        None => HashMap::new(),
    };

    let courses = courses
        .into_iter()
        .filter(|c| visible_to(c, user_id))
        .map(|course| {
            let enrollment = enrollments.get(&course.id);
            CourseListItem {
                is_enrolled: enrollment.is_some(),
                progress: enrollment.map(|e| e.progress).unwrap_or(0),
                course: course.into(),
            }
        })
        .collect();

    Ok(Json(CourseListResponse { courses }))
}

/// GET /courses/{slug} - Course detail with its ordered word list
#[utoipa::path(
    get,
    path = "/courses/{slug}",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course detail", body = CourseDetailResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn course_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let course = state
        .db
        .get_course_by_slug(&slug)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course", e))?;

    let words = state
        .db
        .course_words(course.id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course words", e))?;

    let enrollment = match optional_user(&state, &headers).await {
        Some(user_id) => state
            .db
            .get_enrollment(user_id, course.id)
            .await
            .map_err(|e| HttpError::from_port("Failed to load enrollment", e))?,
        None => None,
    };

    Ok(Json(CourseDetailResponse {
        course: course.into(),
        words: words.into_iter().map(Into::into).collect(),
        enrollment: enrollment.map(Into::into),
    }))
}

/// POST /courses/enroll - Add a course to "my courses"
#[utoipa::path(
    post,
    path = "/courses/enroll",
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Enrolled, or already enrolled", body = EnrollResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<EnrollRequest>,
) -> Result<impl IntoResponse, HttpError> {
    if req.course_id <= 0 {
        return Err(HttpError::bad_request("Invalid course ID"));
    }

    state
        .db
        .get_course(req.course_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course", e))?;

    let outcome = state
        .db
        .enroll(user_id, req.course_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to enroll", e))?;

    let response = match outcome {
        EnrollOutcome::Enrolled => {
            info!("User {} enrolled in course {}", user_id, req.course_id);
            EnrollResponse {
                success: true,
                already_enrolled: false,
                message: "Course added successfully".to_string(),
            }
        }
        EnrollOutcome::AlreadyEnrolled => EnrollResponse {
            success: true,
            already_enrolled: true,
            message: "Course already added".to_string(),
        },
    };
    Ok(Json(response))
}

/// POST /courses/custom - Create a course from selected words
#[utoipa::path(
    post,
    path = "/courses/custom",
    request_body = CreateCustomCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CreateCustomCourseResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Free plan limit reached")
    )
)]
pub async fn create_custom_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateCustomCourseRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let new_course = build_custom_course(
        user_id,
        &req.title,
        req.word_ids,
        req.source_text.as_deref(),
        Utc::now(),
    )
    .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load user", e))?;
    let limit = custom_course_limit(user.plan);
    let course = match state.db.create_course(new_course, limit).await {
        Ok(course) => course,
        Err(PortError::LimitReached(_)) => {
            return Err(HttpError::forbidden(
                "Free plan allows a limited number of custom courses. Upgrade to create more.",
            )
            .with_details(json!({
                "requires_upgrade": true,
                "count": limit,
                "limit": limit,
            })));
        }
        Err(e) => return Err(HttpError::from_port("Failed to create custom course", e)),
    };
    info!("User {} created custom course {}", user_id, course.slug);

    Ok((
        StatusCode::CREATED,
        Json(CreateCustomCourseResponse {
            success: true,
            course: course.into(),
        }),
    ))
}

/// GET /courses/custom/usage - Custom course usage against the plan limit
#[utoipa::path(
    get,
    path = "/courses/custom/usage",
    responses(
        (status = 200, description = "Usage", body = CustomCourseUsageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn custom_course_usage_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load user", e))?;
    let usage = custom_course_usage(user.plan, user.custom_course_usage_count);
    Ok(Json(CustomCourseUsageResponse::from(usage)))
}

/// GET /courses/{slug}/practice - Practice modes and words of an enrolled course
#[utoipa::path(
    get,
    path = "/courses/{slug}/practice",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Practice hub", body = PracticeHubResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn practice_hub_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let course = state
        .db
        .get_course_by_slug(&slug)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course", e))?;

    let enrollment = state
        .db
        .get_enrollment(user_id, course.id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load enrollment", e))?
        .ok_or_else(|| HttpError::forbidden("Add this course before practicing"))?;

    let words = state
        .db
        .course_words(course.id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load course words", e))?;

    Ok(Json(PracticeHubResponse {
        course: course.into(),
        modes: PracticeMode::ALL.into_iter().map(Into::into).collect(),
        words: words.into_iter().map(Into::into).collect(),
        enrollment: enrollment.into(),
    }))
}
