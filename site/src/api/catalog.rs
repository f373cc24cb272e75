//! Training course catalog endpoints.
//!
//! - GET /api/courses - active courses, ordered by title
//! - GET /api/courses/:id/sessions - upcoming sessions with spots left

use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::types::{Course, CourseId, CourseSession};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

/// Shown when a course has no upcoming sessions.
pub const NO_SESSIONS_MESSAGE: &str =
    "No upcoming dates are available for this course. Contact us to arrange a date.";

/// Sessions of one course.
#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    /// Course the sessions belong to
    pub course_id: CourseId,
    /// Open sessions, ascending by date
    pub sessions: Vec<CourseSession>,
    /// Set when `sessions` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// List active courses.
///
/// ```bash
/// curl http://localhost:8080/api/courses
/// ```
///
/// # Errors
///
/// 503 if the catalog cannot be read.
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.catalog.active_courses().await?;
    Ok(Json(courses))
}

/// List the open sessions of an active course.
///
/// # Errors
///
/// 404 for unknown or inactive courses, 503 if the catalog cannot be read.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
) -> Result<Json<SessionsResponse>, AppError> {
    let course = state
        .catalog
        .course(course_id)
        .await?
        .filter(|course| course.is_active)
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    let sessions = state
        .catalog
        .open_sessions(course.id, state.clock.today())
        .await?;
    let message = sessions.is_empty().then_some(NO_SESSIONS_MESSAGE);

    Ok(Json(SessionsResponse {
        course_id,
        sessions,
        message,
    }))
}
