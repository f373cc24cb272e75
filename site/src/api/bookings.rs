//! POST /api/bookings - book participants onto a course session.

use crate::booking::{BookingConfirmation, BookingRequest, book_session};
use crate::server::error::AppError;
use crate::server::extract::Caller;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Response after storing a booking.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Confirmation details
    #[serde(flatten)]
    pub confirmation: BookingConfirmation,
    /// Human-readable summary
    pub summary: String,
}

/// Book a session.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "Content-Type: application/json" \
///   -d '{"course_id": "...", "session_id": "...", "participants": 2,
///        "contact": {"name": "Jo Bloggs", "email": "jo@example.com"}}'
/// ```
///
/// # Errors
///
/// 404 unknown course, 409 session not open or too few spots left,
/// 422 validation problems, 503 store failure.
pub async fn create_booking(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let confirmation = book_session(state.booking_env(actor.user_id), request).await?;
    let summary = confirmation.summary();
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            confirmation,
            summary,
        }),
    ))
}
