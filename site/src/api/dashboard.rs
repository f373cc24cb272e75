//! Portal and admin endpoints.
//!
//! - GET /api/portal - the caller's own submissions
//! - GET /api/admin/overview - every submission (admin)
//! - PATCH /api/admin/{quotes,bookings,contacts}/:id/status - set status (admin)
//! - POST /api/admin/bookings/:id/cancel - cancel and release spots (admin)

use crate::dashboard::{Overview, admin_overview, portal_overview};
use crate::server::error::AppError;
use crate::server::extract::Caller;
use crate::server::state::AppState;
use crate::status::{
    BookingStatus, CancelOutcome, ContactStatus, QuoteStatus, StatusChange, SubmissionStatus,
};
use crate::types::{BookingId, ContactId, QuoteId};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// New status, e.g. `"reviewed"`
    pub status: String,
}

/// The caller's own quotes, bookings and inquiries.
///
/// # Errors
///
/// 401 for anonymous callers.
pub async fn portal(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Overview>, AppError> {
    Ok(Json(portal_overview(state.submissions.as_ref(), &actor).await?))
}

/// Every submission.
///
/// # Errors
///
/// 401 for anonymous callers, 403 for non-admins.
pub async fn admin(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Overview>, AppError> {
    Ok(Json(admin_overview(state.submissions.as_ref(), &actor).await?))
}

async fn set_status<S>(
    state: &AppState,
    actor: &crate::actor::Actor,
    id: S::Id,
    update: &StatusUpdate,
) -> Result<Json<StatusChange<S>>, AppError>
where
    S: SubmissionStatus + Serialize,
{
    let to = update
        .status
        .trim()
        .to_ascii_lowercase()
        .parse::<S>()
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let change = state.lifecycle.set_status(actor, id, to).await?;
    Ok(Json(change))
}

/// Set a quote request's status.
///
/// # Errors
///
/// 400 unknown status, 403 non-admin, 404 unknown id, 409 refused by policy.
pub async fn quote_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<QuoteId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<StatusChange<QuoteStatus>>, AppError> {
    set_status(&state, &actor, id, &update).await
}

/// Set a booking's status. Spots are not touched; see [`cancel_booking`].
///
/// # Errors
///
/// As [`quote_status`].
pub async fn booking_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<BookingId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<StatusChange<BookingStatus>>, AppError> {
    set_status(&state, &actor, id, &update).await
}

/// Set an inquiry's status.
///
/// # Errors
///
/// As [`quote_status`].
pub async fn contact_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<ContactId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<StatusChange<ContactStatus>>, AppError> {
    set_status(&state, &actor, id, &update).await
}

/// Cancel a booking and return its participants to the session.
///
/// # Errors
///
/// 403 non-admin, 404 unknown id, 409 refused by policy.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<BookingId>,
) -> Result<Json<CancelOutcome>, AppError> {
    Ok(Json(state.lifecycle.cancel_booking(&actor, id).await?))
}
