//! POST /api/contact - general inquiries.

use crate::contact::{ContactForm, submit_contact};
use crate::server::error::AppError;
use crate::server::extract::Caller;
use crate::server::state::AppState;
use crate::types::ContactId;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Response after storing an inquiry.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    /// Stored inquiry id
    pub contact_id: ContactId,
    /// Confirmation text
    pub message: &'static str,
}

/// Submit an inquiry.
///
/// # Errors
///
/// 422 for a missing name or email, 503 if the store fails.
pub async fn create_contact(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let stored = submit_contact(state.submissions.as_ref(), &actor, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            contact_id: stored.id,
            message: "Thanks for getting in touch. We'll reply within one working day.",
        }),
    ))
}
