//! General contact inquiries.

use crate::actor::Actor;
use crate::store::SubmissionStore;
use crate::types::{ContactDetails, ContactSubmission, NewContactSubmission, non_blank};
use crate::workflow::WorkflowError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contact form as posted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// Who is asking
    pub contact: ContactDetails,
    /// Kind of event the inquiry is about
    pub event_type: Option<String>,
    /// Event date
    pub event_date: Option<NaiveDate>,
    /// Expected attendance, free text ("about 300")
    pub attendees: Option<String>,
    /// Message body
    pub message: Option<String>,
}

/// Validate and store an inquiry.
///
/// # Errors
///
/// [`WorkflowError::Invalid`] for a missing name or email (nothing is
/// stored), [`WorkflowError::Unavailable`] if the store fails.
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    store: &dyn SubmissionStore,
    actor: &Actor,
    form: ContactForm,
) -> Result<ContactSubmission, WorkflowError> {
    let problems = form.contact.problems();
    if !problems.is_empty() {
        return Err(WorkflowError::Invalid(problems));
    }

    let submission = NewContactSubmission {
        contact: form.contact.normalized(),
        event_type: non_blank(form.event_type),
        event_date: form.event_date,
        attendees: non_blank(form.attendees),
        message: non_blank(form.message),
        user_id: actor.user_id,
    };
    let stored = store.create_contact(submission).await?;
    tracing::info!(contact_id = %stored.id, "contact inquiry received");
    Ok(stored)
}
