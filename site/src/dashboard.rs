//! Read-only overviews: the admin dashboard and the customer portal.
//!
//! A failing list never fails the page. It comes back empty and a notice
//! says which list could not be loaded.

use crate::actor::{Actor, Role};
use crate::store::{Scope, StoreError, SubmissionStore};
use crate::types::{BookingView, ContactSubmission, QuoteRequest};
use serde::Serialize;
use thiserror::Error;

/// Why an overview was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The caller is not signed in
    #[error("Sign in to view your submissions")]
    SignInRequired,
    /// The caller is signed in but not an admin
    #[error("Admin access required")]
    Forbidden,
}

/// Submissions visible to the caller, each list newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Quote requests
    pub quotes: Vec<QuoteRequest>,
    /// Course bookings with their session and course
    pub bookings: Vec<BookingView>,
    /// Contact inquiries
    pub contacts: Vec<ContactSubmission>,
    /// Lists that could not be loaded
    pub notices: Vec<String>,
}

impl Overview {
    async fn load(store: &dyn SubmissionStore, scope: Scope) -> Self {
        let mut notices = Vec::new();
        let quotes = or_notice(store.list_quotes(scope).await, "quote requests", &mut notices);
        let bookings = or_notice(store.list_bookings(scope).await, "bookings", &mut notices);
        let contacts = or_notice(store.list_contacts(scope).await, "inquiries", &mut notices);
        Self {
            quotes,
            bookings,
            contacts,
            notices,
        }
    }
}

fn or_notice<T>(result: Result<Vec<T>, StoreError>, what: &str, notices: &mut Vec<String>) -> Vec<T> {
    result.unwrap_or_else(|error| {
        tracing::warn!(%error, list = what, "overview list unavailable");
        notices.push(format!("Your {what} could not be loaded right now."));
        Vec::new()
    })
}

/// Every submission, for staff.
///
/// # Errors
///
/// [`AccessError::Forbidden`] unless the caller is an admin.
pub async fn admin_overview(
    store: &dyn SubmissionStore,
    actor: &Actor,
) -> Result<Overview, AccessError> {
    if !actor.is_admin() {
        return Err(match actor.role {
            Role::Anonymous => AccessError::SignInRequired,
            Role::Customer | Role::Admin => AccessError::Forbidden,
        });
    }
    Ok(Overview::load(store, Scope::All).await)
}

/// The caller's own submissions.
///
/// # Errors
///
/// [`AccessError::SignInRequired`] for anonymous callers.
pub async fn portal_overview(
    store: &dyn SubmissionStore,
    actor: &Actor,
) -> Result<Overview, AccessError> {
    let user = actor.user_id.ok_or(AccessError::SignInRequired)?;
    Ok(Overview::load(store, Scope::Owner(user)).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{ContactDetails, NewContactSubmission, UserId};

    fn inquiry(user_id: Option<UserId>, name: &str) -> NewContactSubmission {
        NewContactSubmission {
            contact: ContactDetails {
                name: name.into(),
                email: "someone@example.com".into(),
                phone: None,
                company: None,
            },
            event_type: None,
            event_date: None,
            attendees: None,
            message: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn portal_shows_only_own_submissions() {
        let store = InMemoryStore::new();
        let me = UserId::new();
        store.create_contact(inquiry(Some(me), "Mine")).await.unwrap();
        store
            .create_contact(inquiry(Some(UserId::new()), "Theirs"))
            .await
            .unwrap();
        store.create_contact(inquiry(None, "Anonymous")).await.unwrap();

        let overview = portal_overview(&store, &Actor::customer(me)).await.unwrap();
        assert_eq!(overview.contacts.len(), 1);
        assert_eq!(overview.contacts[0].submission.contact.name, "Mine");
        assert!(overview.notices.is_empty());
    }

    #[tokio::test]
    async fn portal_refuses_anonymous_callers() {
        let store = InMemoryStore::new();
        let error = portal_overview(&store, &Actor::anonymous()).await.unwrap_err();
        assert_eq!(error, AccessError::SignInRequired);
    }

    #[tokio::test]
    async fn admin_sees_everything() {
        let store = InMemoryStore::new();
        store
            .create_contact(inquiry(Some(UserId::new()), "One"))
            .await
            .unwrap();
        store.create_contact(inquiry(None, "Two")).await.unwrap();

        let overview = admin_overview(&store, &Actor::admin(UserId::new()))
            .await
            .unwrap();
        assert_eq!(overview.contacts.len(), 2);

        let error = admin_overview(&store, &Actor::customer(UserId::new()))
            .await
            .unwrap_err();
        assert_eq!(error, AccessError::Forbidden);
    }

    #[tokio::test]
    async fn read_failures_become_notices() {
        let store = InMemoryStore::new();
        store.set_offline(true);

        let overview = admin_overview(&store, &Actor::admin(UserId::new()))
            .await
            .unwrap();
        assert!(overview.quotes.is_empty());
        assert_eq!(overview.notices.len(), 3);
    }
}
