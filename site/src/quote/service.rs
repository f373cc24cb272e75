//! One-shot quote submission.

use super::{QuoteAction, QuoteDraft, QuoteEnvironment, QuoteFormState, QuoteReceipt, QuoteReducer};
use crate::workflow::{WorkflowError, settle};
use medcover_runtime::Store;

/// Fill the form with `draft`, optionally take an estimate snapshot, submit.
///
/// # Errors
///
/// [`WorkflowError::Invalid`] when required fields are missing,
/// [`WorkflowError::Unavailable`] when the store failed.
#[tracing::instrument(skip_all, fields(event_type = %draft.event_type, with_estimate = with_estimate))]
pub async fn submit_quote(
    env: QuoteEnvironment,
    draft: QuoteDraft,
    with_estimate: bool,
) -> Result<QuoteReceipt, WorkflowError> {
    let store = Store::new(QuoteFormState::default(), QuoteReducer::new(), env);

    settle(&store, QuoteAction::Edit { draft }).await?;
    if with_estimate {
        settle(&store, QuoteAction::CalculateEstimate).await?;
    }
    settle(&store, QuoteAction::Submit).await?;

    store
        .state(|state| {
            if let Some(receipt) = &state.receipt {
                Ok(receipt.clone())
            } else if !state.validation_errors.is_empty() {
                Err(WorkflowError::Invalid(state.validation_errors.clone()))
            } else {
                let message = state.notice.map_or("quote request did not complete", |n| n.message());
                Err(WorkflowError::Unavailable(message.to_string()))
            }
        })
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::ContactDetails;
    use std::sync::Arc;

    fn draft() -> QuoteDraft {
        QuoteDraft {
            contact: ContactDetails {
                name: "Alex Byrne".into(),
                email: "alex@example.net".into(),
                ..ContactDetails::default()
            },
            event_type: "Marathon/Running Event".into(),
            expected_attendees: Some(50),
            event_duration_hours: Some(8),
            service_level: Some("basic".into()),
            ..QuoteDraft::default()
        }
    }

    #[tokio::test]
    async fn estimate_is_snapshotted_on_request() {
        let store = InMemoryStore::new();
        let env = QuoteEnvironment::new(Arc::new(store.clone()), None);

        let receipt = submit_quote(env, draft(), true).await.unwrap();
        assert_eq!(receipt.estimated_quote, Some(500));
        assert_eq!(store.quote_count(), 1);
    }

    #[tokio::test]
    async fn estimate_is_null_unless_requested() {
        let store = InMemoryStore::new();
        let env = QuoteEnvironment::new(Arc::new(store.clone()), None);

        let receipt = submit_quote(env, draft(), false).await.unwrap();
        assert_eq!(receipt.estimated_quote, None);
    }

    #[tokio::test]
    async fn missing_event_type_is_invalid() {
        let store = InMemoryStore::new();
        let env = QuoteEnvironment::new(Arc::new(store.clone()), None);
        let draft = QuoteDraft {
            event_type: "  ".into(),
            ..draft()
        };

        let error = submit_quote(env, draft, true).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Invalid(ref problems) if problems.len() == 1));
        assert_eq!(store.quote_count(), 0);
    }
}
