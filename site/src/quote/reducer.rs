//! Reducer for the quote request form.

use super::types::{QuoteAction, QuoteFormState, QuoteNotice, QuoteReceipt};
use crate::store::SubmissionStore;
use crate::types::UserId;
use medcover_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Environment dependencies for the quote reducer
#[derive(Clone)]
pub struct QuoteEnvironment {
    /// Where the request is stored
    pub submissions: Arc<dyn SubmissionStore>,
    /// Signed-in visitor the request is attributed to
    pub current_user: Option<UserId>,
}

impl QuoteEnvironment {
    /// Creates a new `QuoteEnvironment`
    #[must_use]
    pub fn new(submissions: Arc<dyn SubmissionStore>, current_user: Option<UserId>) -> Self {
        Self {
            submissions,
            current_user,
        }
    }
}

/// Reducer for the quote form
#[derive(Clone, Debug, Default)]
pub struct QuoteReducer;

impl QuoteReducer {
    /// Creates a new `QuoteReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for QuoteReducer {
    type State = QuoteFormState;
    type Action = QuoteAction;
    type Environment = QuoteEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if state.is_submitted() && !matches!(action, QuoteAction::QuoteSubmitted { .. }) {
            return SmallVec::new();
        }

        match action {
            // ========== Commands ==========
            QuoteAction::Edit { draft } => {
                if !state.submitting {
                    state.draft = draft;
                    state.estimate = None;
                }
                SmallVec::new()
            },

            QuoteAction::CalculateEstimate => {
                let breakdown = state.draft.breakdown();
                tracing::debug!(amount = breakdown.amount, "estimate calculated");
                state.estimate = Some(breakdown);
                SmallVec::new()
            },

            QuoteAction::Submit => {
                if state.submitting {
                    return SmallVec::new();
                }
                let problems = state.draft.problems();
                if !problems.is_empty() {
                    state.validation_errors = problems;
                    return SmallVec::new();
                }

                state.validation_errors.clear();
                state.notice = None;
                state.submitting = true;

                let request = state.draft.to_request(
                    state.estimate.as_ref().map(|e| e.amount),
                    env.current_user,
                );
                let submissions = Arc::clone(&env.submissions);
                smallvec![Effect::future(async move {
                    Some(match submissions.create_quote(request).await {
                        Ok(quote) => QuoteAction::QuoteSubmitted { quote },
                        Err(error) => QuoteAction::SubmissionFailed {
                            error: error.to_string(),
                        },
                    })
                })]
            },

            // ========== Results ==========
            QuoteAction::QuoteSubmitted { quote } => {
                tracing::info!(quote_id = %quote.id, "quote request submitted");
                state.submitting = false;
                state.receipt = Some(QuoteReceipt {
                    quote_id: quote.id,
                    estimated_quote: quote.request.estimated_quote,
                });
                SmallVec::new()
            },

            QuoteAction::SubmissionFailed { error } => {
                tracing::warn!(%error, "quote submission failed");
                state.submitting = false;
                state.notice = Some(QuoteNotice::SubmissionFailed);
                SmallVec::new()
            },
        }
    }
}
