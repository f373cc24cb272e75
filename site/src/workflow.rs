//! Running a form workflow to completion for a single request.
//!
//! The HTTP surface has no long-lived session per visitor, so each request
//! builds a fresh [`Store`], replays the visitor's choices into it and reads
//! the outcome back from state.

use crate::store::StoreError;
use crate::types::{CourseId, SessionId, ValidationError};
use medcover_core::reducer::Reducer;
use medcover_runtime::{Store, StoreError as RuntimeError};
use thiserror::Error;

/// Why a workflow did not end in a stored submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Inputs were rejected before anything was sent to persistence
    #[error("{} invalid field(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    /// The course is unknown or inactive
    #[error("Course not found: {0}")]
    UnknownCourse(CourseId),

    /// The session is not an upcoming session of the course with spots left
    #[error("Session {0} is not open for booking")]
    SessionNotOpen(SessionId),

    /// The store refused the booking for lack of spots
    #[error("Only {available} spots left")]
    CapacityChanged {
        /// Spots left according to the store
        available: u32,
    },

    /// A collaborator failed; the request can be retried
    #[error("{0}")]
    Unavailable(String),

    /// The workflow runtime itself failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<StoreError> for WorkflowError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::CapacityExceeded { available, .. } => Self::CapacityChanged { available },
            StoreError::SessionNotFound(id) => Self::SessionNotOpen(id),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Send `action` and wait until it and every action it caused are reduced.
///
/// # Errors
///
/// Returns [`WorkflowError::Runtime`] if the store is shutting down.
pub async fn settle<S, A, E, R>(store: &Store<S, A, E, R>, action: A) -> Result<(), WorkflowError>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let mut handle = store.send(action).await?;
    handle.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_keep_the_reported_spots() {
        let error = WorkflowError::from(StoreError::CapacityExceeded {
            session_id: SessionId::new(),
            requested: 4,
            available: 1,
        });
        assert_eq!(error, WorkflowError::CapacityChanged { available: 1 });
    }

    #[test]
    fn backend_failures_are_retryable() {
        let error = WorkflowError::from(StoreError::Unavailable("timeout".into()));
        assert!(matches!(error, WorkflowError::Unavailable(msg) if msg.contains("timeout")));
    }
}
