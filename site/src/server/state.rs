//! Application state shared by every handler.

use crate::booking::BookingEnvironment;
use crate::quote::QuoteEnvironment;
use crate::status::StatusLifecycle;
use crate::store::{CourseCatalog, SubmissionStore};
use crate::types::UserId;
use medcover_core::environment::Clock;
use std::sync::Arc;

/// Shared collaborators. Cloned (cheaply, via `Arc`) per request.
#[derive(Clone)]
pub struct AppState {
    /// Courses and sessions
    pub catalog: Arc<dyn CourseCatalog>,
    /// Quotes, bookings and inquiries
    pub submissions: Arc<dyn SubmissionStore>,
    /// Admin status changes
    pub lifecycle: StatusLifecycle,
    /// Source of "today" for session filtering
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create the state.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CourseCatalog>,
        submissions: Arc<dyn SubmissionStore>,
        lifecycle: StatusLifecycle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            submissions,
            lifecycle,
            clock,
        }
    }

    /// Booking wizard environment for one caller
    #[must_use]
    pub fn booking_env(&self, user: Option<UserId>) -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.catalog),
            Arc::clone(&self.submissions),
        )
        .for_user(user)
    }

    /// Quote form environment for one caller
    #[must_use]
    pub fn quote_env(&self, user: Option<UserId>) -> QuoteEnvironment {
        QuoteEnvironment::new(Arc::clone(&self.submissions), user)
    }
}
