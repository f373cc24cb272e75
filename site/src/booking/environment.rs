//! Collaborators injected into the booking wizard.

use crate::store::{CourseCatalog, SubmissionStore};
use crate::types::UserId;
use medcover_core::environment::Clock;
use std::sync::Arc;

/// Environment dependencies for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Clock deciding which sessions are still "upcoming"
    pub clock: Arc<dyn Clock>,
    /// Courses and sessions
    pub catalog: Arc<dyn CourseCatalog>,
    /// Where the booking is stored
    pub submissions: Arc<dyn SubmissionStore>,
    /// Signed-in visitor the booking is attributed to
    pub current_user: Option<UserId>,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment` for an anonymous visitor
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        catalog: Arc<dyn CourseCatalog>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            clock,
            catalog,
            submissions,
            current_user: None,
        }
    }

    /// Attribute bookings to `user`
    #[must_use]
    pub fn for_user(mut self, user: Option<UserId>) -> Self {
        self.current_user = user;
        self
    }
}
