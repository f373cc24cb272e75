//! Persistence collaborators.
//!
//! Two traits split the catalog (read-only courses and sessions) from the
//! submission tables. Both are dyn-compatible so that reducers can capture
//! an `Arc<dyn ...>` inside their effects.
//!
//! # Implementations
//!
//! - [`memory::InMemoryStore`]: tests, the demo binary, `STORAGE_BACKEND=memory`
//! - [`postgres::PgStore`]: `PostgreSQL` via sqlx, `STORAGE_BACKEND=postgres`

use crate::status::{BookingStatus, SubmissionKind};
use crate::types::{
    BookingId, BookingView, ContactSubmission, Course, CourseBooking, CourseId, CourseSession,
    NewContactSubmission, NewCourseBooking, NewQuoteRequest, QuoteRequest, SessionId, UserId,
};
use chrono::NaiveDate;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors raised by persistence adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or the query failed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The session no longer has room for the requested participants.
    #[error("Session {session_id} has {available} spots left, {requested} requested")]
    CapacityExceeded {
        /// Session being booked
        session_id: SessionId,
        /// Participants asked for
        requested: u32,
        /// Spots left at the time of the attempt
        available: u32,
    },

    /// The session does not exist.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// A stored row could not be mapped back to a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Which submissions a listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every submission (admin dashboard)
    All,
    /// Submissions made by one user (portal)
    Owner(UserId),
}

impl Scope {
    /// Whether a submission owned by `owner` falls in the scope
    #[must_use]
    pub fn includes(self, owner: Option<UserId>) -> bool {
        match self {
            Self::All => true,
            Self::Owner(user) => owner == Some(user),
        }
    }
}

/// What [`SubmissionStore::cancel_booking`] changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cancellation {
    /// Session the booking was for
    pub session_id: SessionId,
    /// Stored status before cancelling
    pub previous_status: String,
    /// Spots returned to the session
    pub released_spots: u32,
}

/// Whether cancelling a booking currently in `previous` hands its
/// participants back to the session.
///
/// Completed bookings keep their spots (the session has run), and a booking
/// whose spots were already released never releases them again.
#[must_use]
pub fn releases_spots(previous: BookingStatus, already_released: bool) -> bool {
    !already_released && previous != BookingStatus::Completed
}

/// Read access to training courses and their sessions.
pub trait CourseCatalog: Send + Sync {
    /// Active courses ordered by title.
    fn active_courses(&self) -> StoreFuture<'_, Vec<Course>>;

    /// Sessions of `course_id` dated `today` or later with spots left,
    /// ascending by date then start time.
    fn open_sessions(
        &self,
        course_id: CourseId,
        today: NaiveDate,
    ) -> StoreFuture<'_, Vec<CourseSession>>;

    /// One course by id.
    fn course(&self, id: CourseId) -> StoreFuture<'_, Option<Course>>;

    /// One session by id.
    fn session(&self, id: SessionId) -> StoreFuture<'_, Option<CourseSession>>;
}

/// Durable record of quotes, bookings and contact inquiries.
///
/// Core fields are written once; afterwards only `status` changes.
pub trait SubmissionStore: Send + Sync {
    /// Insert a quote request with status `new`.
    fn create_quote(&self, quote: NewQuoteRequest) -> StoreFuture<'_, QuoteRequest>;

    /// Insert a booking with status `pending`, taking its participants from
    /// the session's `available_spots` in the same atomic step.
    ///
    /// Fails with [`StoreError::CapacityExceeded`] without writing anything
    /// when the session has fewer spots than requested.
    fn create_booking(&self, booking: NewCourseBooking) -> StoreFuture<'_, CourseBooking>;

    /// Insert a contact inquiry with status `new`.
    fn create_contact(&self, contact: NewContactSubmission) -> StoreFuture<'_, ContactSubmission>;

    /// Quote requests in scope, newest first.
    fn list_quotes(&self, scope: Scope) -> StoreFuture<'_, Vec<QuoteRequest>>;

    /// Bookings in scope joined with their session and course, newest first.
    fn list_bookings(&self, scope: Scope) -> StoreFuture<'_, Vec<BookingView>>;

    /// Contact inquiries in scope, newest first.
    fn list_contacts(&self, scope: Scope) -> StoreFuture<'_, Vec<ContactSubmission>>;

    /// Stored status text of one submission.
    fn status_of(&self, kind: SubmissionKind, id: Uuid) -> StoreFuture<'_, Option<String>>;

    /// Overwrite the status of one submission. Returns `false` if no row matched.
    fn update_status(
        &self,
        kind: SubmissionKind,
        id: Uuid,
        status: &'static str,
    ) -> StoreFuture<'_, bool>;

    /// Mark a booking cancelled and return its participants to the session,
    /// atomically. Spots go back at most once per booking (see
    /// [`releases_spots`]); a booking moved out of `cancelled` and cancelled
    /// again releases nothing.
    fn cancel_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Cancellation>>;
}
