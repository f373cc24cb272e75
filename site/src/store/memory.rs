//! In-memory store for tests, the demo binary and single-process deployments.
//!
//! All tables live behind one `RwLock`, so the capacity check and the spot
//! decrement of [`SubmissionStore::create_booking`] happen under the same
//! write guard.

use super::{
    Cancellation, CourseCatalog, Scope, StoreError, StoreFuture, SubmissionStore, releases_spots,
};
use crate::status::{BookingStatus, ContactStatus, QuoteStatus, SubmissionKind, SubmissionStatus};
use crate::types::{
    BookingId, BookingView, ContactId, ContactSubmission, Course, CourseBooking, CourseId,
    CourseSession, NewContactSubmission, NewCourseBooking, NewQuoteRequest, QuoteId, QuoteRequest,
    SessionId,
};
use chrono::NaiveDate;
use medcover_core::environment::{Clock, SystemClock};
use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    sessions: Vec<CourseSession>,
    quotes: Vec<QuoteRequest>,
    bookings: Vec<CourseBooking>,
    contacts: Vec<ContactSubmission>,
}

impl Tables {
    fn session_mut(&mut self, id: SessionId) -> Option<&mut CourseSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn view(&self, booking: &CourseBooking) -> BookingView {
        let session = self
            .sessions
            .iter()
            .find(|s| s.id == booking.booking.session_id);
        let course = session.and_then(|s| self.courses.iter().find(|c| c.id == s.course_id));
        BookingView {
            booking: booking.clone(),
            session_date: session.map(|s| s.session_date),
            start_time: session.map(|s| s.start_time),
            location: session.and_then(|s| s.location.clone()),
            course_title: course.map(|c| c.title.clone()),
        }
    }
}

/// Catalog and submission tables held in process memory.
///
/// Cloning shares the same tables.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Empty store stamping records with the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store stamping records with `clock`
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock,
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a course to the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is offline.
    pub fn add_course(&self, course: Course) -> Result<(), StoreError> {
        self.write()?.courses.push(course);
        Ok(())
    }

    /// Add a session to the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is offline.
    pub fn add_session(&self, session: CourseSession) -> Result<(), StoreError> {
        self.write()?.sessions.push(session);
        Ok(())
    }

    /// Add courses and sessions in one go (see [`super::seed::demo_catalog`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is offline.
    pub fn load_catalog(
        &self,
        courses: Vec<Course>,
        sessions: Vec<CourseSession>,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        tables.courses.extend(courses);
        tables.sessions.extend(sessions);
        Ok(())
    }

    /// Make every later call fail with [`StoreError::Unavailable`] (or recover).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Spots currently left on a session.
    #[must_use]
    pub fn spots_left(&self, id: SessionId) -> Option<u32> {
        let tables = self.tables.read().ok()?;
        tables
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.available_spots)
    }

    /// Number of stored bookings.
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.tables.read().map_or(0, |t| t.bookings.len())
    }

    /// Number of stored quote requests.
    #[must_use]
    pub fn quote_count(&self) -> usize {
        self.tables.read().map_or(0, |t| t.quotes.len())
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.check_online()?;
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.check_online()?;
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn insert_booking(&self, booking: NewCourseBooking) -> Result<CourseBooking, StoreError> {
        let created_at = self.clock.now();
        let mut tables = self.write()?;
        let session = tables
            .session_mut(booking.session_id)
            .ok_or(StoreError::SessionNotFound(booking.session_id))?;

        if booking.participants > session.available_spots {
            return Err(StoreError::CapacityExceeded {
                session_id: session.id,
                requested: booking.participants,
                available: session.available_spots,
            });
        }
        session.available_spots -= booking.participants;

        let record = CourseBooking {
            id: BookingId::new(),
            booking,
            status: BookingStatus::initial(),
            spots_released: false,
            created_at,
        };
        tables.bookings.push(record.clone());
        Ok(record)
    }

    fn set_status(&self, kind: SubmissionKind, id: Uuid, status: &str) -> Result<bool, StoreError> {
        let corrupt = |e: crate::status::UnknownStatus| StoreError::Corrupt(e.to_string());
        let mut tables = self.write()?;
        let updated = match kind {
            SubmissionKind::Quote => {
                let status = status.parse::<QuoteStatus>().map_err(corrupt)?;
                tables
                    .quotes
                    .iter_mut()
                    .find(|q| *q.id.as_uuid() == id)
                    .map(|q| q.status = status)
            },
            SubmissionKind::Booking => {
                let status = status.parse::<BookingStatus>().map_err(corrupt)?;
                tables
                    .bookings
                    .iter_mut()
                    .find(|b| *b.id.as_uuid() == id)
                    .map(|b| b.status = status)
            },
            SubmissionKind::Contact => {
                let status = status.parse::<ContactStatus>().map_err(corrupt)?;
                tables
                    .contacts
                    .iter_mut()
                    .find(|c| *c.id.as_uuid() == id)
                    .map(|c| c.status = status)
            },
        };
        Ok(updated.is_some())
    }

    fn cancel(&self, id: BookingId) -> Result<Option<Cancellation>, StoreError> {
        let mut tables = self.write()?;
        let Some(booking) = tables.bookings.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };

        let previous = booking.status;
        let session_id = booking.booking.session_id;
        let released = if releases_spots(previous, booking.spots_released) {
            booking.spots_released = true;
            booking.booking.participants
        } else {
            0
        };
        booking.status = BookingStatus::Cancelled;

        if let Some(session) = tables.session_mut(session_id) {
            session.available_spots = session.available_spots.saturating_add(released);
        }

        Ok(Some(Cancellation {
            session_id,
            previous_status: previous.as_str().to_string(),
            released_spots: released,
        }))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first; ties keep the most recent insert first.
fn newest_first<T: Clone>(
    rows: &[T],
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
) -> Vec<T> {
    let mut rows: Vec<T> = rows.iter().rev().cloned().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

impl CourseCatalog for InMemoryStore {
    fn active_courses(&self) -> StoreFuture<'_, Vec<Course>> {
        let result = self.read().map(|tables| {
            let mut courses: Vec<Course> =
                tables.courses.iter().filter(|c| c.is_active).cloned().collect();
            courses.sort_by(|a, b| a.title.cmp(&b.title));
            courses
        });
        Box::pin(ready(result))
    }

    fn open_sessions(
        &self,
        course_id: CourseId,
        today: NaiveDate,
    ) -> StoreFuture<'_, Vec<CourseSession>> {
        let result = self.read().map(|tables| {
            let mut sessions: Vec<CourseSession> = tables
                .sessions
                .iter()
                .filter(|s| s.course_id == course_id && s.is_offerable(today))
                .cloned()
                .collect();
            sessions.sort_by_key(|s| (s.session_date, s.start_time));
            sessions
        });
        Box::pin(ready(result))
    }

    fn course(&self, id: CourseId) -> StoreFuture<'_, Option<Course>> {
        let result = self
            .read()
            .map(|tables| tables.courses.iter().find(|c| c.id == id).cloned());
        Box::pin(ready(result))
    }

    fn session(&self, id: SessionId) -> StoreFuture<'_, Option<CourseSession>> {
        let result = self
            .read()
            .map(|tables| tables.sessions.iter().find(|s| s.id == id).cloned());
        Box::pin(ready(result))
    }
}

impl SubmissionStore for InMemoryStore {
    fn create_quote(&self, quote: NewQuoteRequest) -> StoreFuture<'_, QuoteRequest> {
        let record = QuoteRequest {
            id: QuoteId::new(),
            request: quote,
            status: QuoteStatus::initial(),
            created_at: self.clock.now(),
        };
        let result = self.write().map(|mut tables| {
            tables.quotes.push(record.clone());
            record
        });
        Box::pin(ready(result))
    }

    fn create_booking(&self, booking: NewCourseBooking) -> StoreFuture<'_, CourseBooking> {
        Box::pin(ready(self.insert_booking(booking)))
    }

    fn create_contact(&self, contact: NewContactSubmission) -> StoreFuture<'_, ContactSubmission> {
        let record = ContactSubmission {
            id: ContactId::new(),
            submission: contact,
            status: ContactStatus::initial(),
            created_at: self.clock.now(),
        };
        let result = self.write().map(|mut tables| {
            tables.contacts.push(record.clone());
            record
        });
        Box::pin(ready(result))
    }

    fn list_quotes(&self, scope: Scope) -> StoreFuture<'_, Vec<QuoteRequest>> {
        let result = self.read().map(|tables| {
            let rows: Vec<QuoteRequest> = tables
                .quotes
                .iter()
                .filter(|q| scope.includes(q.request.user_id))
                .cloned()
                .collect();
            newest_first(&rows, |q| q.created_at)
        });
        Box::pin(ready(result))
    }

    fn list_bookings(&self, scope: Scope) -> StoreFuture<'_, Vec<BookingView>> {
        let result = self.read().map(|tables| {
            let rows: Vec<BookingView> = tables
                .bookings
                .iter()
                .filter(|b| scope.includes(b.booking.user_id))
                .map(|b| tables.view(b))
                .collect();
            newest_first(&rows, |b| b.booking.created_at)
        });
        Box::pin(ready(result))
    }

    fn list_contacts(&self, scope: Scope) -> StoreFuture<'_, Vec<ContactSubmission>> {
        let result = self.read().map(|tables| {
            let rows: Vec<ContactSubmission> = tables
                .contacts
                .iter()
                .filter(|c| scope.includes(c.submission.user_id))
                .cloned()
                .collect();
            newest_first(&rows, |c| c.created_at)
        });
        Box::pin(ready(result))
    }

    fn status_of(&self, kind: SubmissionKind, id: Uuid) -> StoreFuture<'_, Option<String>> {
        let result = self.read().map(|tables| {
            let status = match kind {
                SubmissionKind::Quote => tables
                    .quotes
                    .iter()
                    .find(|q| *q.id.as_uuid() == id)
                    .map(|q| q.status.as_str()),
                SubmissionKind::Booking => tables
                    .bookings
                    .iter()
                    .find(|b| *b.id.as_uuid() == id)
                    .map(|b| b.status.as_str()),
                SubmissionKind::Contact => tables
                    .contacts
                    .iter()
                    .find(|c| *c.id.as_uuid() == id)
                    .map(|c| c.status.as_str()),
            };
            status.map(str::to_string)
        });
        Box::pin(ready(result))
    }

    fn update_status(
        &self,
        kind: SubmissionKind,
        id: Uuid,
        status: &'static str,
    ) -> StoreFuture<'_, bool> {
        Box::pin(ready(self.set_status(kind, id, status)))
    }

    fn cancel_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Cancellation>> {
        Box::pin(ready(self.cancel(id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{ContactDetails, UserId};
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn course(title: &str, active: bool) -> Course {
        Course {
            id: CourseId::new(),
            title: title.to_string(),
            description: None,
            duration: None,
            price_pence: Some(9_500),
            category: None,
            is_active: active,
        }
    }

    fn session(course_id: CourseId, date: NaiveDate, spots: u32) -> CourseSession {
        CourseSession {
            id: SessionId::new(),
            course_id,
            session_date: date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            location: Some("Leeds".into()),
            available_spots: spots,
        }
    }

    fn booking(session_id: SessionId, participants: u32) -> NewCourseBooking {
        NewCourseBooking {
            session_id,
            contact: ContactDetails {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                ..ContactDetails::default()
            },
            participants,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn active_courses_are_sorted_by_title() {
        let store = InMemoryStore::new();
        store.add_course(course("Paediatric First Aid", true)).unwrap();
        store.add_course(course("Archived", false)).unwrap();
        store.add_course(course("Emergency First Aid", true)).unwrap();

        let titles: Vec<String> = store
            .active_courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Emergency First Aid", "Paediatric First Aid"]);
    }

    #[tokio::test]
    async fn open_sessions_skip_full_and_past_dates() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let other = course("Other", true);
        store.add_course(efa.clone()).unwrap();
        store.add_session(session(efa.id, day(20), 4)).unwrap();
        store.add_session(session(efa.id, day(12), 2)).unwrap();
        store.add_session(session(efa.id, day(15), 0)).unwrap();
        store.add_session(session(efa.id, day(1), 6)).unwrap();
        store.add_session(session(other.id, day(14), 6)).unwrap();

        let dates: Vec<NaiveDate> = store
            .open_sessions(efa.id, day(10))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.session_date)
            .collect();
        assert_eq!(dates, vec![day(12), day(20)]);

        assert!(store.open_sessions(CourseId::new(), day(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_takes_spots_atomically() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let slot = session(efa.id, day(20), 3);
        store.add_course(efa).unwrap();
        store.add_session(slot.clone()).unwrap();

        store.create_booking(booking(slot.id, 2)).await.unwrap();
        assert_eq!(store.spots_left(slot.id), Some(1));

        let err = store.create_booking(booking(slot.id, 2)).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::CapacityExceeded {
                session_id: slot.id,
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(store.booking_count(), 1);
        assert_eq!(store.spots_left(slot.id), Some(1));
    }

    #[tokio::test]
    async fn cancel_releases_spots_once() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let slot = session(efa.id, day(20), 5);
        store.add_course(efa).unwrap();
        store.add_session(slot.clone()).unwrap();
        let created = store.create_booking(booking(slot.id, 3)).await.unwrap();

        let first = store.cancel_booking(created.id).await.unwrap().unwrap();
        assert_eq!(first.previous_status, "pending");
        assert_eq!(first.released_spots, 3);
        assert_eq!(store.spots_left(slot.id), Some(5));

        let second = store.cancel_booking(created.id).await.unwrap().unwrap();
        assert_eq!(second.released_spots, 0);
        assert_eq!(store.spots_left(slot.id), Some(5));

        assert!(store.cancel_booking(BookingId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reopened_booking_does_not_release_twice() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let slot = session(efa.id, day(20), 5);
        store.add_course(efa).unwrap();
        store.add_session(slot.clone()).unwrap();
        let created = store.create_booking(booking(slot.id, 2)).await.unwrap();

        store.cancel_booking(created.id).await.unwrap();
        assert!(
            store
                .update_status(SubmissionKind::Booking, *created.id.as_uuid(), "pending")
                .await
                .unwrap()
        );
        let again = store.cancel_booking(created.id).await.unwrap().unwrap();

        assert_eq!(again.previous_status, "pending");
        assert_eq!(again.released_spots, 0);
        assert_eq!(store.spots_left(slot.id), Some(5));
    }

    #[tokio::test]
    async fn completed_booking_keeps_its_spots() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let slot = session(efa.id, day(20), 5);
        store.add_course(efa).unwrap();
        store.add_session(slot.clone()).unwrap();
        let created = store.create_booking(booking(slot.id, 2)).await.unwrap();
        store
            .update_status(SubmissionKind::Booking, *created.id.as_uuid(), "completed")
            .await
            .unwrap();

        let cancellation = store.cancel_booking(created.id).await.unwrap().unwrap();
        assert_eq!(cancellation.previous_status, "completed");
        assert_eq!(cancellation.released_spots, 0);
        assert_eq!(store.spots_left(slot.id), Some(3));
    }

    #[tokio::test]
    async fn listings_are_scoped_and_joined() {
        let store = InMemoryStore::new();
        let efa = course("Emergency First Aid", true);
        let slot = session(efa.id, day(20), 10);
        store.add_course(efa).unwrap();
        store.add_session(slot.clone()).unwrap();

        let owner = UserId::new();
        let mut mine = booking(slot.id, 1);
        mine.user_id = Some(owner);
        store.create_booking(booking(slot.id, 1)).await.unwrap();
        let created = store.create_booking(mine).await.unwrap();

        let all = store.list_bookings(Scope::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].booking.id, created.id);

        let own = store.list_bookings(Scope::Owner(owner)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].course_title.as_deref(), Some("Emergency First Aid"));
        assert_eq!(own[0].location.as_deref(), Some("Leeds"));
        assert_eq!(own[0].session_date, Some(day(20)));
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.active_courses().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.list_quotes(Scope::All).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.active_courses().await.unwrap().is_empty());
    }
}
