//! `PostgreSQL` store.
//!
//! Tables are created by the embedded migrations in `migrations/`. Statuses
//! are stored as text and checked against the closed sets on the way out.
//!
//! # Example
//!
//! ```no_run
//! use medcover::config::Config;
//! use medcover::store::PgStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env();
//! let store = PgStore::connect(&config.postgres).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use super::{
    Cancellation, CourseCatalog, Scope, StoreError, StoreFuture, SubmissionStore, releases_spots,
};
use crate::config::PostgresConfig;
use crate::status::{BookingStatus, ContactStatus, QuoteStatus, SubmissionKind, SubmissionStatus};
use crate::types::{
    BookingId, BookingView, ContactDetails, ContactId, ContactSubmission, Course, CourseBooking,
    CourseId, CourseSession, NewContactSubmission, NewCourseBooking, NewQuoteRequest, QuoteId,
    QuoteRequest, ServiceLevel, SessionId, UserId,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

/// Submission and catalog tables in `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Unavailable(format!("{context}: {e}"))
}

fn to_i32(value: u32, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} out of range: {value}")))
}

fn to_u32(value: i32, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {field}: {value}")))
}

fn opt_u32(value: Option<i32>, field: &str) -> Result<Option<u32>, StoreError> {
    value.map(|v| to_u32(v, field)).transpose()
}

fn opt_i32(value: Option<u32>, field: &str) -> Result<Option<i32>, StoreError> {
    value.map(|v| to_i32(v, field)).transpose()
}

fn parse_status<S: SubmissionStatus>(text: &str) -> Result<S, StoreError> {
    text.parse::<S>().map_err(|e| StoreError::Corrupt(e.to_string()))
}

const fn table(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Quote => "quote_requests",
        SubmissionKind::Booking => "course_bookings",
        SubmissionKind::Contact => "contact_submissions",
    }
}

const fn owner(scope: Scope) -> Option<Uuid> {
    match scope {
        Scope::All => None,
        Scope::Owner(user) => Some(*user.as_uuid()),
    }
}

#[derive(FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    duration: Option<String>,
    price_pence: Option<i32>,
    category: Option<String>,
    is_active: bool,
}

impl TryFrom<CourseRow> for Course {
    type Error = StoreError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CourseId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            duration: row.duration,
            price_pence: opt_u32(row.price_pence, "price_pence")?,
            category: row.category,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    course_id: Uuid,
    session_date: NaiveDate,
    start_time: NaiveTime,
    location: Option<String>,
    available_spots: i32,
}

impl TryFrom<SessionRow> for CourseSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SessionId::from_uuid(row.id),
            course_id: CourseId::from_uuid(row.course_id),
            session_date: row.session_date,
            start_time: row.start_time,
            location: row.location,
            available_spots: to_u32(row.available_spots, "available_spots")?,
        })
    }
}

#[derive(FromRow)]
struct QuoteRow {
    id: Uuid,
    user_id: Option<Uuid>,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    event_type: String,
    event_date: Option<NaiveDate>,
    event_duration_hours: Option<i32>,
    expected_attendees: Option<i32>,
    location: Option<String>,
    service_level: Option<String>,
    additional_requirements: Option<String>,
    estimated_quote: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for QuoteRequest {
    type Error = StoreError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        let service_level = row
            .service_level
            .map(|level| {
                level
                    .parse::<ServiceLevel>()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .transpose()?;
        let estimated_quote = row
            .estimated_quote
            .map(|q| {
                u64::try_from(q)
                    .map_err(|_| StoreError::Corrupt(format!("negative estimated_quote: {q}")))
            })
            .transpose()?;

        Ok(Self {
            id: QuoteId::from_uuid(row.id),
            request: NewQuoteRequest {
                contact: ContactDetails {
                    name: row.name,
                    email: row.email,
                    phone: row.phone,
                    company: row.company,
                },
                event_type: row.event_type,
                event_date: row.event_date,
                event_duration_hours: opt_u32(row.event_duration_hours, "event_duration_hours")?,
                expected_attendees: opt_u32(row.expected_attendees, "expected_attendees")?,
                location: row.location,
                service_level,
                additional_requirements: row.additional_requirements,
                estimated_quote,
                user_id: row.user_id.map(UserId::from_uuid),
            },
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Option<Uuid>,
    session_id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    participants: i32,
    status: String,
    spots_released: bool,
    created_at: DateTime<Utc>,
    session_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    location: Option<String>,
    course_title: Option<String>,
}

impl TryFrom<BookingRow> for BookingView {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            booking: CourseBooking {
                id: BookingId::from_uuid(row.id),
                booking: NewCourseBooking {
                    session_id: SessionId::from_uuid(row.session_id),
                    contact: ContactDetails {
                        name: row.name,
                        email: row.email,
                        phone: row.phone,
                        company: row.company,
                    },
                    participants: to_u32(row.participants, "participants")?,
                    user_id: row.user_id.map(UserId::from_uuid),
                },
                status: parse_status(&row.status)?,
                spots_released: row.spots_released,
                created_at: row.created_at,
            },
            session_date: row.session_date,
            start_time: row.start_time,
            location: row.location,
            course_title: row.course_title,
        })
    }
}

#[derive(FromRow)]
struct ContactRow {
    id: Uuid,
    user_id: Option<Uuid>,
    name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    event_type: Option<String>,
    event_date: Option<NaiveDate>,
    attendees: Option<String>,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactSubmission {
    type Error = StoreError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContactId::from_uuid(row.id),
            submission: NewContactSubmission {
                contact: ContactDetails {
                    name: row.name,
                    email: row.email,
                    phone: row.phone,
                    company: row.company,
                },
                event_type: row.event_type,
                event_date: row.event_date,
                attendees: row.attendees,
                message: row.message,
                user_id: row.user_id.map(UserId::from_uuid),
            },
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

const BOOKING_VIEW_SELECT: &str = "
    SELECT b.id, b.user_id, b.session_id, b.name, b.email, b.phone, b.company,
           b.participants, b.status, b.spots_released, b.created_at,
           s.session_date, s.start_time, s.location, c.title AS course_title
    FROM course_bookings b
    LEFT JOIN course_sessions s ON s.id = b.session_id
    LEFT JOIN training_courses c ON c.id = s.course_id";

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(db("Failed to connect"))?;
        Ok(Self::new(pool))
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert courses and sessions unless the catalog already has courses.
    ///
    /// Returns whether anything was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    #[tracing::instrument(skip_all, fields(courses = courses.len(), sessions = sessions.len()))]
    pub async fn seed_catalog(
        &self,
        courses: Vec<Course>,
        sessions: Vec<CourseSession>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to start transaction"))?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM training_courses")
            .fetch_one(&mut *tx)
            .await
            .map_err(db("Failed to count courses"))?;
        if existing > 0 {
            return Ok(false);
        }

        for course in courses {
            sqlx::query(
                "INSERT INTO training_courses
                     (id, title, description, duration, price_pence, category, is_active)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(course.id.as_uuid())
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.duration)
            .bind(opt_i32(course.price_pence, "price_pence")?)
            .bind(&course.category)
            .bind(course.is_active)
            .execute(&mut *tx)
            .await
            .map_err(db("Failed to insert course"))?;
        }

        for session in sessions {
            sqlx::query(
                "INSERT INTO course_sessions
                     (id, course_id, session_date, start_time, location, available_spots)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(session.id.as_uuid())
            .bind(session.course_id.as_uuid())
            .bind(session.session_date)
            .bind(session.start_time)
            .bind(&session.location)
            .bind(to_i32(session.available_spots, "available_spots")?)
            .execute(&mut *tx)
            .await
            .map_err(db("Failed to insert session"))?;
        }

        tx.commit().await.map_err(db("Failed to commit seed"))?;
        Ok(true)
    }

    #[tracing::instrument(skip_all, fields(session_id = %booking.session_id, participants = booking.participants))]
    async fn insert_booking(&self, booking: NewCourseBooking) -> Result<CourseBooking, StoreError> {
        let participants = to_i32(booking.participants, "participants")?;
        let mut tx = self.pool.begin().await.map_err(db("Failed to start transaction"))?;

        // Conditional decrement: only succeeds while enough spots remain.
        let taken: Option<(i32,)> = sqlx::query_as(
            "UPDATE course_sessions
             SET available_spots = available_spots - $1
             WHERE id = $2 AND available_spots >= $1
             RETURNING available_spots",
        )
        .bind(participants)
        .bind(booking.session_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db("Failed to reserve spots"))?;

        if taken.is_none() {
            let current: Option<(i32,)> =
                sqlx::query_as("SELECT available_spots FROM course_sessions WHERE id = $1")
                    .bind(booking.session_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db("Failed to read session"))?;
            let _ = tx.rollback().await;

            return Err(match current {
                None => StoreError::SessionNotFound(booking.session_id),
                Some((available,)) => StoreError::CapacityExceeded {
                    session_id: booking.session_id,
                    requested: booking.participants,
                    available: to_u32(available, "available_spots")?,
                },
            });
        }

        let id = BookingId::new();
        let status = BookingStatus::initial();
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            "INSERT INTO course_bookings
                 (id, user_id, session_id, name, email, phone, company, participants, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING created_at",
        )
        .bind(id.as_uuid())
        .bind(booking.user_id.map(|u| *u.as_uuid()))
        .bind(booking.session_id.as_uuid())
        .bind(&booking.contact.name)
        .bind(&booking.contact.email)
        .bind(&booking.contact.phone)
        .bind(&booking.contact.company)
        .bind(participants)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db("Failed to insert booking"))?;

        tx.commit().await.map_err(db("Failed to commit booking"))?;

        Ok(CourseBooking {
            id,
            booking,
            status,
            spots_released: false,
            created_at,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, id: BookingId) -> Result<Option<Cancellation>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to start transaction"))?;

        let row: Option<(String, Uuid, i32, bool)> = sqlx::query_as(
            "SELECT status, session_id, participants, spots_released
             FROM course_bookings
             WHERE id = $1
             FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db("Failed to lock booking"))?;

        let Some((previous_status, session_id, participants, already_released)) = row else {
            let _ = tx.rollback().await;
            return Ok(None);
        };

        let previous: BookingStatus = parse_status(&previous_status)?;
        let release = releases_spots(previous, already_released);

        sqlx::query(
            "UPDATE course_bookings
             SET status = $1, spots_released = spots_released OR $2
             WHERE id = $3",
        )
        .bind(BookingStatus::Cancelled.as_str())
        .bind(release)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(db("Failed to cancel booking"))?;

        let released = if release {
            sqlx::query(
                "UPDATE course_sessions
                 SET available_spots = available_spots + $1
                 WHERE id = $2",
            )
            .bind(participants)
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(db("Failed to release spots"))?;
            to_u32(participants, "participants")?
        } else {
            0
        };

        tx.commit().await.map_err(db("Failed to commit cancellation"))?;

        Ok(Some(Cancellation {
            session_id: SessionId::from_uuid(session_id),
            previous_status,
            released_spots: released,
        }))
    }
}

impl CourseCatalog for PgStore {
    fn active_courses(&self) -> StoreFuture<'_, Vec<Course>> {
        Box::pin(async move {
            let rows: Vec<CourseRow> = sqlx::query_as(
                "SELECT id, title, description, duration, price_pence, category, is_active
                 FROM training_courses
                 WHERE is_active
                 ORDER BY title",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to load courses"))?;
            rows.into_iter().map(Course::try_from).collect()
        })
    }

    fn open_sessions(
        &self,
        course_id: CourseId,
        today: NaiveDate,
    ) -> StoreFuture<'_, Vec<CourseSession>> {
        Box::pin(async move {
            let rows: Vec<SessionRow> = sqlx::query_as(
                "SELECT id, course_id, session_date, start_time, location, available_spots
                 FROM course_sessions
                 WHERE course_id = $1 AND session_date >= $2 AND available_spots > 0
                 ORDER BY session_date, start_time",
            )
            .bind(course_id.as_uuid())
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to load sessions"))?;
            rows.into_iter().map(CourseSession::try_from).collect()
        })
    }

    fn course(&self, id: CourseId) -> StoreFuture<'_, Option<Course>> {
        Box::pin(async move {
            let row: Option<CourseRow> = sqlx::query_as(
                "SELECT id, title, description, duration, price_pence, category, is_active
                 FROM training_courses
                 WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("Failed to load course"))?;
            row.map(Course::try_from).transpose()
        })
    }

    fn session(&self, id: SessionId) -> StoreFuture<'_, Option<CourseSession>> {
        Box::pin(async move {
            let row: Option<SessionRow> = sqlx::query_as(
                "SELECT id, course_id, session_date, start_time, location, available_spots
                 FROM course_sessions
                 WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("Failed to load session"))?;
            row.map(CourseSession::try_from).transpose()
        })
    }
}

impl SubmissionStore for PgStore {
    fn create_quote(&self, quote: NewQuoteRequest) -> StoreFuture<'_, QuoteRequest> {
        Box::pin(async move {
            let id = QuoteId::new();
            let status = QuoteStatus::initial();
            let estimated_quote = quote
                .estimated_quote
                .map(|q| {
                    i64::try_from(q)
                        .map_err(|_| StoreError::Corrupt(format!("estimate out of range: {q}")))
                })
                .transpose()?;

            let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
                "INSERT INTO quote_requests
                     (id, user_id, name, email, phone, company, event_type, event_date,
                      event_duration_hours, expected_attendees, location, service_level,
                      additional_requirements, estimated_quote, status)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                 RETURNING created_at",
            )
            .bind(id.as_uuid())
            .bind(quote.user_id.map(|u| *u.as_uuid()))
            .bind(&quote.contact.name)
            .bind(&quote.contact.email)
            .bind(&quote.contact.phone)
            .bind(&quote.contact.company)
            .bind(&quote.event_type)
            .bind(quote.event_date)
            .bind(opt_i32(quote.event_duration_hours, "event_duration_hours")?)
            .bind(opt_i32(quote.expected_attendees, "expected_attendees")?)
            .bind(&quote.location)
            .bind(quote.service_level.map(|level| level.as_str()))
            .bind(&quote.additional_requirements)
            .bind(estimated_quote)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db("Failed to insert quote"))?;

            Ok(QuoteRequest {
                id,
                request: quote,
                status,
                created_at,
            })
        })
    }

    fn create_booking(&self, booking: NewCourseBooking) -> StoreFuture<'_, CourseBooking> {
        Box::pin(self.insert_booking(booking))
    }

    fn create_contact(&self, contact: NewContactSubmission) -> StoreFuture<'_, ContactSubmission> {
        Box::pin(async move {
            let id = ContactId::new();
            let status = ContactStatus::initial();
            let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
                "INSERT INTO contact_submissions
                     (id, user_id, name, email, phone, company, event_type, event_date,
                      attendees, message, status)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 RETURNING created_at",
            )
            .bind(id.as_uuid())
            .bind(contact.user_id.map(|u| *u.as_uuid()))
            .bind(&contact.contact.name)
            .bind(&contact.contact.email)
            .bind(&contact.contact.phone)
            .bind(&contact.contact.company)
            .bind(&contact.event_type)
            .bind(contact.event_date)
            .bind(&contact.attendees)
            .bind(&contact.message)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db("Failed to insert contact submission"))?;

            Ok(ContactSubmission {
                id,
                submission: contact,
                status,
                created_at,
            })
        })
    }

    fn list_quotes(&self, scope: Scope) -> StoreFuture<'_, Vec<QuoteRequest>> {
        Box::pin(async move {
            let rows: Vec<QuoteRow> = sqlx::query_as(
                "SELECT id, user_id, name, email, phone, company, event_type, event_date,
                        event_duration_hours, expected_attendees, location, service_level,
                        additional_requirements, estimated_quote, status, created_at
                 FROM quote_requests
                 WHERE ($1::uuid IS NULL OR user_id = $1)
                 ORDER BY created_at DESC",
            )
            .bind(owner(scope))
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to list quotes"))?;
            rows.into_iter().map(QuoteRequest::try_from).collect()
        })
    }

    fn list_bookings(&self, scope: Scope) -> StoreFuture<'_, Vec<BookingView>> {
        Box::pin(async move {
            let sql = format!(
                "{BOOKING_VIEW_SELECT}
                 WHERE ($1::uuid IS NULL OR b.user_id = $1)
                 ORDER BY b.created_at DESC"
            );
            let rows: Vec<BookingRow> = sqlx::query_as(&sql)
                .bind(owner(scope))
                .fetch_all(&self.pool)
                .await
                .map_err(db("Failed to list bookings"))?;
            rows.into_iter().map(BookingView::try_from).collect()
        })
    }

    fn list_contacts(&self, scope: Scope) -> StoreFuture<'_, Vec<ContactSubmission>> {
        Box::pin(async move {
            let rows: Vec<ContactRow> = sqlx::query_as(
                "SELECT id, user_id, name, email, phone, company, event_type, event_date,
                        attendees, message, status, created_at
                 FROM contact_submissions
                 WHERE ($1::uuid IS NULL OR user_id = $1)
                 ORDER BY created_at DESC",
            )
            .bind(owner(scope))
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to list contact submissions"))?;
            rows.into_iter().map(ContactSubmission::try_from).collect()
        })
    }

    fn status_of(&self, kind: SubmissionKind, id: Uuid) -> StoreFuture<'_, Option<String>> {
        Box::pin(async move {
            let sql = format!("SELECT status FROM {} WHERE id = $1", table(kind));
            let row: Option<(String,)> = sqlx::query_as(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db("Failed to read status"))?;
            Ok(row.map(|(status,)| status))
        })
    }

    fn update_status(
        &self,
        kind: SubmissionKind,
        id: Uuid,
        status: &'static str,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let sql = format!("UPDATE {} SET status = $1 WHERE id = $2", table(kind));
            let result = sqlx::query(&sql)
                .bind(status)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db("Failed to update status"))?;
            Ok(result.rows_affected() == 1)
        })
    }

    fn cancel_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Cancellation>> {
        Box::pin(self.cancel(id))
    }
}
