//! Domain types shared by the quote, booking and inquiry flows.
//!
//! Records are created once by the public flows and afterwards only their
//! `status` changes (see [`crate::status`]).

use crate::status::{BookingStatus, ContactStatus, QuoteStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a quote request
    QuoteId
);
uuid_id!(
    /// Identifier of a course booking
    BookingId
);
uuid_id!(
    /// Identifier of a contact inquiry
    ContactId
);
uuid_id!(
    /// Identifier of a training course
    CourseId
);
uuid_id!(
    /// Identifier of a scheduled course session
    SessionId
);
uuid_id!(
    /// Identifier of an authenticated site user
    UserId
);

// ============================================================================
// Validation
// ============================================================================

/// Input problems caught before anything is sent to persistence.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field was empty
    #[error("{field} is required")]
    MissingField {
        /// Field name as shown on the form
        field: &'static str,
    },

    /// The email address is not plausibly deliverable
    #[error("'{email}' is not a valid email address")]
    InvalidEmail {
        /// Address as entered
        email: String,
    },

    /// Participant count outside `[1, available]`
    #[error("participants must be between 1 and {available}, got {requested}")]
    ParticipantsOutOfRange {
        /// Participants asked for
        requested: u32,
        /// Spots the selected session has left
        available: u32,
    },

    /// Submit was attempted before a session was chosen
    #[error("select a session before entering participant details")]
    NoSessionSelected,

    /// A service level that is not one of the offered tiers
    #[error("'{value}' is not a known service level")]
    UnknownServiceLevel {
        /// Level as submitted
        value: String,
    },
}

/// Rough deliverability check: one `@`, non-empty local part, dotted domain.
#[must_use]
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Trim a free-text input and map blank values to `None`.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Contact details
// ============================================================================

/// Who submitted a quote, booking or inquiry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Full name (required)
    pub name: String,
    /// Email address (required)
    pub email: String,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Company or organisation
    #[serde(default)]
    pub company: Option<String>,
}

impl ContactDetails {
    /// Trimmed copy with blank optionals cleared
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(self.phone.clone()),
            company: non_blank(self.company.clone()),
        }
    }

    /// Collect every problem with the required fields.
    #[must_use]
    pub fn problems(&self) -> Vec<ValidationError> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push(ValidationError::MissingField { field: "name" });
        }
        let email = self.email.trim();
        if email.is_empty() {
            problems.push(ValidationError::MissingField { field: "email" });
        } else if !is_plausible_email(email) {
            problems.push(ValidationError::InvalidEmail {
                email: email.to_string(),
            });
        }
        problems
    }
}

// ============================================================================
// Service levels and event types
// ============================================================================

/// Tier of medical cover requested for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLevel {
    /// Basic first aid
    Basic,
    /// Standard medical cover
    Standard,
    /// Enhanced medical cover
    Enhanced,
    /// Comprehensive cover including ambulance
    Comprehensive,
}

impl ServiceLevel {
    /// Every level, in ascending price order
    pub const ALL: [Self; 4] = [
        Self::Basic,
        Self::Standard,
        Self::Enhanced,
        Self::Comprehensive,
    ];

    /// Price multiplier expressed in halves (×1 = 2, ×1.5 = 3, ...)
    #[must_use]
    pub const fn multiplier_halves(self) -> u64 {
        match self {
            Self::Basic => 2,
            Self::Standard => 3,
            Self::Enhanced => 4,
            Self::Comprehensive => 6,
        }
    }

    /// Price multiplier
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Basic => 1.0,
            Self::Standard => 1.5,
            Self::Enhanced => 2.0,
            Self::Comprehensive => 3.0,
        }
    }

    /// Wire/storage value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Label shown on the quote form
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic First Aid",
            Self::Standard => "Standard Medical Cover",
            Self::Enhanced => "Enhanced Medical Cover",
            Self::Comprehensive => "Comprehensive (with Ambulance)",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service level string that is not one of the known tiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown service level '{0}'")]
pub struct UnknownServiceLevel(pub String);

impl FromStr for ServiceLevel {
    type Err = UnknownServiceLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownServiceLevel(s.to_string()))
    }
}

/// Event types offered on the quote form.
pub const EVENT_TYPES: [&str; 10] = [
    "Festival",
    "Sporting Event",
    "Concert",
    "Corporate Event",
    "Wedding",
    "Private Party",
    "Marathon/Running Event",
    "Equestrian Event",
    "Charity Event",
    "Other",
];

// ============================================================================
// Catalog
// ============================================================================

/// A training course offered for booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier
    pub id: CourseId,
    /// Course title
    pub title: String,
    /// Marketing description
    pub description: Option<String>,
    /// Human-readable length, e.g. "1 day"
    pub duration: Option<String>,
    /// Price per participant in pence
    pub price_pence: Option<u32>,
    /// Course category, e.g. "First Aid"
    pub category: Option<String>,
    /// Whether the course is currently bookable
    pub is_active: bool,
}

/// One scheduled, capacity-bounded occurrence of a course.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSession {
    /// Session identifier
    pub id: SessionId,
    /// Course this session belongs to
    pub course_id: CourseId,
    /// Calendar date of the session
    pub session_date: NaiveDate,
    /// Start time (local)
    pub start_time: NaiveTime,
    /// Venue
    pub location: Option<String>,
    /// Spots still available
    pub available_spots: u32,
}

impl CourseSession {
    /// Whether the session can still be booked on `today`
    #[must_use]
    pub fn is_offerable(&self, today: NaiveDate) -> bool {
        self.available_spots > 0 && self.session_date >= today
    }
}

// ============================================================================
// Submissions
// ============================================================================

/// Fields of a quote request as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuoteRequest {
    /// Who is asking
    pub contact: ContactDetails,
    /// Kind of event, see [`EVENT_TYPES`]
    pub event_type: String,
    /// Date of the event
    pub event_date: Option<NaiveDate>,
    /// Length of the event in hours
    pub event_duration_hours: Option<u32>,
    /// Expected attendance
    pub expected_attendees: Option<u32>,
    /// Venue or town
    pub location: Option<String>,
    /// Requested tier of cover
    pub service_level: Option<ServiceLevel>,
    /// Free-text requirements
    pub additional_requirements: Option<String>,
    /// Indicative price shown to the visitor, whole pounds
    pub estimated_quote: Option<u64>,
    /// Signed-in submitter
    pub user_id: Option<UserId>,
}

/// A stored quote request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Quote identifier
    pub id: QuoteId,
    /// Submitted fields
    #[serde(flatten)]
    pub request: NewQuoteRequest,
    /// Lifecycle status
    pub status: QuoteStatus,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// Fields of a course booking as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourseBooking {
    /// Session being booked
    pub session_id: SessionId,
    /// Who is booking
    pub contact: ContactDetails,
    /// Number of participants
    pub participants: u32,
    /// Signed-in submitter
    pub user_id: Option<UserId>,
}

/// A stored course booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseBooking {
    /// Booking identifier
    pub id: BookingId,
    /// Submitted fields
    #[serde(flatten)]
    pub booking: NewCourseBooking,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Set once a cancellation has returned the participants to the session.
    /// Never cleared, so spots go back at most once.
    #[serde(default)]
    pub spots_released: bool,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// A booking joined with the session and course it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingView {
    /// The booking itself
    #[serde(flatten)]
    pub booking: CourseBooking,
    /// Session date, when the session still exists
    pub session_date: Option<NaiveDate>,
    /// Session start time
    pub start_time: Option<NaiveTime>,
    /// Session venue
    pub location: Option<String>,
    /// Course title
    pub course_title: Option<String>,
}

/// Fields of a contact inquiry as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactSubmission {
    /// Who is asking
    pub contact: ContactDetails,
    /// Kind of event the inquiry is about
    pub event_type: Option<String>,
    /// Event date
    pub event_date: Option<NaiveDate>,
    /// Expected attendance, as typed
    pub attendees: Option<String>,
    /// Message body
    pub message: Option<String>,
    /// Signed-in submitter
    pub user_id: Option<UserId>,
}

/// A stored contact inquiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    /// Inquiry identifier
    pub id: ContactId,
    /// Submitted fields
    #[serde(flatten)]
    pub submission: NewContactSubmission,
    /// Lifecycle status
    pub status: ContactStatus,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// Render an amount of pence as pounds, e.g. `£1,234.50`.
#[must_use]
pub fn format_pence(pence: u64) -> String {
    let pounds = (pence / 100).to_string();
    let mut grouped = String::with_capacity(pounds.len() + pounds.len() / 3);
    for (i, digit) in pounds.chars().enumerate() {
        if i > 0 && (pounds.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("£{grouped}.{:02}", pence % 100)
}
