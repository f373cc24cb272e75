//! State and actions of the course booking wizard.

use crate::types::{
    BookingId, ContactDetails, Course, CourseBooking, CourseId, CourseSession, SessionId,
    ValidationError, format_pence,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Stage
// ============================================================================

/// Where the visitor is in the wizard. Derived from state, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    /// Picking a course
    NoneSelected,
    /// Picking a session of the selected course
    CourseSelected,
    /// Entering participant details
    SessionSelected,
    /// Booking stored; terminal
    Submitted,
}

// ============================================================================
// Participant form
// ============================================================================

/// Step three of the wizard: who is coming and how many.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantForm {
    /// Contact details of the person booking
    pub contact: ContactDetails,
    /// Number of participants
    pub participants: u32,
}

impl Default for ParticipantForm {
    fn default() -> Self {
        Self {
            contact: ContactDetails::default(),
            participants: 1,
        }
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Non-fatal message shown above the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The course list could not be loaded
    CoursesUnavailable,
    /// The session list could not be loaded
    SessionsUnavailable,
    /// The selected course has no open sessions
    NoOpenSessions,
    /// The booking could not be stored; try again
    SubmissionFailed,
    /// Someone else took spots on the session in the meantime
    CapacityChanged {
        /// Spots left according to the store
        available: u32,
    },
}

impl Notice {
    /// Text shown to the visitor
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::CoursesUnavailable => {
                "We couldn't load our courses just now. Please try again shortly.".to_string()
            },
            Self::SessionsUnavailable => {
                "We couldn't load dates for this course. Please try again shortly.".to_string()
            },
            Self::NoOpenSessions => {
                "No upcoming dates are available for this course. Contact us to arrange a date."
                    .to_string()
            },
            Self::SubmissionFailed => {
                "Your booking could not be submitted. Please try again.".to_string()
            },
            Self::CapacityChanged { available: 0 } => {
                "This session has just filled up. Please choose another date.".to_string()
            },
            Self::CapacityChanged { available } => {
                format!("Only {available} spots are left on this session. Adjust participants and try again.")
            },
        }
    }
}

// ============================================================================
// Confirmation
// ============================================================================

/// What the visitor sees after a successful booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    /// Stored booking id
    pub booking_id: BookingId,
    /// Course title
    pub course_title: String,
    /// Session date
    pub session_date: NaiveDate,
    /// Session start time
    pub start_time: NaiveTime,
    /// Session venue
    pub location: Option<String>,
    /// Participants booked
    pub participants: u32,
    /// Price per participant in pence
    pub unit_price_pence: Option<u32>,
    /// `unit price × participants` in pence
    pub total_pence: Option<u64>,
}

impl BookingConfirmation {
    /// Build the confirmation for a stored booking.
    #[must_use]
    pub fn new(booking: &CourseBooking, course: &Course, session: &CourseSession) -> Self {
        let participants = booking.booking.participants;
        Self {
            booking_id: booking.id,
            course_title: course.title.clone(),
            session_date: session.session_date,
            start_time: session.start_time,
            location: session.location.clone(),
            participants,
            unit_price_pence: course.price_pence,
            total_pence: course
                .price_pence
                .map(|price| u64::from(price) * u64::from(participants)),
        }
    }

    /// One-paragraph summary, e.g. for the confirmation page.
    #[must_use]
    pub fn summary(&self) -> String {
        let when = format!(
            "{} at {}",
            self.session_date.format("%A %-d %B %Y"),
            self.start_time.format("%H:%M")
        );
        let place = self
            .location
            .as_deref()
            .map_or_else(String::new, |location| format!(", {location}"));
        let total = self
            .total_pence
            .map_or_else(String::new, |total| format!(" Total: {}.", format_pence(total)));
        format!(
            "{} for {} participant{} on {when}{place}.{total}",
            self.course_title,
            self.participants,
            if self.participants == 1 { "" } else { "s" },
        )
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything the wizard is showing and has selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookingWizardState {
    /// Active courses, ordered by title
    pub courses: Vec<Course>,
    /// Course list requested and not yet answered
    pub courses_loading: bool,
    /// Course chosen in step one
    pub selected_course: Option<CourseId>,
    /// Open sessions of the selected course, ascending by date
    pub sessions: Vec<CourseSession>,
    /// Session list requested and not yet answered
    pub sessions_loading: bool,
    /// Session chosen in step two
    pub selected_session: Option<SessionId>,
    /// Step three inputs
    pub form: ParticipantForm,
    /// Booking request in flight
    pub submitting: bool,
    /// Set once the booking is stored
    pub confirmation: Option<BookingConfirmation>,
    /// Problems with the current inputs
    pub validation_errors: Vec<ValidationError>,
    /// Non-fatal message for the visitor
    pub notice: Option<Notice>,
}

impl BookingWizardState {
    /// Empty wizard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage
    #[must_use]
    pub const fn stage(&self) -> WizardStage {
        if self.confirmation.is_some() {
            WizardStage::Submitted
        } else if self.selected_session.is_some() {
            WizardStage::SessionSelected
        } else if self.selected_course.is_some() {
            WizardStage::CourseSelected
        } else {
            WizardStage::NoneSelected
        }
    }

    /// The selected course, if it is in the loaded list
    #[must_use]
    pub fn selected_course(&self) -> Option<&Course> {
        let id = self.selected_course?;
        self.courses.iter().find(|c| c.id == id)
    }

    /// The selected session, if it is in the loaded list
    #[must_use]
    pub fn selected_session(&self) -> Option<&CourseSession> {
        let id = self.selected_session?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Whether the selected course turned out to have no open sessions
    #[must_use]
    pub fn has_no_open_sessions(&self) -> bool {
        matches!(self.notice, Some(Notice::NoOpenSessions))
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Visitor intents and the results fed back from persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingAction {
    // ========== Commands ==========
    /// Fetch the course list (once, on entry)
    LoadCourses,

    /// Choose a course; clears any chosen session
    SelectCourse {
        /// Course to book
        course_id: CourseId,
    },

    /// Choose a session of the selected course
    SelectSession {
        /// Session to book
        session_id: SessionId,
    },

    /// Replace the participant form
    EditDetails {
        /// New form contents
        form: ParticipantForm,
    },

    /// Validate and store the booking
    Submit,

    /// Visitor navigated away; forget everything
    Abandon,

    // ========== Results ==========
    /// Course list arrived
    CoursesLoaded {
        /// Active courses
        courses: Vec<Course>,
    },

    /// Course list could not be loaded
    CoursesLoadFailed {
        /// Store error text
        error: String,
    },

    /// Session list arrived
    SessionsLoaded {
        /// Course the list was requested for
        course_id: CourseId,
        /// Open sessions
        sessions: Vec<CourseSession>,
    },

    /// Session list could not be loaded
    SessionsLoadFailed {
        /// Course the list was requested for
        course_id: CourseId,
        /// Store error text
        error: String,
    },

    /// Booking stored
    BookingSubmitted {
        /// Stored booking
        booking: CourseBooking,
    },

    /// Store refused the booking for lack of spots
    CapacityExceeded {
        /// Session that was full
        session_id: SessionId,
        /// Spots it still has
        available: u32,
    },

    /// Booking could not be stored
    SubmissionFailed {
        /// Store error text
        error: String,
    },
}
