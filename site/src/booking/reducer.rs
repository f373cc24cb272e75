//! Reducer for the course booking wizard.
//!
//! The wizard only moves forward: course, then session, then participant
//! details, then a single create against the submission store. Choosing a
//! different course always throws away the chosen session. Results that
//! arrive for a course that is no longer selected are ignored.

use super::environment::BookingEnvironment;
use super::types::{
    BookingAction, BookingConfirmation, BookingWizardState, Notice, ParticipantForm, WizardStage,
};
use crate::store::StoreError;
use crate::types::{CourseId, NewCourseBooking, SessionId, ValidationError};
use medcover_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Reducer for the booking wizard
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Everything wrong with the current selection and form.
    fn validate_submission(state: &BookingWizardState) -> Vec<ValidationError> {
        let Some(session) = state.selected_session() else {
            return vec![ValidationError::NoSessionSelected];
        };

        let mut problems = state.form.contact.problems();
        let requested = state.form.participants;
        if requested < 1 || requested > session.available_spots {
            problems.push(ValidationError::ParticipantsOutOfRange {
                requested,
                available: session.available_spots,
            });
        }
        problems
    }

    fn load_courses(env: &BookingEnvironment) -> Effect<BookingAction> {
        let catalog = Arc::clone(&env.catalog);
        Effect::future(async move {
            Some(match catalog.active_courses().await {
                Ok(courses) => BookingAction::CoursesLoaded { courses },
                Err(error) => BookingAction::CoursesLoadFailed {
                    error: error.to_string(),
                },
            })
        })
    }

    fn load_sessions(env: &BookingEnvironment, course_id: CourseId) -> Effect<BookingAction> {
        let catalog = Arc::clone(&env.catalog);
        let today = env.clock.today();
        Effect::future(async move {
            Some(match catalog.open_sessions(course_id, today).await {
                Ok(sessions) => BookingAction::SessionsLoaded {
                    course_id,
                    sessions,
                },
                Err(error) => BookingAction::SessionsLoadFailed {
                    course_id,
                    error: error.to_string(),
                },
            })
        })
    }

    fn create_booking(env: &BookingEnvironment, booking: NewCourseBooking) -> Effect<BookingAction> {
        let submissions = Arc::clone(&env.submissions);
        Effect::future(async move {
            Some(match submissions.create_booking(booking).await {
                Ok(booking) => BookingAction::BookingSubmitted { booking },
                Err(StoreError::CapacityExceeded {
                    session_id,
                    available,
                    ..
                }) => BookingAction::CapacityExceeded {
                    session_id,
                    available,
                },
                Err(error) => BookingAction::SubmissionFailed {
                    error: error.to_string(),
                },
            })
        })
    }

    fn is_locked(state: &BookingWizardState) -> bool {
        state.submitting || state.stage() == WizardStage::Submitted
    }

    fn select_session(state: &mut BookingWizardState, session_id: SessionId) {
        if !state.sessions.iter().any(|s| s.id == session_id) {
            tracing::debug!(%session_id, "ignoring selection of unknown session");
            return;
        }
        state.selected_session = Some(session_id);
        state.validation_errors.clear();
        if matches!(state.notice, Some(Notice::CapacityChanged { .. })) {
            state.notice = None;
        }
    }

    fn edit_details(state: &mut BookingWizardState, form: ParticipantForm) {
        if state.stage() < WizardStage::SessionSelected {
            state.validation_errors = vec![ValidationError::NoSessionSelected];
            return;
        }
        state.form = form;
        state.validation_errors.clear();
    }
}

impl Reducer for BookingReducer {
    type State = BookingWizardState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            BookingAction::LoadCourses => {
                if state.courses_loading || !state.courses.is_empty() {
                    return SmallVec::new();
                }
                state.courses_loading = true;
                smallvec![Self::load_courses(env)]
            },

            BookingAction::SelectCourse { course_id } => {
                if Self::is_locked(state) {
                    return SmallVec::new();
                }
                if !state.courses.iter().any(|c| c.id == course_id) {
                    tracing::debug!(%course_id, "ignoring selection of unknown course");
                    return SmallVec::new();
                }

                state.selected_course = Some(course_id);
                state.selected_session = None;
                state.sessions.clear();
                state.sessions_loading = true;
                state.validation_errors.clear();
                state.notice = None;

                smallvec![Self::load_sessions(env, course_id)]
            },

            BookingAction::SelectSession { session_id } => {
                if !Self::is_locked(state) {
                    Self::select_session(state, session_id);
                }
                SmallVec::new()
            },

            BookingAction::EditDetails { form } => {
                if !Self::is_locked(state) {
                    Self::edit_details(state, form);
                }
                SmallVec::new()
            },

            BookingAction::Submit => {
                if Self::is_locked(state) {
                    return SmallVec::new();
                }

                let problems = Self::validate_submission(state);
                if !problems.is_empty() {
                    tracing::debug!(count = problems.len(), "booking rejected by validation");
                    state.validation_errors = problems;
                    return SmallVec::new();
                }

                let Some(session_id) = state.selected_session else {
                    return SmallVec::new();
                };
                state.validation_errors.clear();
                state.notice = None;
                state.submitting = true;

                let booking = NewCourseBooking {
                    session_id,
                    contact: state.form.contact.normalized(),
                    participants: state.form.participants,
                    user_id: env.current_user,
                };
                smallvec![Self::create_booking(env, booking)]
            },

            BookingAction::Abandon => {
                *state = BookingWizardState::default();
                SmallVec::new()
            },

            // ========== Results ==========
            BookingAction::CoursesLoaded { courses } => {
                state.courses_loading = false;
                state.courses = courses;
                if state.notice == Some(Notice::CoursesUnavailable) {
                    state.notice = None;
                }
                SmallVec::new()
            },

            BookingAction::CoursesLoadFailed { error } => {
                tracing::warn!(%error, "course list unavailable");
                state.courses_loading = false;
                state.courses.clear();
                state.notice = Some(Notice::CoursesUnavailable);
                SmallVec::new()
            },

            BookingAction::SessionsLoaded {
                course_id,
                sessions,
            } => {
                if state.selected_course != Some(course_id) || Self::is_locked(state) {
                    tracing::debug!(%course_id, "discarding stale session list");
                    return SmallVec::new();
                }
                state.sessions_loading = false;
                if sessions.is_empty() {
                    state.notice = Some(Notice::NoOpenSessions);
                }
                state.sessions = sessions;
                SmallVec::new()
            },

            BookingAction::SessionsLoadFailed { course_id, error } => {
                if state.selected_course != Some(course_id) || Self::is_locked(state) {
                    tracing::debug!(%course_id, "discarding stale session failure");
                    return SmallVec::new();
                }
                tracing::warn!(%course_id, %error, "session list unavailable");
                state.sessions_loading = false;
                state.sessions.clear();
                state.notice = Some(Notice::SessionsUnavailable);
                SmallVec::new()
            },

            BookingAction::BookingSubmitted { booking } => {
                state.submitting = false;
                let confirmation = state
                    .selected_course()
                    .zip(state.selected_session())
                    .filter(|(_, session)| session.id == booking.booking.session_id)
                    .map(|(course, session)| BookingConfirmation::new(&booking, course, session));

                match confirmation {
                    Some(confirmation) => {
                        tracing::info!(booking_id = %booking.id, "booking submitted");
                        state.confirmation = Some(confirmation);
                        state.notice = None;
                    },
                    None => {
                        tracing::warn!(
                            booking_id = %booking.id,
                            "booking stored after the wizard moved on"
                        );
                    },
                }
                SmallVec::new()
            },

            BookingAction::CapacityExceeded {
                session_id,
                available,
            } => {
                state.submitting = false;
                if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
                    session.available_spots = available;
                }
                state.notice = Some(Notice::CapacityChanged { available });
                SmallVec::new()
            },

            BookingAction::SubmissionFailed { error } => {
                tracing::warn!(%error, "booking submission failed");
                state.submitting = false;
                state.notice = Some(Notice::SubmissionFailed);
                SmallVec::new()
            },
        }
    }
}
