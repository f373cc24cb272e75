//! One-shot booking: replays a complete booking request through the wizard.

use super::{
    BookingAction, BookingConfirmation, BookingEnvironment, BookingReducer, BookingWizardState,
    Notice, ParticipantForm,
};
use crate::types::{ContactDetails, CourseId, SessionId};
use crate::workflow::{WorkflowError, settle};
use medcover_runtime::Store;
use serde::{Deserialize, Serialize};

/// A booking as submitted in one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Course to book
    pub course_id: CourseId,
    /// Session of that course
    pub session_id: SessionId,
    /// Who is booking
    pub contact: ContactDetails,
    /// Number of participants
    pub participants: u32,
}

/// Walk the wizard through every stage and submit.
///
/// # Errors
///
/// - [`WorkflowError::UnknownCourse`] if the course is not an active course
/// - [`WorkflowError::SessionNotOpen`] if the session is not bookable
/// - [`WorkflowError::Invalid`] for validation problems
/// - [`WorkflowError::CapacityChanged`] if the session filled up meanwhile
/// - [`WorkflowError::Unavailable`] if the store failed
#[tracing::instrument(skip_all, fields(course_id = %request.course_id, session_id = %request.session_id))]
pub async fn book_session(
    env: BookingEnvironment,
    request: BookingRequest,
) -> Result<BookingConfirmation, WorkflowError> {
    let store = Store::new(BookingWizardState::new(), BookingReducer::new(), env);

    settle(&store, BookingAction::LoadCourses).await?;
    settle(
        &store,
        BookingAction::SelectCourse {
            course_id: request.course_id,
        },
    )
    .await?;
    if let Some(error) = store.state(|s| unavailable(s.notice.as_ref())).await {
        return Err(error);
    }
    if store.state(|s| s.selected_course).await != Some(request.course_id) {
        return Err(WorkflowError::UnknownCourse(request.course_id));
    }

    settle(
        &store,
        BookingAction::SelectSession {
            session_id: request.session_id,
        },
    )
    .await?;
    if store.state(|s| s.selected_session).await != Some(request.session_id) {
        return Err(WorkflowError::SessionNotOpen(request.session_id));
    }

    let form = ParticipantForm {
        contact: request.contact,
        participants: request.participants,
    };
    settle(&store, BookingAction::EditDetails { form }).await?;
    settle(&store, BookingAction::Submit).await?;

    store.state(outcome).await
}

fn unavailable(notice: Option<&Notice>) -> Option<WorkflowError> {
    match notice? {
        notice @ (Notice::CoursesUnavailable
        | Notice::SessionsUnavailable
        | Notice::SubmissionFailed) => Some(WorkflowError::Unavailable(notice.message())),
        Notice::NoOpenSessions | Notice::CapacityChanged { .. } => None,
    }
}

fn outcome(state: &BookingWizardState) -> Result<BookingConfirmation, WorkflowError> {
    if let Some(confirmation) = &state.confirmation {
        return Ok(confirmation.clone());
    }
    if !state.validation_errors.is_empty() {
        return Err(WorkflowError::Invalid(state.validation_errors.clone()));
    }
    match &state.notice {
        Some(Notice::CapacityChanged { available }) => Err(WorkflowError::CapacityChanged {
            available: *available,
        }),
        Some(notice) => Err(WorkflowError::Unavailable(notice.message())),
        None => Err(WorkflowError::Unavailable(
            "booking did not complete".to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, seed};
    use crate::types::{Course, CourseSession, ValidationError};
    use chrono::NaiveDate;
    use medcover_testing::FixedClock;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn seeded() -> (InMemoryStore, BookingEnvironment, Vec<Course>, Vec<CourseSession>) {
        let clock = Arc::new(FixedClock::on(today()));
        let store = InMemoryStore::with_clock(clock.clone());
        let (courses, sessions) = seed::demo_catalog(today());
        store.load_catalog(courses.clone(), sessions.clone()).unwrap();
        let env = BookingEnvironment::new(clock, Arc::new(store.clone()), Arc::new(store.clone()));
        (store, env, courses, sessions)
    }

    fn contact() -> ContactDetails {
        ContactDetails {
            name: "Priya Shah".into(),
            email: "priya@example.com".into(),
            phone: None,
            company: None,
        }
    }

    fn open_session(courses: &[Course], sessions: &[CourseSession]) -> (CourseId, CourseSession) {
        let session = sessions
            .iter()
            .find(|s| {
                s.is_offerable(today())
                    && courses.iter().any(|c| c.id == s.course_id && c.is_active)
            })
            .cloned()
            .unwrap();
        (session.course_id, session)
    }

    #[tokio::test]
    async fn books_an_open_session() {
        let (store, env, courses, sessions) = seeded();
        let (course_id, session) = open_session(&courses, &sessions);

        let confirmation = book_session(
            env,
            BookingRequest {
                course_id,
                session_id: session.id,
                contact: contact(),
                participants: 1,
            },
        )
        .await
        .unwrap();

        assert_eq!(confirmation.participants, 1);
        assert_eq!(store.booking_count(), 1);
        assert_eq!(
            store.spots_left(session.id),
            Some(session.available_spots - 1)
        );
    }

    #[tokio::test]
    async fn session_of_another_course_is_not_open() {
        let (store, env, courses, sessions) = seeded();
        let (_, session) = open_session(&courses, &sessions);
        let other = courses
            .iter()
            .find(|c| c.is_active && c.id != session.course_id)
            .unwrap();

        let error = book_session(
            env,
            BookingRequest {
                course_id: other.id,
                session_id: session.id,
                contact: contact(),
                participants: 1,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(error, WorkflowError::SessionNotOpen(session.id));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn unknown_course_is_reported() {
        let (_, env, _, _) = seeded();
        let course_id = CourseId::new();
        let error = book_session(
            env,
            BookingRequest {
                course_id,
                session_id: SessionId::new(),
                contact: contact(),
                participants: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(error, WorkflowError::UnknownCourse(course_id));
    }

    #[tokio::test]
    async fn oversized_party_is_invalid() {
        let (store, env, courses, sessions) = seeded();
        let (course_id, session) = open_session(&courses, &sessions);

        let error = book_session(
            env,
            BookingRequest {
                course_id,
                session_id: session.id,
                contact: contact(),
                participants: session.available_spots + 1,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            WorkflowError::Invalid(vec![ValidationError::ParticipantsOutOfRange {
                requested: session.available_spots + 1,
                available: session.available_spots,
            }])
        );
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let (store, env, courses, sessions) = seeded();
        let (course_id, session) = open_session(&courses, &sessions);
        store.set_offline(true);

        let error = book_session(
            env,
            BookingRequest {
                course_id,
                session_id: session.id,
                contact: contact(),
                participants: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(error, WorkflowError::Unavailable(_)));
    }
}
