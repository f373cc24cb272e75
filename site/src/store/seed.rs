//! Demo catalog used by `SEED_DEMO_DATA` and the booking demo binary.

use crate::types::{Course, CourseId, CourseSession, SessionId};
use chrono::{Days, NaiveDate, NaiveTime};

/// A handful of courses with sessions spread over the weeks after `today`.
///
/// Includes one inactive course, one full session and one past session so
/// that the catalog filters have something to filter.
#[must_use]
pub fn demo_catalog(today: NaiveDate) -> (Vec<Course>, Vec<CourseSession>) {
    let course = |title: &str, duration: &str, price_pence: u32, category: &str, active: bool| {
        Course {
            id: CourseId::new(),
            title: title.to_string(),
            description: Some(format!("{title} course run by our clinical trainers.")),
            duration: Some(duration.to_string()),
            price_pence: Some(price_pence),
            category: Some(category.to_string()),
            is_active: active,
        }
    };

    let efaw = course("Emergency First Aid at Work", "1 day", 9_500, "First Aid", true);
    let faw = course("First Aid at Work", "3 days", 27_500, "First Aid", true);
    let paediatric = course("Paediatric First Aid", "2 days", 15_000, "First Aid", true);
    let mental_health = course("Mental Health First Aid", "2 days", 18_000, "Wellbeing", true);
    let retired = course("AED Awareness (legacy)", "half day", 4_500, "First Aid", false);

    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
    let half_nine = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default();
    let session = |course: &Course, offset: i64, start: NaiveTime, venue: &str, spots: u32| {
        let session_date = if offset >= 0 {
            today.checked_add_days(Days::new(offset.unsigned_abs()))
        } else {
            today.checked_sub_days(Days::new(offset.unsigned_abs()))
        }
        .unwrap_or(today);
        CourseSession {
            id: SessionId::new(),
            course_id: course.id,
            session_date,
            start_time: start,
            location: Some(venue.to_string()),
            available_spots: spots,
        }
    };

    let sessions = vec![
        session(&efaw, 7, nine, "Leeds Training Centre", 12),
        session(&efaw, 21, nine, "Manchester Conference Suite", 8),
        session(&efaw, -3, nine, "Leeds Training Centre", 10),
        session(&faw, 14, half_nine, "Leeds Training Centre", 6),
        session(&faw, 28, half_nine, "Sheffield Hub", 0),
        session(&paediatric, 10, nine, "York Community Hall", 10),
        session(&retired, 5, nine, "Leeds Training Centre", 20),
    ];

    (vec![efaw, faw, paediatric, mental_health, retired], sessions)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_something_to_filter() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let (courses, sessions) = demo_catalog(today);

        assert!(courses.iter().any(|c| !c.is_active));
        assert!(sessions.iter().any(|s| s.available_spots == 0));
        assert!(sessions.iter().any(|s| s.session_date < today));
        assert!(
            sessions
                .iter()
                .all(|s| courses.iter().any(|c| c.id == s.course_id))
        );

        let mental_health = courses
            .iter()
            .find(|c| c.title == "Mental Health First Aid")
            .unwrap();
        assert!(sessions.iter().all(|s| s.course_id != mental_health.id));
    }
}
