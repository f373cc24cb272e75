//! Booking wizard demo
//!
//! Walks two visitors through the course booking wizard against an
//! in-memory catalog:
//! - course and session selection
//! - a successful booking with its confirmation
//! - a capacity race where the second visitor is told how many spots remain
//! - an admin cancellation returning the spots
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin booking-demo
//! ```

use medcover::booking::{
    BookingAction, BookingEnvironment, BookingReducer, BookingWizardState, ParticipantForm,
};
use medcover::status::{StatusLifecycle, TransitionPolicy};
use medcover::store::{InMemoryStore, seed};
use medcover::types::{ContactDetails, UserId};
use medcover::workflow::settle;
use medcover::Actor;
use medcover_core::environment::{Clock, SystemClock};
use medcover_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Wizard = Store<BookingWizardState, BookingAction, BookingEnvironment, BookingReducer>;

fn wizard(store: &InMemoryStore, clock: &Arc<dyn Clock>, user: UserId) -> Wizard {
    let env = BookingEnvironment::new(
        Arc::clone(clock),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    )
    .for_user(Some(user));
    Store::new(BookingWizardState::new(), BookingReducer::new(), env)
}

fn contact(name: &str, email: &str) -> ContactDetails {
    ContactDetails {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        company: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,medcover=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n============================================");
    println!("   Course booking wizard - demo");
    println!("============================================\n");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = InMemoryStore::with_clock(Arc::clone(&clock));
    let (courses, sessions) = seed::demo_catalog(clock.today());
    store.load_catalog(courses, sessions)?;

    // ========== Visitor one ==========
    let alice = UserId::new();
    let first = wizard(&store, &clock, alice);

    println!("1. Loading courses...");
    settle(&first, BookingAction::LoadCourses).await?;
    let courses = first.state(|s| s.courses.clone()).await;
    for course in &courses {
        println!("   - {}", course.title);
    }

    let Some(course) = courses.first().cloned() else {
        anyhow::bail!("demo catalog has no active courses");
    };
    println!("\n2. Selecting '{}'...", course.title);
    settle(&first, BookingAction::SelectCourse { course_id: course.id }).await?;
    let sessions = first.state(|s| s.sessions.clone()).await;
    for session in &sessions {
        println!(
            "   - {} {} ({} spots)",
            session.session_date, session.start_time, session.available_spots
        );
    }
    let Some(session) = sessions.first().cloned() else {
        anyhow::bail!("'{}' has no open sessions", course.title);
    };

    // A second visitor opens the same session before the first one books.
    let bob = wizard(&store, &clock, UserId::new());
    settle(&bob, BookingAction::LoadCourses).await?;
    settle(&bob, BookingAction::SelectCourse { course_id: course.id }).await?;
    settle(&bob, BookingAction::SelectSession { session_id: session.id }).await?;

    println!("\n3. Booking all but one of the {} spots...", session.available_spots);
    settle(&first, BookingAction::SelectSession { session_id: session.id }).await?;
    let form = ParticipantForm {
        contact: contact("Alice Carter", "alice@example.com"),
        participants: session.available_spots.saturating_sub(1).max(1),
    };
    settle(&first, BookingAction::EditDetails { form }).await?;
    settle(&first, BookingAction::Submit).await?;
    match first.state(|s| s.confirmation.clone()).await {
        Some(confirmation) => println!("   ✓ {}", confirmation.summary()),
        None => println!("   ✗ booking failed: {:?}", first.state(|s| s.notice.clone()).await),
    }

    // ========== Visitor two, with a stale spot count ==========
    println!("\n4. A second visitor, still seeing the old spot count, asks for 3...");
    let form = ParticipantForm {
        contact: contact("Bob Hughes", "bob@example.com"),
        participants: 3,
    };
    settle(&bob, BookingAction::EditDetails { form }).await?;
    settle(&bob, BookingAction::Submit).await?;
    let (errors, notice) = bob
        .state(|s| (s.validation_errors.clone(), s.notice.clone()))
        .await;
    for error in errors {
        println!("   ✗ {error}");
    }
    if let Some(notice) = notice {
        println!("   ! {}", notice.message());
    }

    // ========== Admin cancellation ==========
    println!("\n5. Admin cancels the first booking...");
    let lifecycle = StatusLifecycle::new(Arc::new(store.clone()), TransitionPolicy::Strict);
    if let Some(confirmation) = first.state(|s| s.confirmation.clone()).await {
        let outcome = lifecycle
            .cancel_booking(&Actor::admin(UserId::new()), confirmation.booking_id)
            .await?;
        println!(
            "   ✓ released {} spots; session now has {:?}",
            outcome.released_spots,
            store.spots_left(session.id)
        );
    }

    first.shutdown(Duration::from_secs(5)).await?;
    bob.shutdown(Duration::from_secs(5)).await?;
    println!("\nDone.\n");
    Ok(())
}
