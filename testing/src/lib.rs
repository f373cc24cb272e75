//! # Medcover Testing
//!
//! Testing utilities for reducers and stores:
//! - [`FixedClock`] for deterministic "today"
//! - [`ReducerTest`] for Given-When-Then reducer tests
//! - [`effects::drain`] to resolve effect descriptions into the actions they
//!   would feed back, without a running `Store`
//!
//! ## Example
//!
//! ```ignore
//! use medcover_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(test_env())
//!     .given_state(BookingWizardState::default())
//!     .when_action(BookingAction::Abandon)
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use medcover_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// ```
    /// use medcover_testing::mocks::FixedClock;
    /// use medcover_core::environment::Clock;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    /// let clock = FixedClock::on(day);
    /// assert_eq!(clock.today(), day);
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// A clock stopped at noon UTC on `date`
        #[must_use]
        pub fn on(date: NaiveDate) -> Self {
            let noon = date
                .and_hms_opt(12, 0, 0)
                .unwrap_or_default()
                .and_utc();
            Self::new(noon)
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 12:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default())
    }
}

/// Resolve effects in tests without a `Store`
pub mod effects {
    use futures::future::join_all;
    use medcover_core::effect::Effect;

    /// Run every effect and collect the actions they produce, in effect order.
    ///
    /// Effects run concurrently. Produced actions are returned, not reduced.
    pub async fn drain<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let pending = effects.into_iter().filter_map(|effect| match effect {
            Effect::None => None,
            Effect::Future(fut) => Some(fut),
        });
        join_all(pending).await.into_iter().flatten().collect()
    }
}

/// Test helpers
pub mod helpers {
    /// Install a tracing subscriber that writes through the test harness.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

pub use mocks::{FixedClock, test_clock};
