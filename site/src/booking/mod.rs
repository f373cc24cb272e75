//! Course booking wizard.
//!
//! Four stages: choose a course, choose one of its upcoming sessions, enter
//! participant details, submit. Driven through a [`medcover_runtime::Store`]
//! or directly through [`BookingReducer`] in tests.
//!
//! ```ignore
//! let store = Store::new(BookingWizardState::new(), BookingReducer::new(), env);
//! store.send(BookingAction::LoadCourses).await?;
//! ```

pub mod environment;
pub mod reducer;
pub mod service;
pub mod types;

pub use environment::BookingEnvironment;
pub use reducer::BookingReducer;
pub use service::{BookingRequest, book_session};
pub use types::{
    BookingAction, BookingConfirmation, BookingWizardState, Notice, ParticipantForm, WizardStage,
};
