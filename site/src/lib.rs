//! # Medcover
//!
//! Back office and public forms for an event medical cover provider:
//! visitors request quotes for event cover, book places on first-aid
//! training sessions and send general inquiries; staff triage everything
//! from an admin dashboard.
//!
//! # Architecture
//!
//! ```text
//!  HTTP (axum)             Workflows (reducers)          Persistence
//! ┌─────────────┐        ┌──────────────────────┐      ┌────────────────┐
//! │ /api/quotes │──────▶ │ QuoteReducer         │─────▶│ SubmissionStore│
//! │ /api/booking│──────▶ │ BookingReducer       │─────▶│ CourseCatalog  │
//! │ /api/admin  │──────▶ │ StatusLifecycle      │─────▶│ (memory | pg)  │
//! └─────────────┘        └──────────────────────┘      └────────────────┘
//! ```
//!
//! The quote form and booking wizard are reducers run by a
//! [`medcover_runtime::Store`]: persistence calls are effects whose results
//! come back as actions. Booking capacity is enforced by the store adapters
//! with an atomic conditional decrement, so two visitors racing for the last
//! spot cannot both win.
//!
//! # Modules
//!
//! - [`pricing`]: indicative estimate for event cover
//! - [`quote`]: quote form reducer
//! - [`booking`]: course booking wizard reducer
//! - [`contact`]: general inquiries
//! - [`status`]: admin-driven status lifecycle
//! - [`dashboard`]: admin and portal overviews
//! - [`store`]: persistence traits with in-memory and `PostgreSQL` adapters
//! - [`server`], [`api`]: HTTP surface

pub mod actor;
pub mod api;
pub mod app;
pub mod booking;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod pricing;
pub mod quote;
pub mod server;
pub mod status;
pub mod store;
pub mod types;
pub mod workflow;

pub use actor::{Actor, Role};
pub use config::Config;
pub use server::{AppState, build_router};
