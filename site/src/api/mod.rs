//! JSON API handlers.

pub mod bookings;
pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod quotes;
