//! Router configuration.

use super::health::health_check;
use super::state::AppState;
use crate::api::{bookings, catalog, contact, dashboard, quotes};
use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete router.
///
/// Caller identity comes from the gateway headers, see
/// [`super::extract::Caller`].
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/overview", get(dashboard::admin))
        .route("/quotes/:id/status", patch(dashboard::quote_status))
        .route("/bookings/:id/status", patch(dashboard::booking_status))
        .route("/contacts/:id/status", patch(dashboard::contact_status))
        .route("/bookings/:id/cancel", post(dashboard::cancel_booking));

    let api_routes = Router::new()
        // Catalog
        .route("/courses", get(catalog::list_courses))
        .route("/courses/:id/sessions", get(catalog::list_sessions))
        // Quotes
        .route("/quotes/options", get(quotes::quote_options))
        .route("/quotes/estimate", post(quotes::estimate))
        .route("/quotes", post(quotes::submit))
        // Bookings and inquiries
        .route("/bookings", post(bookings::create_booking))
        .route("/contact", post(contact::create_contact))
        // Signed-in views
        .route("/portal", get(dashboard::portal))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
