//! Quote endpoints.
//!
//! - GET /api/quotes/options - event types and service levels for the form
//! - POST /api/quotes/estimate - itemised indicative estimate
//! - POST /api/quotes - submit a quote request

use crate::pricing::EstimateBreakdown;
use crate::quote::{QuoteDraft, submit_quote};
use crate::server::error::AppError;
use crate::server::extract::Caller;
use crate::server::state::AppState;
use crate::types::{EVENT_TYPES, QuoteId, ServiceLevel};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// One selectable service level.
#[derive(Debug, Serialize)]
pub struct ServiceLevelOption {
    /// Submitted value
    pub value: ServiceLevel,
    /// Label on the form
    pub label: &'static str,
    /// Price multiplier
    pub multiplier: f64,
}

/// Choices offered by the quote form.
#[derive(Debug, Serialize)]
pub struct QuoteOptions {
    /// Event types
    pub event_types: Vec<&'static str>,
    /// Service levels, cheapest first
    pub service_levels: Vec<ServiceLevelOption>,
}

/// Inputs of the estimator. Unknown service levels price as basic.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EstimateRequest {
    /// Expected attendance
    pub expected_attendees: Option<i64>,
    /// Event length in hours
    pub event_duration_hours: Option<i64>,
    /// Service level value
    pub service_level: Option<String>,
}

/// Quote request body.
#[derive(Debug, Deserialize)]
pub struct SubmitQuoteRequest {
    /// Form fields
    #[serde(flatten)]
    pub draft: QuoteDraft,
    /// Store an estimate snapshot with the request
    #[serde(default)]
    pub calculate_estimate: bool,
}

/// Response after storing a quote request.
#[derive(Debug, Serialize)]
pub struct SubmitQuoteResponse {
    /// Stored request id
    pub quote_id: QuoteId,
    /// Estimate stored with the request
    pub estimated_quote: Option<u64>,
    /// Confirmation text
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Event types and service levels.
pub async fn quote_options() -> Json<QuoteOptions> {
    Json(QuoteOptions {
        event_types: EVENT_TYPES.to_vec(),
        service_levels: ServiceLevel::ALL
            .into_iter()
            .map(|level| ServiceLevelOption {
                value: level,
                label: level.label(),
                multiplier: level.multiplier(),
            })
            .collect(),
    })
}

/// Itemised estimate.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/quotes/estimate \
///   -H "Content-Type: application/json" \
///   -d '{"expected_attendees": 500, "event_duration_hours": 4, "service_level": "standard"}'
/// # {"base_rate":450,"service_level":"standard","multiplier":1.5,...,"amount":675}
/// ```
pub async fn estimate(Json(request): Json<EstimateRequest>) -> Json<EstimateBreakdown> {
    let service_level = request
        .service_level
        .as_deref()
        .and_then(|level| level.parse().ok());
    Json(EstimateBreakdown::compute(
        request.expected_attendees,
        request.event_duration_hours,
        service_level,
    ))
}

/// Submit a quote request.
///
/// # Errors
///
/// 422 when name, email or event type is missing; 503 if the store fails.
pub async fn submit(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(request): Json<SubmitQuoteRequest>,
) -> Result<(StatusCode, Json<SubmitQuoteResponse>), AppError> {
    let receipt = submit_quote(
        state.quote_env(actor.user_id),
        request.draft,
        request.calculate_estimate,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitQuoteResponse {
            quote_id: receipt.quote_id,
            estimated_quote: receipt.estimated_quote,
            message: receipt.message(),
        }),
    ))
}
