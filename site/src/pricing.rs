//! Indicative pricing for event medical cover.
//!
//! The estimate is a fixed schedule: a base rate picked by attendee bracket,
//! scaled by the service level and by the event length beyond four hours.
//! Inputs that are absent, zero or negative count as "unspecified" and fall
//! back to the smallest bracket and the four-hour baseline, so the result is
//! never zero.

use crate::types::ServiceLevel;
use serde::{Deserialize, Serialize};

/// Event length covered by the base rate.
pub const BASELINE_HOURS: u64 = 4;

/// Attendee brackets as `(inclusive upper bound, base rate)`.
const BRACKETS: [(u64, u64); 4] = [(100, 250), (500, 450), (1_000, 750), (5_000, 1_500)];

/// Base rate above the last bracket.
const TOP_RATE: u64 = 2_500;

/// Base rate in whole pounds for an attendance figure.
#[must_use]
pub fn base_rate_for(attendees: Option<i64>) -> u64 {
    let attendees = specified(attendees).unwrap_or(0);
    BRACKETS
        .iter()
        .find(|(upper, _)| attendees <= *upper)
        .map_or(TOP_RATE, |(_, rate)| *rate)
}

/// Price estimate in whole pounds, halves rounded up.
///
/// ```
/// use medcover::pricing::estimate;
/// use medcover::types::ServiceLevel;
///
/// assert_eq!(estimate(Some(500), Some(4), Some(ServiceLevel::Standard)), 675);
/// assert_eq!(estimate(None, None, None), 250);
/// ```
#[must_use]
pub fn estimate(
    attendees: Option<i64>,
    duration_hours: Option<i64>,
    service_level: Option<ServiceLevel>,
) -> u64 {
    EstimateBreakdown::compute(attendees, duration_hours, service_level).amount
}

/// Itemised estimate, as shown next to the quote form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateBreakdown {
    /// Base rate for the attendee bracket
    pub base_rate: u64,
    /// Service level the multiplier came from
    pub service_level: Option<ServiceLevel>,
    /// Service level multiplier
    pub multiplier: f64,
    /// Hours the duration factor was computed from
    pub billable_hours: u64,
    /// `max(1, hours / 4)`
    pub duration_factor: f64,
    /// Rounded estimate in whole pounds
    pub amount: u64,
}

impl EstimateBreakdown {
    /// Compute the breakdown for the given event attributes.
    #[must_use]
    pub fn compute(
        attendees: Option<i64>,
        duration_hours: Option<i64>,
        service_level: Option<ServiceLevel>,
    ) -> Self {
        let base_rate = base_rate_for(attendees);
        let billable_hours = specified(duration_hours)
            .unwrap_or(BASELINE_HOURS)
            .max(BASELINE_HOURS);
        let halves = service_level.map_or(2, ServiceLevel::multiplier_halves);

        // base * (halves / 2) * (hours / 4), kept in integers until the end
        let numerator = base_rate
            .saturating_mul(halves)
            .saturating_mul(billable_hours);
        let denominator = 2 * BASELINE_HOURS;
        let amount = numerator.saturating_add(denominator / 2) / denominator;

        Self {
            base_rate,
            service_level,
            multiplier: service_level.map_or(1.0, ServiceLevel::multiplier),
            billable_hours,
            duration_factor: ratio(billable_hours, BASELINE_HOURS),
            amount,
        }
    }
}

fn specified(value: Option<i64>) -> Option<u64> {
    value
        .filter(|v| *v > 0)
        .and_then(|v| u64::try_from(v).ok())
}

#[allow(clippy::cast_precision_loss)] // hours are small
fn ratio(hours: u64, baseline: u64) -> f64 {
    hours as f64 / baseline as f64
}
