//! State and actions of the quote request form.

use crate::pricing::EstimateBreakdown;
use crate::types::{
    ContactDetails, NewQuoteRequest, QuoteId, QuoteRequest, ServiceLevel, UserId, ValidationError,
    non_blank,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Quote form inputs as typed.
///
/// Numbers are kept signed so that a visitor typing `0` or `-5` is treated as
/// "not specified" by the estimator instead of being rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteDraft {
    /// Contact details
    pub contact: ContactDetails,
    /// Kind of event (required)
    pub event_type: String,
    /// Date of the event
    pub event_date: Option<NaiveDate>,
    /// Length of the event in hours
    pub event_duration_hours: Option<i64>,
    /// Expected attendance
    pub expected_attendees: Option<i64>,
    /// Venue or town
    pub location: Option<String>,
    /// Service level as selected; unknown values price as basic but are
    /// refused on submit
    pub service_level: Option<String>,
    /// Free-text requirements
    pub additional_requirements: Option<String>,
}

impl QuoteDraft {
    /// Parsed service level, `None` when blank or unknown.
    #[must_use]
    pub fn service_level(&self) -> Option<ServiceLevel> {
        self.service_level.as_deref()?.parse().ok()
    }

    /// Estimate for the current inputs.
    #[must_use]
    pub fn breakdown(&self) -> EstimateBreakdown {
        EstimateBreakdown::compute(
            self.expected_attendees,
            self.event_duration_hours,
            self.service_level(),
        )
    }

    /// Everything wrong with the required fields.
    #[must_use]
    pub fn problems(&self) -> Vec<ValidationError> {
        let mut problems = self.contact.problems();
        if self.event_type.trim().is_empty() {
            problems.push(ValidationError::MissingField {
                field: "event_type",
            });
        }
        if let Some(level) = non_blank(self.service_level.clone()) {
            if level.parse::<ServiceLevel>().is_err() {
                problems.push(ValidationError::UnknownServiceLevel { value: level });
            }
        }
        problems
    }

    /// The request to store, with `estimated_quote` as given.
    #[must_use]
    pub fn to_request(&self, estimated_quote: Option<u64>, user_id: Option<UserId>) -> NewQuoteRequest {
        NewQuoteRequest {
            contact: self.contact.normalized(),
            event_type: self.event_type.trim().to_string(),
            event_date: self.event_date,
            event_duration_hours: positive(self.event_duration_hours),
            expected_attendees: positive(self.expected_attendees),
            location: non_blank(self.location.clone()),
            service_level: self.service_level(),
            additional_requirements: non_blank(self.additional_requirements.clone()),
            estimated_quote,
            user_id,
        }
    }
}

fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Non-fatal message shown above the quote form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteNotice {
    /// The request could not be stored; the draft is kept
    SubmissionFailed,
}

impl QuoteNotice {
    /// Text shown to the visitor
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SubmissionFailed => {
                "Your quote request could not be submitted. Please try again."
            },
        }
    }
}

/// Shown once the quote request is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteReceipt {
    /// Stored request id
    pub quote_id: QuoteId,
    /// Estimate sent with the request
    pub estimated_quote: Option<u64>,
}

impl QuoteReceipt {
    /// Confirmation text
    #[must_use]
    pub fn message(&self) -> String {
        let thanks = "Thank you. We'll be in touch with a tailored quote.";
        match self.estimated_quote {
            Some(amount) => format!("{thanks} Indicative price: From £{amount}."),
            None => thanks.to_string(),
        }
    }
}

/// Quote form state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QuoteFormState {
    /// Inputs
    pub draft: QuoteDraft,
    /// Estimate snapshot for the current draft
    pub estimate: Option<EstimateBreakdown>,
    /// Request in flight
    pub submitting: bool,
    /// Set once stored; terminal
    pub receipt: Option<QuoteReceipt>,
    /// Problems with the required fields
    pub validation_errors: Vec<ValidationError>,
    /// Non-fatal message
    pub notice: Option<QuoteNotice>,
}

impl QuoteFormState {
    /// Whether the request has been stored
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.receipt.is_some()
    }
}

/// Quote form actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuoteAction {
    // ========== Commands ==========
    /// Replace the draft; drops any estimate
    Edit {
        /// New inputs
        draft: QuoteDraft,
    },

    /// Snapshot the estimate for the current draft
    CalculateEstimate,

    /// Validate and store the request
    Submit,

    // ========== Results ==========
    /// Request stored
    QuoteSubmitted {
        /// Stored request
        quote: QuoteRequest,
    },

    /// Request could not be stored
    SubmissionFailed {
        /// Store error text
        error: String,
    },
}
