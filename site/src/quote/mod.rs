//! Quote request form: draft, indicative estimate, submission.

pub mod reducer;
pub mod service;
pub mod types;

pub use reducer::{QuoteEnvironment, QuoteReducer};
pub use service::submit_quote;
pub use types::{QuoteAction, QuoteDraft, QuoteFormState, QuoteNotice, QuoteReceipt};
