//! Submission statuses and the admin-driven lifecycle that moves them.
//!
//! Every submission kind has its own closed status set. Only admins change a
//! status, one field at a time, keyed by id. Whether any status may follow
//! any other is decided by the configured [`TransitionPolicy`].

use crate::actor::Actor;
use crate::store::{StoreError, SubmissionStore};
use crate::types::{BookingId, ContactId, QuoteId, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Which table a submission lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// Quote request
    Quote,
    /// Course booking
    Booking,
    /// Contact inquiry
    Contact,
}

impl SubmissionKind {
    /// Short name used in logs and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Booking => "booking",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the kind's closed set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    /// Kind the status was parsed for
    pub kind: SubmissionKind,
    /// Offending value
    pub value: String,
}

/// Behaviour shared by the per-kind status enums.
pub trait SubmissionStatus:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = UnknownStatus> + Send + Sync + 'static
{
    /// Typed id of submissions carrying this status
    type Id: Copy + fmt::Display + Into<Uuid> + Send + Sync + 'static;

    /// Submission kind
    const KIND: SubmissionKind;

    /// Every status of the kind, in lifecycle order
    const ALL: &'static [Self];

    /// Status assigned on creation
    fn initial() -> Self;

    /// Stored text
    fn as_str(self) -> &'static str;

    /// Statuses reachable in one step under the strict policy
    fn allowed_next(self) -> &'static [Self];
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $id:ty, $kind:expr, initial = $initial:ident,
        { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            fn text(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.text())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$initial
            }
        }

        impl From<$id> for Uuid {
            fn from(id: $id) -> Self {
                *id.as_uuid()
            }
        }
    };
}

status_enum!(
    /// Lifecycle of a quote request: `new → reviewed → quoted → accepted | rejected`.
    QuoteStatus, QuoteId, SubmissionKind::Quote, initial = New,
    {
        /// Just submitted
        New => "new",
        /// Seen by staff
        Reviewed => "reviewed",
        /// A price has been sent
        Quoted => "quoted",
        /// Client accepted
        Accepted => "accepted",
        /// Client declined or request turned down
        Rejected => "rejected",
    }
);

status_enum!(
    /// Lifecycle of a course booking: `pending → confirmed → completed`, or cancelled.
    BookingStatus, BookingId, SubmissionKind::Booking, initial = Pending,
    {
        /// Awaiting confirmation
        Pending => "pending",
        /// Place confirmed
        Confirmed => "confirmed",
        /// Booking withdrawn
        Cancelled => "cancelled",
        /// Course attended
        Completed => "completed",
    }
);

status_enum!(
    /// Lifecycle of a contact inquiry: `new → read → replied`, or archived.
    ContactStatus, ContactId, SubmissionKind::Contact, initial = New,
    {
        /// Just submitted
        New => "new",
        /// Opened by staff
        Read => "read",
        /// Answered
        Replied => "replied",
        /// Filed away
        Archived => "archived",
    }
);

impl SubmissionStatus for QuoteStatus {
    type Id = QuoteId;
    const KIND: SubmissionKind = SubmissionKind::Quote;
    const ALL: &'static [Self] = &[
        Self::New,
        Self::Reviewed,
        Self::Quoted,
        Self::Accepted,
        Self::Rejected,
    ];

    fn initial() -> Self {
        Self::New
    }

    fn as_str(self) -> &'static str {
        self.text()
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Reviewed],
            Self::Reviewed => &[Self::Quoted],
            Self::Quoted => &[Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => &[],
        }
    }
}

impl SubmissionStatus for BookingStatus {
    type Id = BookingId;
    const KIND: SubmissionKind = SubmissionKind::Booking;
    const ALL: &'static [Self] = &[
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
    ];

    fn initial() -> Self {
        Self::Pending
    }

    fn as_str(self) -> &'static str {
        self.text()
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Completed, Self::Cancelled],
            Self::Cancelled | Self::Completed => &[],
        }
    }
}

impl SubmissionStatus for ContactStatus {
    type Id = ContactId;
    const KIND: SubmissionKind = SubmissionKind::Contact;
    const ALL: &'static [Self] = &[Self::New, Self::Read, Self::Replied, Self::Archived];

    fn initial() -> Self {
        Self::New
    }

    fn as_str(self) -> &'static str {
        self.text()
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Read, Self::Archived],
            Self::Read => &[Self::Replied, Self::Archived],
            Self::Replied => &[Self::Archived],
            Self::Archived => &[],
        }
    }
}

/// Which status changes an admin may make.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may follow any other
    #[default]
    Unrestricted,
    /// Only the edges listed by [`SubmissionStatus::allowed_next`]
    Strict,
}

impl TransitionPolicy {
    /// Whether `from → to` is allowed. Re-applying the current status always is.
    #[must_use]
    pub fn permits<S: SubmissionStatus>(self, from: S, to: S) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Strict => from == to || from.allowed_next().contains(&to),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" | "any" => Ok(Self::Unrestricted),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown transition policy '{other}'")),
        }
    }
}

/// Why a status change was refused.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Caller is not an admin
    #[error("only admins may change submission status")]
    Forbidden,

    /// No submission with that id
    #[error("{kind} {id} not found")]
    NotFound {
        /// Submission kind
        kind: SubmissionKind,
        /// Requested id
        id: Uuid,
    },

    /// The policy does not allow the change
    #[error("{kind} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        /// Submission kind
        kind: SubmissionKind,
        /// Current status
        from: &'static str,
        /// Requested status
        to: &'static str,
    },

    /// The stored status is not one this kind knows
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A status change that was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusChange<S> {
    /// Submission kind
    pub kind: SubmissionKind,
    /// Submission id
    pub id: Uuid,
    /// Status before the change
    pub from: S,
    /// Status after the change
    pub to: S,
}

/// Result of [`StatusLifecycle::cancel_booking`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    /// Cancelled booking
    pub booking_id: BookingId,
    /// Session whose spots were returned
    pub session_id: SessionId,
    /// Status the booking had before
    pub previous: BookingStatus,
    /// Spots handed back to the session (zero if it was already cancelled)
    pub released_spots: u32,
}

/// Applies admin status changes against the submission store.
#[derive(Clone)]
pub struct StatusLifecycle {
    store: Arc<dyn SubmissionStore>,
    policy: TransitionPolicy,
}

impl StatusLifecycle {
    /// Create a lifecycle manager over `store` using `policy`
    #[must_use]
    pub fn new(store: Arc<dyn SubmissionStore>, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    /// Policy in force
    #[must_use]
    pub const fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Set the status of one submission. No other field changes.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Forbidden`] for non-admins, `NotFound` for unknown
    /// ids, `InvalidTransition` when the policy refuses, or a store error.
    #[tracing::instrument(skip_all, fields(kind = %S::KIND, id = %id, to = %to))]
    pub async fn set_status<S: SubmissionStatus>(
        &self,
        actor: &Actor,
        id: S::Id,
        to: S,
    ) -> Result<StatusChange<S>, LifecycleError> {
        if !actor.is_admin() {
            tracing::warn!(?actor, "status change refused for non-admin");
            return Err(LifecycleError::Forbidden);
        }

        let raw: Uuid = id.into();
        let from = self.current::<S>(raw).await?;

        if !self.policy.permits(from, to) {
            return Err(LifecycleError::InvalidTransition {
                kind: S::KIND,
                from: from.as_str(),
                to: to.as_str(),
            });
        }

        if !self.store.update_status(S::KIND, raw, to.as_str()).await? {
            return Err(LifecycleError::NotFound { kind: S::KIND, id: raw });
        }

        tracing::info!(%from, "status updated");
        Ok(StatusChange {
            kind: S::KIND,
            id: raw,
            from,
            to,
        })
    }

    /// Cancel a booking and hand its participants back to the session.
    ///
    /// A booking's spots are released at most once: cancelling it again,
    /// even after an admin moved it back out of `cancelled`, releases
    /// nothing. Completed bookings keep their spots.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_status`].
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn cancel_booking(
        &self,
        actor: &Actor,
        id: BookingId,
    ) -> Result<CancelOutcome, LifecycleError> {
        if !actor.is_admin() {
            tracing::warn!(?actor, "cancellation refused for non-admin");
            return Err(LifecycleError::Forbidden);
        }

        let raw: Uuid = id.into();
        let from = self.current::<BookingStatus>(raw).await?;
        if !self.policy.permits(from, BookingStatus::Cancelled) {
            return Err(LifecycleError::InvalidTransition {
                kind: SubmissionKind::Booking,
                from: from.as_str(),
                to: BookingStatus::Cancelled.as_str(),
            });
        }

        let cancellation = self
            .store
            .cancel_booking(id)
            .await?
            .ok_or(LifecycleError::NotFound {
                kind: SubmissionKind::Booking,
                id: raw,
            })?;

        let previous = cancellation.previous_status.parse::<BookingStatus>()?;
        tracing::info!(
            %previous,
            released = cancellation.released_spots,
            "booking cancelled"
        );
        Ok(CancelOutcome {
            booking_id: id,
            session_id: cancellation.session_id,
            previous,
            released_spots: cancellation.released_spots,
        })
    }

    async fn current<S: SubmissionStatus>(&self, id: Uuid) -> Result<S, LifecycleError> {
        let text = self
            .store
            .status_of(S::KIND, id)
            .await?
            .ok_or(LifecycleError::NotFound { kind: S::KIND, id })?;
        Ok(text.parse::<S>()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_through_text() {
        for status in QuoteStatus::ALL {
            assert_eq!(status.as_str().parse::<QuoteStatus>(), Ok(*status));
        }
        for status in BookingStatus::ALL {
            assert_eq!(status.to_string().parse::<BookingStatus>(), Ok(*status));
        }
        let err = "deleted".parse::<ContactStatus>().unwrap_err();
        assert_eq!(err.kind, SubmissionKind::Contact);
    }

    #[test]
    fn initial_statuses() {
        assert_eq!(QuoteStatus::initial(), QuoteStatus::New);
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
        assert_eq!(ContactStatus::initial(), ContactStatus::New);
    }

    #[test]
    fn unrestricted_policy_allows_everything() {
        let policy = TransitionPolicy::Unrestricted;
        for from in QuoteStatus::ALL {
            for to in QuoteStatus::ALL {
                assert!(policy.permits(*from, *to));
            }
        }
    }

    #[test]
    fn strict_policy_follows_the_documented_edges() {
        let policy = TransitionPolicy::Strict;
        assert!(policy.permits(QuoteStatus::New, QuoteStatus::Reviewed));
        assert!(policy.permits(QuoteStatus::Quoted, QuoteStatus::Rejected));
        assert!(!policy.permits(QuoteStatus::New, QuoteStatus::Accepted));
        assert!(!policy.permits(QuoteStatus::Accepted, QuoteStatus::New));

        assert!(policy.permits(BookingStatus::Pending, BookingStatus::Cancelled));
        assert!(policy.permits(BookingStatus::Confirmed, BookingStatus::Cancelled));
        assert!(!policy.permits(BookingStatus::Completed, BookingStatus::Cancelled));
        assert!(!policy.permits(BookingStatus::Pending, BookingStatus::Completed));

        assert!(policy.permits(ContactStatus::Replied, ContactStatus::Archived));
        assert!(!policy.permits(ContactStatus::Archived, ContactStatus::New));

        assert!(policy.permits(ContactStatus::Read, ContactStatus::Read));
    }

    #[test]
    fn policy_parses_from_config_text() {
        assert_eq!("STRICT".parse(), Ok(TransitionPolicy::Strict));
        assert_eq!("unrestricted".parse(), Ok(TransitionPolicy::Unrestricted));
        assert!("loose".parse::<TransitionPolicy>().is_err());
    }
}
