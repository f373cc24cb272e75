//! Caller identity as handed over by the upstream auth gateway.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a caller is allowed to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Not signed in
    #[default]
    Anonymous,
    /// Signed-in visitor
    Customer,
    /// Staff member who triages submissions
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "customer" | "user" => Ok(Self::Customer),
            "" | "anonymous" => Ok(Self::Anonymous),
            _ => Err(()),
        }
    }
}

/// The caller on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Signed-in user, if any
    pub user_id: Option<UserId>,
    /// Role granted by the gateway
    pub role: Role,
}

impl Actor {
    /// Caller without a session
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            role: Role::Anonymous,
        }
    }

    /// Signed-in visitor
    #[must_use]
    pub const fn customer(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: Role::Customer,
        }
    }

    /// Staff member
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: Role::Admin,
        }
    }

    /// Whether the caller may run admin operations
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin) && self.user_id.is_some()
    }
}
