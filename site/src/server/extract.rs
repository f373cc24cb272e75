//! Custom extractors.
//!
//! The upstream auth gateway authenticates the visitor and forwards who they
//! are in two headers:
//! - `x-user-id`: UUID of the signed-in user (absent when anonymous)
//! - `x-user-role`: `admin` or `customer`

use super::error::AppError;
use crate::actor::{Actor, Role};
use crate::types::UserId;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// Header carrying the signed-in user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the signed-in user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller, as an extractor.
///
/// ```ignore
/// async fn handler(Caller(actor): Caller) -> String {
///     format!("{:?}", actor.role)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(Self)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::bad_request(format!("{name} is not valid text")))
        })
        .transpose()
        .map(|value| value.filter(|v| !v.is_empty()))
}

/// Build the actor from gateway headers.
///
/// A role without a user id is treated as anonymous. A user id without a role
/// is a customer.
///
/// # Errors
///
/// 400 when the user id is not a UUID or the role is unknown.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header(headers, USER_ID_HEADER)?
        .map(|raw| {
            raw.parse::<UserId>()
                .map_err(|_| AppError::bad_request(format!("{USER_ID_HEADER} is not a UUID")))
        })
        .transpose()?;

    let role = header(headers, USER_ROLE_HEADER)?
        .map(|raw| {
            raw.parse::<Role>()
                .map_err(|()| AppError::bad_request(format!("unknown role '{raw}'")))
        })
        .transpose()?;

    Ok(match (user_id, role) {
        (None, _) => Actor::anonymous(),
        (Some(id), Some(Role::Admin)) => Actor::admin(id),
        (Some(id), _) => Actor::customer(id),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn no_headers_is_anonymous() {
        assert_eq!(actor_from_headers(&HeaderMap::new()).unwrap(), Actor::anonymous());
    }

    #[test]
    fn admin_role_with_id() {
        let actor = actor_from_headers(&headers(&[
            (USER_ID_HEADER, "6f1c9a52-2b7e-4a55-9a0e-0d6a3f2f1b11"),
            (USER_ROLE_HEADER, "Admin"),
        ]))
        .unwrap();
        assert!(actor.is_admin());
    }

    #[test]
    fn id_without_role_is_a_customer() {
        let actor = actor_from_headers(&headers(&[(
            USER_ID_HEADER,
            "6f1c9a52-2b7e-4a55-9a0e-0d6a3f2f1b11",
        )]))
        .unwrap();
        assert_eq!(actor.role, Role::Customer);
    }

    #[test]
    fn admin_role_without_id_is_anonymous() {
        let actor = actor_from_headers(&headers(&[(USER_ROLE_HEADER, "admin")])).unwrap();
        assert!(!actor.is_admin());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let err = actor_from_headers(&headers(&[(USER_ID_HEADER, "42")])).unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
        let err = actor_from_headers(&headers(&[
            (USER_ID_HEADER, "6f1c9a52-2b7e-4a55-9a0e-0d6a3f2f1b11"),
            (USER_ROLE_HEADER, "owner"),
        ]))
        .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
