//! Caller identity forwarded by the gateway.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{TourExecution, UserId};

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role allowed to run tour executions.
pub const TOURIST_ROLE: &str = "tourist";

/// The authenticated caller of a request.
///
/// The gateway validates the token and forwards the identity in headers;
/// a request without a user id is rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Option<String>,
}

impl Principal {
    /// Rejects callers whose role is not `role`.
    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.role.as_deref() != Some(role) {
            return Err(ApiError::Forbidden(format!("{role} role required")));
        }
        Ok(())
    }

    /// Rejects callers that do not own `execution`.
    pub fn ensure_owns(&self, execution: &TourExecution) -> Result<(), ApiError> {
        if execution.user_id != self.user_id {
            return Err(ApiError::Forbidden(
                "tour execution belongs to another user".to_string(),
            ));
        }
        Ok(())
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        Ok(Principal {
            user_id: UserId::new(user_id),
            role: header_value(parts, USER_ROLE_HEADER).map(str::to_string),
        })
    }
}

/// A caller with the tourist role.
#[derive(Debug, Clone)]
pub struct Tourist(pub Principal);

impl<S> FromRequestParts<S> for Tourist
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        principal.require_role(TOURIST_ROLE)?;
        Ok(Tourist(principal))
    }
}
