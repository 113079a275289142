//! Actor extraction from gateway-supplied identity headers.
//!
//! Authentication happens upstream; the gateway injects the authenticated
//! user's identity as `X-Actor-Id` and `X-Actor-Role`. Handlers use the
//! [`Actor`] extractor to get the acting user, their role, and the client
//! IP for audit logging.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Header carrying the authenticated user's id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the authenticated user's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The authenticated actor of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    /// The acting user's id.
    pub user_id: Uuid,
    /// The acting user's role, as asserted by the gateway.
    pub role: String,
    /// Client IP for audit logging, from `X-Forwarded-For` when present.
    pub ip_address: Option<String>,
}

impl Actor {
    /// True when the actor may decide requests and review reconciliations.
    #[must_use]
    pub fn is_officer(&self) -> bool {
        matches!(self.role.as_str(), "finance_officer" | "admin")
    }

    /// Requires a finance officer or admin role.
    ///
    /// # Errors
    ///
    /// Returns a 403 response for other roles.
    pub fn require_officer(&self) -> Result<(), Response> {
        if self.is_officer() {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "FORBIDDEN",
                    "message": "Finance officer role required"
                })),
            )
                .into_response())
        }
    }

    /// Requires the admin role (petty-cash account management).
    ///
    /// # Errors
    ///
    /// Returns a 403 response for other roles.
    pub fn require_admin(&self) -> Result<(), Response> {
        if self.role == "admin" {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "FORBIDDEN",
                    "message": "Admin role required"
                })),
            )
                .into_response())
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "UNAUTHORIZED",
                        "message": "Missing or malformed actor identity"
                    })),
                )
            })?;

        let role = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("employee")
            .to_string();

        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string());

        Ok(Self {
            user_id,
            role,
            ip_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: &str) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            ip_address: None,
        }
    }

    #[test]
    fn test_officer_roles() {
        assert!(actor("finance_officer").is_officer());
        assert!(actor("admin").is_officer());
        assert!(!actor("employee").is_officer());
    }

    #[test]
    fn test_require_officer() {
        assert!(actor("finance_officer").require_officer().is_ok());
        assert!(actor("employee").require_officer().is_err());
    }

    #[test]
    fn test_require_admin() {
        assert!(actor("admin").require_admin().is_ok());
        assert!(actor("finance_officer").require_admin().is_err());
    }
}
