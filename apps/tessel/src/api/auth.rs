//! # Access Control
//!
//! Request gating for the sale API. A single policy, resolved from the
//! environment when the router is built, decides three things per request:
//!
//! - `/health` is always reachable, for load balancer checks.
//! - When `TESSEL_API_KEY` is set, every other route requires the key in the
//!   `Authorization` header (`Bearer <key>` or the raw key).
//! - The owner settlement routes (`/sweep`, `/withdraw`) are refused outright
//!   when no key is configured: a settlement request names its caller, and
//!   without a shared key that claim is unverifiable.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Routes that drive owner-only settlement operations on the engine.
const OWNER_ROUTES: [&str; 2] = ["/sweep", "/withdraw"];

// =============================================================================
// ACCESS POLICY
// =============================================================================

/// Access policy for the sale API, fixed at router construction.
pub struct AccessPolicy {
    api_key: Option<String>,
}

impl AccessPolicy {
    /// Resolve the policy from `TESSEL_API_KEY`. An empty value counts as
    /// unset, which leaves the read and purchase routes open and the owner
    /// routes refused.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("TESSEL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self { api_key }
    }

    /// Whether requests must present the shared key.
    #[must_use]
    pub fn requires_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Whether the owner settlement routes are reachable at all.
    ///
    /// The engine still checks the caller account against the configured
    /// owner, but the account id in the request body is only trustworthy
    /// when the request also carried the shared key.
    #[must_use]
    pub fn owner_ops_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Constant-time key comparison. Both sides are padded to a common
    /// length so the comparison always covers the same number of bytes.
    fn key_matches(&self, provided: &str) -> bool {
        let Some(expected) = &self.api_key else {
            return false;
        };

        let provided_bytes = provided.as_bytes();
        let expected_bytes = expected.as_bytes();

        let max_len = provided_bytes.len().max(expected_bytes.len());
        let mut padded_provided = vec![0u8; max_len];
        let mut padded_expected = vec![0u8; max_len];
        padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
        padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

        let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
        bytes_match && provided_bytes.len() == expected_bytes.len()
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Access middleware applying the policy to every request.
pub async fn access_middleware(
    State(policy): State<Arc<AccessPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let path = request.uri().path();

    if path == "/health" {
        return Ok(next.run(request).await);
    }

    if OWNER_ROUTES.contains(&path) && !policy.owner_ops_enabled() {
        tracing::warn!(
            event = "access_refused",
            path,
            "Owner operation refused: no API key configured"
        );
        return Err(refusal(
            StatusCode::FORBIDDEN,
            "owner operations are disabled: no API key configured",
        ));
    }

    // Without a key the remaining routes are open.
    if !policy.requires_key() {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if policy.key_matches(key) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "access_refused",
                path,
                reason = "invalid_api_key",
                "Authentication failed: invalid API key"
            );
            Err(refusal(StatusCode::UNAUTHORIZED, "invalid API key"))
        }
        None => {
            tracing::warn!(
                event = "access_refused",
                path,
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err(refusal(
                StatusCode::UNAUTHORIZED,
                "missing Authorization header",
            ))
        }
    }
}

/// Refusal body in the same shape as the handlers' error responses, so
/// clients can parse every failure uniformly.
fn refusal(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
}

// =============================================================================
// TESTS
// =============================================================================
