//! # Request Throttling
//!
//! Two-tier rate limiting for the sale API. Read routes are cheap
//! shared-lock lookups; mutating routes serialize on the engine's write
//! lock and commit a snapshot to disk before replying, so they get a
//! separate, tighter quota.
//!
//! ## Configuration
//!
//! - `TESSEL_RATE_LIMIT`: read requests per second (default: 100, 0 disables)
//! - `TESSEL_WRITE_RATE_LIMIT`: mutating requests per second (default: 25,
//!   0 disables)

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default quota for read routes.
const DEFAULT_READ_RPS: u32 = 100;

/// Default quota for mutating routes.
const DEFAULT_WRITE_RPS: u32 = 25;

type DirectLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

// =============================================================================
// RATE LIMITS
// =============================================================================

/// Per-tier limiters shared across requests. A `None` tier is unlimited.
#[derive(Clone)]
pub struct SaleRateLimits {
    read: Option<DirectLimiter>,
    write: Option<DirectLimiter>,
}

impl SaleRateLimits {
    /// Build the limiters from `TESSEL_RATE_LIMIT` and
    /// `TESSEL_WRITE_RATE_LIMIT`.
    #[must_use]
    pub fn from_env() -> Self {
        let read_rps = env_quota("TESSEL_RATE_LIMIT", DEFAULT_READ_RPS);
        let write_rps = env_quota("TESSEL_WRITE_RATE_LIMIT", DEFAULT_WRITE_RPS);
        tracing::info!(read_rps, write_rps, "Request throttling configured");
        Self::new(read_rps, write_rps)
    }

    /// Build the limiters from explicit quotas. Zero disables a tier.
    #[must_use]
    pub fn new(read_rps: u32, write_rps: u32) -> Self {
        Self {
            read: build_limiter(read_rps),
            write: build_limiter(write_rps),
        }
    }

    /// Admit or refuse a request. Mutating methods draw from the write
    /// quota, everything else from the read quota.
    fn admit(&self, method: &Method) -> bool {
        let tier = if *method == Method::POST {
            &self.write
        } else {
            &self.read
        };
        match tier {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

fn build_limiter(rps: u32) -> Option<DirectLimiter> {
    NonZeroU32::new(rps).map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

fn env_quota(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Throttling middleware. Returns 429 when the tier's quota is exhausted.
pub async fn throttle_middleware(
    State(limits): State<SaleRateLimits>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limits.admit(request.method()) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            method = %request.method(),
            path = request.uri().path(),
            "Request throttled"
        );
        Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
    }
}

// =============================================================================
// TESTS
// =============================================================================
