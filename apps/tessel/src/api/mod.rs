//! # Tessel HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Sale status (stage, raised total, cap, supply)
//! - `GET /stage` - Current stage and rate
//! - `GET /rate` - Current rate
//! - `POST /stage/refresh` - Refresh the stage from the clock
//! - `POST /purchase` - Purchase tokens
//! - `POST /sweep` - Sweep unsold supply (owner)
//! - `POST /withdraw` - Withdraw residual funds (owner)
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `TESSEL_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `TESSEL_RATE_LIMIT`: Read requests per second (default: 100, 0 to disable)
//! - `TESSEL_WRITE_RATE_LIMIT`: Mutating requests per second (default: 25, 0 to disable)
//! - `TESSEL_API_KEY`: If set, requires Bearer token authentication. The
//!   owner settlement endpoints are refused entirely when no key is set.

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::AccessPolicy;
pub use middleware::SaleRateLimits;
// Re-export handlers and types for integration tests (via `tessel::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    health_handler, purchase_handler, rate_handler, refresh_handler, stage_handler,
    status_handler, sweep_handler, withdraw_handler,
};
#[allow(unused_imports)]
pub use types::{
    HealthResponse, PurchaseRequest, PurchaseResponse, RateResponse, RefreshResponse,
    SettlementRequest, StageResponse, StatusResponse, SweepResponse, WithdrawResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tessel_core::{InMemoryLedger, RedbStore, SaleEngine, SaleError};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the sale engine.
#[derive(Clone)]
pub struct AppState {
    /// The sale engine. All mutation goes through the write lock, which is
    /// what serializes external calls.
    pub engine: Arc<RwLock<SaleEngine<InMemoryLedger>>>,

    /// Snapshot store; `None` runs the server without persistence.
    pub store: Option<Arc<RedbStore>>,
}

impl AppState {
    /// Create new app state without persistence.
    #[must_use]
    pub fn new(engine: SaleEngine<InMemoryLedger>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            store: None,
        }
    }

    /// Create new app state backed by a snapshot store.
    #[must_use]
    pub fn with_store(engine: SaleEngine<InMemoryLedger>, store: Arc<RedbStore>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            store: Some(store),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads the `TESSEL_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("TESSEL_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (TESSEL_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in TESSEL_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No TESSEL_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Throttling - two-tier read/write rate limiting
/// 4. Access control - API key and owner-route gating
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();
    let limits = SaleRateLimits::from_env();

    let policy = Arc::new(AccessPolicy::from_env());
    if policy.requires_key() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - read endpoints and purchases are \
             publicly accessible, and owner settlement endpoints are refused. \
             Set TESSEL_API_KEY to enable them."
        );
    }

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/stage", get(handlers::stage_handler))
        .route("/stage/refresh", post(handlers::refresh_handler))
        .route("/rate", get(handlers::rate_handler))
        .route("/purchase", post(handlers::purchase_handler))
        .route("/sweep", post(handlers::sweep_handler))
        .route("/withdraw", post(handlers::withdraw_handler))
        // Access control is innermost so it runs after throttling.
        .layer(axum_middleware::from_fn_with_state(
            policy,
            auth::access_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            limits,
            middleware::throttle_middleware,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SaleError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SaleError::Storage(format!("Bind failed: {}", e)))?;

    tracing::info!("Tessel HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| SaleError::Storage(format!("Server error: {}", e)))
}
