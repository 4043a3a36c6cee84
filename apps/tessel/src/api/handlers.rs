//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Mutating handlers take the write lock, drive the engine, and persist a
//! snapshot before replying, so a crash after a 200 never loses the
//! acknowledged state.

use super::{
    AppState,
    types::{
        HealthResponse, PurchaseRequest, PurchaseResponse, RateResponse, RefreshResponse,
        SettlementRequest, StageResponse, StatusResponse, SweepResponse, WithdrawResponse,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tessel_core::{
    AccountId, InMemoryLedger, SaleEngine, SaleError, TokenLedger, Wei,
};

/// HTTP status for an engine rejection.
fn rejection_status(error: &SaleError) -> StatusCode {
    match error {
        SaleError::Unauthorized => StatusCode::FORBIDDEN,
        SaleError::Storage(_) | SaleError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Persist the engine state if a store is configured.
fn persist(state: &AppState, engine: &SaleEngine<InMemoryLedger>) -> Result<(), SaleError> {
    if let Some(store) = &state.store {
        store.save(&engine.snapshot())?;
    }
    Ok(())
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get sale status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    let stage = engine.stage();

    let response = StatusResponse {
        stage: stage.name().to_string(),
        next_stage: stage.next().map(|s| s.name().to_string()),
        rate: stage.rate(),
        accepts_purchases: stage.accepts_purchases(),
        wei_raised: engine.wei_raised().value(),
        cap: engine.config().cap.value(),
        token_supply: engine.ledger().total_supply().value(),
        unsold_supply: engine
            .ledger()
            .balance_of(engine.config().sale_wallet)
            .value(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// STAGE HANDLERS
// =============================================================================

/// Get the current stage, as last refreshed.
pub async fn stage_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    let stage = engine.stage();

    let response = StageResponse {
        stage: stage.name().to_string(),
        rate: stage.rate(),
        accepts_purchases: stage.accepts_purchases(),
    };

    (StatusCode::OK, Json(response))
}

/// Refresh the stage from the clock.
pub async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut engine = state.engine.write().await;
    let transition = engine.set_current_stage();

    if transition.is_some() {
        if let Err(e) = persist(&state, &engine) {
            tracing::error!("Persist after stage refresh failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RefreshResponse {
                    changed: false,
                    from: None,
                    stage: engine.stage().name().to_string(),
                }),
            );
        }
    }

    let response = RefreshResponse {
        changed: transition.is_some(),
        from: transition.map(|t| t.from.name().to_string()),
        stage: engine.stage().name().to_string(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// RATE HANDLER
// =============================================================================

/// Get the current rate.
pub async fn rate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;

    let response = RateResponse {
        stage: engine.stage().name().to_string(),
        rate: engine.current_rate(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// PURCHASE HANDLER
// =============================================================================

/// Purchase tokens.
pub async fn purchase_handler(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.write().await;

    let receipt = match engine.buy_tokens(
        AccountId(request.beneficiary),
        Wei::new(request.amount_wei),
    ) {
        Ok(receipt) => receipt,
        Err(e) => {
            return (
                rejection_status(&e),
                Json(PurchaseResponse::error(e.to_string())),
            );
        }
    };

    if let Err(e) = persist(&state, &engine) {
        tracing::error!("Persist after purchase failed: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PurchaseResponse::error(e.to_string())),
        );
    }

    tracing::info!(
        beneficiary = receipt.beneficiary.0,
        contribution = %receipt.contribution,
        tokens = %receipt.tokens_issued,
        stage = receipt.stage.name(),
        "Purchase accepted"
    );

    (StatusCode::OK, Json(PurchaseResponse::success(&receipt)))
}

// =============================================================================
// SETTLEMENT HANDLERS
// =============================================================================

/// Sweep the unsold supply to the future-reserve wallet.
///
/// The access layer refuses this route when no API key is configured; by
/// the time the handler runs, the caller claim in the body is backed by
/// the shared key.
pub async fn sweep_handler(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.write().await;
    let swept = match engine.retrieve_remaining_coins_post_sale(AccountId(request.caller)) {
        Ok(swept) => swept,
        Err(e) => {
            return (
                rejection_status(&e),
                Json(SweepResponse::error(e.to_string())),
            );
        }
    };

    if let Err(e) = persist(&state, &engine) {
        tracing::error!("Persist after sweep failed: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SweepResponse::error(e.to_string())),
        );
    }

    tracing::info!(swept = %swept, "Unsold supply swept to future reserve");
    (StatusCode::OK, Json(SweepResponse::success(swept.value())))
}

/// Withdraw the residual funds balance to the owner.
///
/// Gated by the access layer the same way as the sweep.
pub async fn withdraw_handler(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> impl IntoResponse {
    let mut engine = state.engine.write().await;
    let withdrawn = match engine.retrieve_funds(AccountId(request.caller)) {
        Ok(withdrawn) => withdrawn,
        Err(e) => {
            return (
                rejection_status(&e),
                Json(WithdrawResponse::error(e.to_string())),
            );
        }
    };

    if let Err(e) = persist(&state, &engine) {
        tracing::error!("Persist after withdrawal failed: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(WithdrawResponse::error(e.to_string())),
        );
    }

    tracing::info!(withdrawn = %withdrawn, "Residual funds withdrawn");
    (
        StatusCode::OK,
        Json(WithdrawResponse::success(withdrawn.value())),
    )
}
