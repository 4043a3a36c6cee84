//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Monetary amounts cross the wire as raw integers: wei and token base
//! units, never ether or whole tokens. Conversions are the client's job.

use serde::{Deserialize, Serialize};
use tessel_core::PurchaseReceipt;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Sale status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stage: String,
    pub next_stage: Option<String>,
    pub rate: u128,
    pub accepts_purchases: bool,
    pub wei_raised: u128,
    pub cap: u128,
    pub token_supply: u128,
    pub unsold_supply: u128,
}

// =============================================================================
// STAGE RESPONSE
// =============================================================================

/// Current stage response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResponse {
    pub stage: String,
    pub rate: u128,
    pub accepts_purchases: bool,
}

/// Stage refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub changed: bool,
    pub from: Option<String>,
    pub stage: String,
}

// =============================================================================
// RATE RESPONSE
// =============================================================================

/// Current rate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateResponse {
    pub stage: String,
    pub rate: u128,
}

// =============================================================================
// PURCHASE REQUEST/RESPONSE
// =============================================================================

/// Token purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub beneficiary: u64,
    pub amount_wei: u128,
}

/// Token purchase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub beneficiary: Option<u64>,
    pub contribution_wei: Option<u128>,
    pub tokens_issued: Option<u128>,
    pub stage: Option<String>,
    pub wei_raised: Option<u128>,
    pub error: Option<String>,
}

impl PurchaseResponse {
    pub fn success(receipt: &PurchaseReceipt) -> Self {
        Self {
            success: true,
            beneficiary: Some(receipt.beneficiary.0),
            contribution_wei: Some(receipt.contribution.value()),
            tokens_issued: Some(receipt.tokens_issued.value()),
            stage: Some(receipt.stage.name().to_string()),
            wei_raised: Some(receipt.wei_raised.value()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            beneficiary: None,
            contribution_wei: None,
            tokens_issued: None,
            stage: None,
            wei_raised: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SETTLEMENT REQUEST/RESPONSE
// =============================================================================

/// Owner-restricted settlement request: the caller claims this identity and
/// the engine checks it against the configured owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub caller: u64,
}

/// Unsold-supply sweep response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub success: bool,
    pub swept_tokens: Option<u128>,
    pub error: Option<String>,
}

impl SweepResponse {
    pub fn success(swept: u128) -> Self {
        Self {
            success: true,
            swept_tokens: Some(swept),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            swept_tokens: None,
            error: Some(msg.into()),
        }
    }
}

/// Residual funds withdrawal response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub success: bool,
    pub withdrawn_wei: Option<u128>,
    pub error: Option<String>,
}

impl WithdrawResponse {
    pub fn success(withdrawn: u128) -> Self {
        Self {
            success: true,
            withdrawn_wei: Some(withdrawn),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            withdrawn_wei: None,
            error: Some(msg.into()),
        }
    }
}
