//! # Core Type Definitions
//!
//! This module contains the value types shared across the sale engine:
//! - Account identity (`AccountId`)
//! - Money and token quantities (`Wei`, `Tokens`)
//! - Time (`Timestamp`)
//! - Error types (`SaleError`, `LedgerError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use checked arithmetic for quantities; any overflow is a rejection,
//!   never a wrap

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ACCOUNT IDENTITY
// =============================================================================

/// Unique identifier for an account known to the sale.
///
/// Account `0` is the null account and is never a valid beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl AccountId {
    /// The null account. Purchases naming it as beneficiary are rejected.
    pub const NULL: AccountId = AccountId(0);

    /// Check whether this is the null account.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account:{}", self.0)
    }
}

// =============================================================================
// MONEY & TOKEN QUANTITIES
// =============================================================================

/// Number of wei in one ether (10^18).
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Contribution value in wei (10^-18 ether).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Wei(pub u128);

impl Wei {
    /// Zero wei.
    pub const ZERO: Wei = Wei(0);

    /// Create a new wei amount.
    #[must_use]
    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Create a wei amount from a whole number of ether.
    #[must_use]
    pub const fn from_ether(ether: u64) -> Self {
        Self(ether as u128 * WEI_PER_ETHER)
    }

    /// Get the raw wei value.
    #[must_use]
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Checked addition. `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Wei) -> Option<Wei> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Wei(sum)),
            None => None,
        }
    }

    /// Checked subtraction. `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, other: Wei) -> Option<Wei> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Wei(diff)),
            None => None,
        }
    }

    /// Convert a contribution to tokens at a per-wei rate. `None` on overflow.
    #[must_use]
    pub const fn to_tokens(self, rate: u128) -> Option<Tokens> {
        match self.0.checked_mul(rate) {
            Some(tokens) => Some(Tokens(tokens)),
            None => None,
        }
    }
}

impl std::fmt::Display for Wei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

/// Token amount in base units (10^-18 whole tokens).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Tokens(pub u128);

impl Tokens {
    /// Zero tokens.
    pub const ZERO: Tokens = Tokens(0);

    /// Create a new token amount in base units.
    #[must_use]
    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Create a token amount from a whole number of tokens.
    #[must_use]
    pub const fn from_whole(tokens: u64) -> Self {
        Self(tokens as u128 * WEI_PER_ETHER)
    }

    /// Get the raw base-unit value.
    #[must_use]
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Check whether this amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Tokens) -> Option<Tokens> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Tokens(sum)),
            None => None,
        }
    }

    /// Checked subtraction. `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, other: Tokens) -> Option<Tokens> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Tokens(diff)),
            None => None,
        }
    }
}

impl std::fmt::Display for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} token units", self.0)
    }
}

// =============================================================================
// TIME
// =============================================================================

/// A point in time, in seconds since the unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp from unix seconds.
    #[must_use]
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the raw unix-seconds value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Timestamp offset forward by `secs` seconds, saturating at the maximum.
    #[must_use]
    pub const fn plus(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t+{}", self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the token ledger.
///
/// Every ledger failure unwinds the enclosing sale operation; the engine
/// never commits a partial purchase on top of a failed ledger call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The source account does not hold enough tokens for a transfer.
    #[error("insufficient balance in {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        required: Tokens,
        available: Tokens,
    },

    /// Minting or transferring would overflow a balance or the total supply.
    #[error("token arithmetic overflow")]
    Overflow,

    /// The ledger refused the operation for a reason of its own.
    #[error("ledger refused: {0}")]
    Refused(String),
}

/// Errors that can occur in the sale engine.
///
/// - No silent failures, no partial success
/// - Every precondition is checked before any side effect
/// - Use `Result<T, SaleError>` for fallible operations; the engine never panics
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleError {
    /// The sale configuration is invalid. Detected at construction only.
    #[error("invalid sale configuration: {0}")]
    Configuration(String),

    /// The call occurred outside the sale window, or the stage does not
    /// admit the operation.
    #[error("sale window is closed")]
    WindowClosed,

    /// The contribution is below the minimum floor. Dust is rejected
    /// outright, never rounded.
    #[error("contribution {amount} below minimum {minimum}")]
    BelowMinimum { amount: Wei, minimum: Wei },

    /// The contribution would push the cumulative raised total past the cap.
    /// Rejected in full; there is no partial fill.
    #[error("contribution {attempted} would exceed cap {cap} (raised so far: {raised})")]
    CapExceeded {
        raised: Wei,
        attempted: Wei,
        cap: Wei,
    },

    /// The caller is not the sale owner.
    #[error("caller is not the sale owner")]
    Unauthorized,

    /// The purchase named the null account as beneficiary.
    #[error("beneficiary is the null account")]
    NullBeneficiary,

    /// Integer arithmetic overflowed. The operation is rejected whole.
    #[error("arithmetic overflow")]
    Overflow,

    /// An underlying ledger call failed; the enclosing operation was
    /// rolled back.
    #[error("ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    /// A persistence-layer error occurred.
    #[error("storage error: {0}")]
    Storage(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// TESTS
// =============================================================================
