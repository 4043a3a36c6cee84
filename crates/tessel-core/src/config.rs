//! # Sale Configuration
//!
//! Immutable parameters of a sale, fixed at construction. The only
//! configuration-time failure is `SaleError::Configuration`; once a
//! `SaleConfig` has passed validation, the engine never re-validates it.
//!
//! The fixed token allocations and rate schedule live here as constants.
//! They are properties of the sale design, not deployment knobs.

use crate::{AccountId, SaleError, Timestamp, Tokens, WEI_PER_ETHER, Wei};
use serde::{Deserialize, Serialize};

// =============================================================================
// RATE SCHEDULE
// =============================================================================

/// Tokens issued per wei during phase 1.
pub const PHASE_1_RATE: u128 = 1150;

/// Tokens issued per wei during phase 2.
pub const PHASE_2_RATE: u128 = 1100;

/// Tokens issued per wei during phase 3.
pub const PHASE_3_RATE: u128 = 1050;

// =============================================================================
// FIXED ALLOCATIONS
// =============================================================================

/// Tokens minted to the founder wallet at construction.
pub const FOUNDER_ALLOCATION: Tokens = Tokens::from_whole(100_000_000);

/// Tokens minted to the bounty wallet at construction.
pub const BOUNTY_ALLOCATION: Tokens = Tokens::from_whole(25_000_000);

/// Tokens minted to the future-reserve wallet at construction.
pub const FUTURE_RESERVE_ALLOCATION: Tokens = Tokens::from_whole(275_000_000);

/// Tokens minted to the presale wallet at construction.
pub const PRESALE_ALLOCATION: Tokens = Tokens::from_whole(3_000_000);

/// Sale supply minted to the engine's own custody account at construction.
pub const SALE_SUPPLY: Tokens = Tokens::from_whole(97_000_000);

/// Total supply after construction: all allocations plus the sale supply.
pub const TOTAL_SUPPLY: Tokens = Tokens::from_whole(500_000_000);

// =============================================================================
// PURCHASE LIMITS
// =============================================================================

/// Minimum accepted contribution: 0.01 ether. Dust below this is rejected.
pub const MINIMUM_CONTRIBUTION: Wei = Wei(WEI_PER_ETHER / 100);

/// Default fundraising cap: the wei intake that exhausts the sale supply at
/// the most generous (phase 1) rate.
pub const DEFAULT_CAP: Wei = Wei(SALE_SUPPLY.value() / PHASE_1_RATE);

// =============================================================================
// SALE CONFIG
// =============================================================================

/// Immutable sale parameters, validated once at engine construction.
///
/// Invariant: `phase1_start < phase2_start < phase3_start < postsale_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Nominal rate recorded at construction. Informational only; the
    /// active rate always comes from the stage rate table.
    pub nominal_rate: u128,

    /// Account that owns the sale and may invoke settlement operations.
    pub owner: AccountId,

    /// The engine's own custody account, holding the unsold sale supply.
    pub sale_wallet: AccountId,

    /// Account that receives forwarded contribution value.
    pub proceeds_wallet: AccountId,

    /// Founder allocation recipient.
    pub founder_wallet: AccountId,

    /// Bounty allocation recipient.
    pub bounty_wallet: AccountId,

    /// Future-reserve allocation recipient; also receives the unsold sale
    /// supply in the post-sale sweep.
    pub future_wallet: AccountId,

    /// Presale allocation recipient.
    pub presale_wallet: AccountId,

    /// First instant at which purchases are accepted.
    pub start_time: Timestamp,

    /// First instant at which purchases are no longer accepted.
    pub end_time: Timestamp,

    /// Phase 1 opens at this instant (inclusive).
    pub phase1_start: Timestamp,

    /// Phase 2 opens at this instant (inclusive).
    pub phase2_start: Timestamp,

    /// Phase 3 opens at this instant (inclusive).
    pub phase3_start: Timestamp,

    /// The sale is over at this instant (inclusive).
    pub postsale_start: Timestamp,

    /// Hard ceiling on cumulative raised value.
    pub cap: Wei,

    /// Minimum accepted contribution.
    pub minimum_contribution: Wei,
}

impl SaleConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SaleError::Configuration` if the phase boundaries are not
    /// strictly increasing, the sale window is empty, or any wallet is the
    /// null account.
    pub fn validate(&self) -> Result<(), SaleError> {
        if self.phase1_start >= self.phase2_start
            || self.phase2_start >= self.phase3_start
            || self.phase3_start >= self.postsale_start
        {
            return Err(SaleError::Configuration(
                "phase boundaries must be strictly increasing".to_string(),
            ));
        }
        if self.start_time >= self.end_time {
            return Err(SaleError::Configuration(
                "start_time must precede end_time".to_string(),
            ));
        }
        let wallets = [
            ("owner", self.owner),
            ("sale_wallet", self.sale_wallet),
            ("proceeds_wallet", self.proceeds_wallet),
            ("founder_wallet", self.founder_wallet),
            ("bounty_wallet", self.bounty_wallet),
            ("future_wallet", self.future_wallet),
            ("presale_wallet", self.presale_wallet),
        ];
        for (name, wallet) in wallets {
            if wallet.is_null() {
                return Err(SaleError::Configuration(format!(
                    "{name} must not be the null account"
                )));
            }
        }
        if self.cap == Wei::ZERO {
            return Err(SaleError::Configuration(
                "cap must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
