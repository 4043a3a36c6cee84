//! # Sale Stages
//!
//! The sale's lifecycle is a small closed enumeration with a total order:
//!
//! | Stage    | Opens at         | Rate (tokens/wei) | Purchases |
//! |----------|------------------|-------------------|-----------|
//! | PreSale  | construction     | 0                 | rejected  |
//! | Phase1   | `phase1_start`   | 1150              | accepted  |
//! | Phase2   | `phase2_start`   | 1100              | accepted  |
//! | Phase3   | `phase3_start`   | 1050              | accepted  |
//! | PostSale | `postsale_start` | 0                 | rejected  |
//!
//! The current stage only ever advances forward; advancement is idempotent.
//! Boundaries are inclusive lower bounds, so at an exact boundary instant
//! the later stage wins.

use crate::config::{PHASE_1_RATE, PHASE_2_RATE, PHASE_3_RATE, SaleConfig};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// The sale's current phase.
///
/// The derived `Ord` is the lifecycle order; the engine relies on it for
/// the monotonic-advance guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Before the public sale opens. No conversion rate is active.
    PreSale,
    /// First public phase, most generous rate.
    Phase1,
    /// Second public phase.
    Phase2,
    /// Final public phase.
    Phase3,
    /// After the sale. No conversion rate is active; settlement only.
    PostSale,
}

impl Stage {
    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PreSale => "Pre-Sale",
            Stage::Phase1 => "Phase 1",
            Stage::Phase2 => "Phase 2",
            Stage::Phase3 => "Phase 3",
            Stage::PostSale => "Post-Sale",
        }
    }

    /// Tokens issued per wei while this stage is current.
    ///
    /// `PreSale` and `PostSale` map to 0: no public conversion is active.
    #[must_use]
    pub const fn rate(&self) -> u128 {
        match self {
            Stage::PreSale | Stage::PostSale => 0,
            Stage::Phase1 => PHASE_1_RATE,
            Stage::Phase2 => PHASE_2_RATE,
            Stage::Phase3 => PHASE_3_RATE,
        }
    }

    /// Check whether purchases are accepted in this stage.
    #[must_use]
    pub const fn accepts_purchases(&self) -> bool {
        matches!(self, Stage::Phase1 | Stage::Phase2 | Stage::Phase3)
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::PreSale => Some(Stage::Phase1),
            Stage::Phase1 => Some(Stage::Phase2),
            Stage::Phase2 => Some(Stage::Phase3),
            Stage::Phase3 => Some(Stage::PostSale),
            Stage::PostSale => None,
        }
    }

    /// Check if this stage is terminal (PostSale).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::PostSale)
    }

    /// The stage the schedule prescribes at `now`.
    ///
    /// Pure function of time and the phase boundaries; the engine combines
    /// it with the never-go-backward rule. Boundaries are inclusive, later
    /// phase wins.
    #[must_use]
    pub fn scheduled_at(now: Timestamp, config: &SaleConfig) -> Stage {
        if now >= config.postsale_start {
            Stage::PostSale
        } else if now >= config.phase3_start {
            Stage::Phase3
        } else if now >= config.phase2_start {
            Stage::Phase2
        } else if now >= config.phase1_start {
            Stage::Phase1
        } else {
            Stage::PreSale
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// STAGE TRANSITION
// =============================================================================

/// A single observed stage advancement.
///
/// The engine yields at most one transition per refresh; re-refreshing with
/// no time advance yields none, which is how duplicate transition events
/// are ruled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Stage before the refresh.
    pub from: Stage,
    /// Stage after the refresh. Always strictly greater than `from`.
    pub to: Stage,
}

// =============================================================================
// TESTS
// =============================================================================
