//! # Sale Configuration File
//!
//! Deployment-time sale parameters, loaded from a TOML file at `init`.
//!
//! Amounts in the file are whole-ether integers (TOML has no 128-bit
//! integers); they are converted to wei on load. Time boundaries are unix
//! seconds.
//!
//! ```toml
//! start_time = 1767225600
//! end_time = 1769644800
//! phase1_start = 1767225600
//! phase2_start = 1767830400
//! phase3_start = 1769040000
//! postsale_start = 1769644800
//! cap_ether = 84000          # optional, defaults to the full-supply cap
//!
//! [accounts]
//! owner = 1
//! sale = 2
//! proceeds = 3
//! founder = 4
//! bounty = 5
//! future_reserve = 6
//! presale = 7
//! ```

use serde::Deserialize;
use std::path::Path;
use tessel_core::config::{DEFAULT_CAP, MINIMUM_CONTRIBUTION, PHASE_1_RATE};
use tessel_core::{AccountId, SaleConfig, SaleError, Timestamp, Wei};

// =============================================================================
// FILE SCHEMA
// =============================================================================

/// Account assignments for the fixed sale roles.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsSection {
    pub owner: u64,
    pub sale: u64,
    pub proceeds: u64,
    pub founder: u64,
    pub bounty: u64,
    pub future_reserve: u64,
    pub presale: u64,
}

/// The on-disk sale configuration schema.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleConfigFile {
    pub start_time: u64,
    pub end_time: u64,
    pub phase1_start: u64,
    pub phase2_start: u64,
    pub phase3_start: u64,
    pub postsale_start: u64,
    /// Fundraising cap in whole ether. Defaults to the cap that exhausts
    /// the sale supply at the phase 1 rate.
    pub cap_ether: Option<u64>,
    pub accounts: AccountsSection,
}

impl SaleConfigFile {
    /// Parse a config file from TOML text.
    pub fn parse(text: &str) -> Result<Self, SaleError> {
        toml::from_str(text).map_err(|e| SaleError::Configuration(e.to_string()))
    }

    /// Load and parse a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaleError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SaleError::Configuration(format!(
                "cannot read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    /// Convert to an engine configuration, validating it.
    pub fn into_sale_config(self) -> Result<SaleConfig, SaleError> {
        let config = SaleConfig {
            nominal_rate: PHASE_1_RATE,
            owner: AccountId(self.accounts.owner),
            sale_wallet: AccountId(self.accounts.sale),
            proceeds_wallet: AccountId(self.accounts.proceeds),
            founder_wallet: AccountId(self.accounts.founder),
            bounty_wallet: AccountId(self.accounts.bounty),
            future_wallet: AccountId(self.accounts.future_reserve),
            presale_wallet: AccountId(self.accounts.presale),
            start_time: Timestamp(self.start_time),
            end_time: Timestamp(self.end_time),
            phase1_start: Timestamp(self.phase1_start),
            phase2_start: Timestamp(self.phase2_start),
            phase3_start: Timestamp(self.phase3_start),
            postsale_start: Timestamp(self.postsale_start),
            cap: self.cap_ether.map_or(DEFAULT_CAP, Wei::from_ether),
            minimum_contribution: MINIMUM_CONTRIBUTION,
        };
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// TESTS
// =============================================================================
