//! # tessel-core
//!
//! The deterministic sale engine for Tessel - THE LOGIC.
//!
//! This crate implements a time-phased token sale: contributions are
//! accepted during defined time windows, converted to tokens at a rate that
//! changes across ordered phases, bounded by a hard fundraising cap, and
//! forwarded to a custodial proceeds wallet. After the sale, owner-restricted
//! settlement operations reclaim the unsold supply and residual funds.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where sale state exists (stage, raised total, books)
//! - Executes strictly serialized: each operation fully commits or fully
//!   reverts; no partial state is ever observable
//! - Has NO async, NO network dependencies (pure Rust)
//! - Reads time and the token ledger only through injected seams

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod funds;
pub mod ledger;
pub mod snapshot;
pub mod stage;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AccountId, LedgerError, SaleError, Timestamp, Tokens, WEI_PER_ETHER, Wei};

// =============================================================================
// RE-EXPORTS: Sale Engine
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SaleConfig;
pub use engine::{PurchaseReceipt, SaleEngine, SaleSnapshot};
pub use funds::FundsBook;
pub use ledger::{InMemoryLedger, TokenLedger};
pub use stage::{Stage, StageTransition};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use snapshot::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
pub use storage::RedbStore;
