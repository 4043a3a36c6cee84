//! # Time Source
//!
//! The sale engine never reads an ambient clock. Time is an injected seam so
//! stage advancement can be driven deterministically in tests and simulated
//! environments.

use crate::Timestamp;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// CLOCK TRAIT
// =============================================================================

/// A source of the current time.
///
/// Implementations must be cheap to call; the engine reads the clock once
/// per externally invoked operation.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

// =============================================================================
// SYSTEM CLOCK
// =============================================================================

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }
}

// =============================================================================
// MANUAL CLOCK
// =============================================================================

/// A manually advanced clock for tests and simulation.
///
/// Clones share the same underlying instant, so a handle kept outside the
/// engine can advance time for a clock the engine owns.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock starting at the given time.
    #[must_use]
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.0)),
        }
    }

    /// Set the clock to an absolute time.
    ///
    /// The engine tolerates time moving backwards (the stage never
    /// regresses), so no ordering is enforced here.
    pub fn set(&self, to: Timestamp) {
        self.now.store(to.0, Ordering::SeqCst);
    }

    /// Advance the clock by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

// =============================================================================
// TESTS
// =============================================================================
