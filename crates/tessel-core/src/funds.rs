//! # Native Value Book
//!
//! Bookkeeping for contributed native value. In the original execution
//! environment value moves implicitly with the call; here the engine keeps
//! an explicit per-account book so forwarded proceeds and the owner's
//! residual withdrawal are observable and exactly testable.

use crate::{AccountId, SaleError, Wei};
use std::collections::BTreeMap;

/// Per-account native value balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundsBook {
    balances: BTreeMap<AccountId, Wei>,
}

impl FundsBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from a list of balances (snapshot restore).
    #[must_use]
    pub fn from_balances(balances: Vec<(AccountId, Wei)>) -> Self {
        Self {
            balances: balances.into_iter().collect(),
        }
    }

    /// Current balance of `account` (zero if unknown).
    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> Wei {
        self.balances.get(&account).copied().unwrap_or(Wei::ZERO)
    }

    /// Credit `amount` to `account`.
    ///
    /// Fails on balance overflow with no change to the book.
    pub fn credit(&mut self, account: AccountId, amount: Wei) -> Result<(), SaleError> {
        let new_balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(SaleError::Overflow)?;
        self.balances.insert(account, new_balance);
        Ok(())
    }

    /// Undo a credit that was just applied.
    ///
    /// Invariant: only called with the exact amount credited earlier in the
    /// same operation, so the subtraction cannot underflow; saturation is a
    /// floor, not a rounding path.
    pub fn revert_credit(&mut self, account: AccountId, amount: Wei) {
        let balance = self.balance_of(account);
        self.balances
            .insert(account, Wei(balance.value().saturating_sub(amount.value())));
    }

    /// Move `account`'s entire balance to `to`, returning the moved amount.
    ///
    /// A zero balance moves zero and succeeds as a no-op.
    pub fn drain_into(&mut self, account: AccountId, to: AccountId) -> Result<Wei, SaleError> {
        let amount = self.balance_of(account);
        if amount == Wei::ZERO {
            return Ok(Wei::ZERO);
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(SaleError::Overflow)?;
        self.balances.insert(account, Wei::ZERO);
        self.balances.insert(to, credited);
        Ok(amount)
    }

    /// Iterate over all non-zero balances in account order.
    pub fn balances(&self) -> impl Iterator<Item = (AccountId, Wei)> + '_ {
        self.balances
            .iter()
            .filter(|(_, wei)| **wei != Wei::ZERO)
            .map(|(account, wei)| (*account, *wei))
    }
}

// =============================================================================
// TESTS
// =============================================================================
