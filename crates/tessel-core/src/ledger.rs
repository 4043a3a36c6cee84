//! # Token Ledger
//!
//! The fungible token ledger is an external collaborator. The engine
//! consumes it through the [`TokenLedger`] trait and treats every call as a
//! possibly-failing atomic operation: a failed mint or transfer unwinds the
//! enclosing sale operation.
//!
//! [`InMemoryLedger`] is the reference implementation used by the binary
//! and the tests. It keeps balances in a `BTreeMap` for deterministic
//! iteration and uses checked arithmetic throughout.

use crate::{AccountId, LedgerError, Tokens};
use std::collections::BTreeMap;

// =============================================================================
// LEDGER TRAIT
// =============================================================================

/// Interface to the external token ledger.
///
/// Each method either fully applies or leaves the ledger untouched; the
/// engine relies on that to keep its own all-or-nothing discipline.
pub trait TokenLedger {
    /// Mint `amount` new tokens to `to`, growing the total supply.
    fn mint(&mut self, to: AccountId, amount: Tokens) -> Result<(), LedgerError>;

    /// Transfer `amount` tokens from `from` to `to`.
    ///
    /// A zero-amount transfer succeeds as a no-op.
    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Tokens,
    ) -> Result<(), LedgerError>;

    /// Current balance of `account` (zero if unknown).
    fn balance_of(&self, account: AccountId) -> Tokens;

    /// Total tokens in existence.
    fn total_supply(&self) -> Tokens;
}

// =============================================================================
// IN-MEMORY LEDGER
// =============================================================================

/// Reference ledger over a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    balances: BTreeMap<AccountId, Tokens>,
    total_supply: Tokens,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a list of balances and a recorded supply.
    ///
    /// Used when restoring a persisted sale snapshot.
    #[must_use]
    pub fn from_balances(balances: Vec<(AccountId, Tokens)>, total_supply: Tokens) -> Self {
        Self {
            balances: balances.into_iter().collect(),
            total_supply,
        }
    }

    /// Iterate over all non-zero balances in account order.
    pub fn balances(&self) -> impl Iterator<Item = (AccountId, Tokens)> + '_ {
        self.balances
            .iter()
            .filter(|(_, tokens)| !tokens.is_zero())
            .map(|(account, tokens)| (*account, *tokens))
    }
}

impl TokenLedger for InMemoryLedger {
    fn mint(&mut self, to: AccountId, amount: Tokens) -> Result<(), LedgerError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self.balances.entry(to).or_insert(Tokens::ZERO);
        let new_balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;

        *balance = new_balance;
        self.total_supply = new_supply;
        Ok(())
    }

    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Tokens,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }

        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            })?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        // Both sides validated; commit.
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }

    fn balance_of(&self, account: AccountId) -> Tokens {
        self.balances.get(&account).copied().unwrap_or(Tokens::ZERO)
    }

    fn total_supply(&self) -> Tokens {
        self.total_supply
    }
}

// =============================================================================
// TESTS
// =============================================================================
