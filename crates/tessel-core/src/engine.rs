//! # Sale Engine
//!
//! The engine owns the current [`Stage`] and the cumulative raised total,
//! validates incoming contributions, computes token issuance from the stage
//! rate table, forwards value to the proceeds wallet, and implements the two
//! owner-restricted post-sale settlement operations.
//!
//! ## Atomicity
//!
//! Execution is strictly serialized: each operation runs to completion or
//! fails entirely. Every precondition is checked before any side effect, and
//! the one mid-operation failure point (the ledger mint) explicitly rolls
//! back the proceeds credit that preceded it. No partial state is ever
//! observable.

use crate::clock::Clock;
use crate::config::{
    BOUNTY_ALLOCATION, FOUNDER_ALLOCATION, FUTURE_RESERVE_ALLOCATION, PRESALE_ALLOCATION,
    SALE_SUPPLY, SaleConfig,
};
use crate::funds::FundsBook;
use crate::ledger::{InMemoryLedger, TokenLedger};
use crate::stage::{Stage, StageTransition};
use crate::types::{AccountId, SaleError, Tokens, Wei};
use serde::{Deserialize, Serialize};

// =============================================================================
// PURCHASE RECEIPT
// =============================================================================

/// The observable outcome of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Account the tokens were issued to.
    pub beneficiary: AccountId,
    /// Value accepted, already forwarded to the proceeds wallet.
    pub contribution: Wei,
    /// Tokens minted to the beneficiary.
    pub tokens_issued: Tokens,
    /// Stage the purchase executed in.
    pub stage: Stage,
    /// Cumulative raised total after this purchase.
    pub wei_raised: Wei,
}

// =============================================================================
// SALE SNAPSHOT
// =============================================================================

/// Complete persistable engine state.
///
/// The configuration is not part of the snapshot; it is immutable and
/// supplied again on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    /// Current stage.
    pub stage: Stage,
    /// Cumulative raised total.
    pub wei_raised: Wei,
    /// All non-zero token balances, in account order.
    pub token_balances: Vec<(AccountId, Tokens)>,
    /// Total token supply.
    pub token_supply: Tokens,
    /// All non-zero native value balances, in account order.
    pub fund_balances: Vec<(AccountId, Wei)>,
}

// =============================================================================
// SALE ENGINE
// =============================================================================

/// The sale engine.
///
/// Generic over the token ledger so the external ledger service can be
/// swapped; the clock is boxed since only one is ever live per engine.
pub struct SaleEngine<L: TokenLedger> {
    config: SaleConfig,
    ledger: L,
    clock: Box<dyn Clock>,
    stage: Stage,
    wei_raised: Wei,
    funds: FundsBook,
}

impl<L: TokenLedger> std::fmt::Debug for SaleEngine<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleEngine")
            .field("stage", &self.stage)
            .field("wei_raised", &self.wei_raised)
            .finish_non_exhaustive()
    }
}

impl<L: TokenLedger> SaleEngine<L> {
    /// Construct a sale: validate the configuration and mint the fixed
    /// allocations plus the sale supply, all in one step.
    ///
    /// # Errors
    ///
    /// Returns `SaleError::Configuration` if the phase boundaries are not
    /// strictly increasing (or any other config invariant fails), and
    /// propagates any ledger failure from the initial minting.
    pub fn new(config: SaleConfig, mut ledger: L, clock: Box<dyn Clock>) -> Result<Self, SaleError> {
        config.validate()?;

        ledger.mint(config.founder_wallet, FOUNDER_ALLOCATION)?;
        ledger.mint(config.bounty_wallet, BOUNTY_ALLOCATION)?;
        ledger.mint(config.future_wallet, FUTURE_RESERVE_ALLOCATION)?;
        ledger.mint(config.presale_wallet, PRESALE_ALLOCATION)?;
        ledger.mint(config.sale_wallet, SALE_SUPPLY)?;

        Ok(Self {
            config,
            ledger,
            clock,
            stage: Stage::PreSale,
            wei_raised: Wei::ZERO,
            funds: FundsBook::new(),
        })
    }

    // =========================================================================
    // READ SURFACE
    // =========================================================================

    /// The immutable sale configuration.
    #[must_use]
    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    /// The current stage, as last refreshed.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Cumulative value raised so far.
    #[must_use]
    pub fn wei_raised(&self) -> Wei {
        self.wei_raised
    }

    /// Rate table lookup keyed by the current stage.
    ///
    /// Meaningful only after [`Self::set_current_stage`] was applied in the
    /// same logical step; a stale stage yields a stale rate.
    #[must_use]
    pub fn current_rate(&self) -> u128 {
        self.stage.rate()
    }

    /// Read access to the token ledger.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Read access to the native value book.
    #[must_use]
    pub fn funds(&self) -> &FundsBook {
        &self.funds
    }

    // =========================================================================
    // STAGE CONTROLLER
    // =========================================================================

    /// Refresh the stage from the clock.
    ///
    /// Idempotent and monotonic: the stage only ever advances toward the
    /// schedule, never backward, and a refresh with no time advance returns
    /// `None` and mutates nothing. Cannot fail.
    pub fn set_current_stage(&mut self) -> Option<StageTransition> {
        let scheduled = Stage::scheduled_at(self.clock.now(), &self.config);
        if scheduled > self.stage {
            let transition = StageTransition {
                from: self.stage,
                to: scheduled,
            };
            self.stage = scheduled;
            Some(transition)
        } else {
            None
        }
    }

    // =========================================================================
    // PURCHASE PATH
    // =========================================================================

    /// Purchase tokens for `beneficiary` with an attached `amount` of value.
    ///
    /// All preconditions are checked before any side effect; a rejection
    /// leaves the beneficiary balance, the proceeds wallet, and the raised
    /// total exactly unchanged. On success the value is forwarded to the
    /// proceeds wallet, `amount x rate` tokens are minted to the
    /// beneficiary, and the raised total grows by `amount` — all or nothing.
    pub fn buy_tokens(
        &mut self,
        beneficiary: AccountId,
        amount: Wei,
    ) -> Result<PurchaseReceipt, SaleError> {
        if beneficiary.is_null() {
            return Err(SaleError::NullBeneficiary);
        }

        let now = self.clock.now();
        if now < self.config.start_time || now >= self.config.end_time {
            return Err(SaleError::WindowClosed);
        }

        if amount < self.config.minimum_contribution {
            return Err(SaleError::BelowMinimum {
                amount,
                minimum: self.config.minimum_contribution,
            });
        }

        let _ = self.set_current_stage();
        if !self.stage.accepts_purchases() {
            return Err(SaleError::WindowClosed);
        }

        let new_raised = self
            .wei_raised
            .checked_add(amount)
            .ok_or(SaleError::Overflow)?;
        if new_raised > self.config.cap {
            return Err(SaleError::CapExceeded {
                raised: self.wei_raised,
                attempted: amount,
                cap: self.config.cap,
            });
        }

        let tokens = amount
            .to_tokens(self.stage.rate())
            .ok_or(SaleError::Overflow)?;

        // Effects, in observable order: value transfer, issuance, counter.
        self.funds.credit(self.config.proceeds_wallet, amount)?;
        if let Err(ledger_err) = self.ledger.mint(beneficiary, tokens) {
            // A failed mint unwinds the value transfer too.
            self.funds.revert_credit(self.config.proceeds_wallet, amount);
            return Err(ledger_err.into());
        }
        self.wei_raised = new_raised;

        Ok(PurchaseReceipt {
            beneficiary,
            contribution: amount,
            tokens_issued: tokens,
            stage: self.stage,
            wei_raised: self.wei_raised,
        })
    }

    /// A bare value send with no explicit beneficiary: identical to
    /// `buy_tokens(caller, amount)`.
    pub fn contribute(
        &mut self,
        caller: AccountId,
        amount: Wei,
    ) -> Result<PurchaseReceipt, SaleError> {
        self.buy_tokens(caller, amount)
    }

    // =========================================================================
    // POST-SALE SETTLEMENT
    // =========================================================================

    /// Sweep the engine's unsold token balance to the future-reserve wallet.
    ///
    /// Owner only, and only once the stage (after an implicit refresh) is
    /// `PostSale`. A repeat call finds a zero balance and succeeds as a
    /// no-op, transferring zero.
    ///
    /// Purchases mint to the beneficiary and never draw down the custody
    /// balance, so the sweep moves the full sale supply regardless of how
    /// much was sold. Total supply after the sweep is the initial supply
    /// plus everything issued to buyers.
    pub fn retrieve_remaining_coins_post_sale(
        &mut self,
        caller: AccountId,
    ) -> Result<Tokens, SaleError> {
        if caller != self.config.owner {
            return Err(SaleError::Unauthorized);
        }

        let _ = self.set_current_stage();
        if self.stage != Stage::PostSale {
            return Err(SaleError::WindowClosed);
        }

        let remaining = self.ledger.balance_of(self.config.sale_wallet);
        self.ledger
            .transfer(self.config.sale_wallet, self.config.future_wallet, remaining)?;
        Ok(remaining)
    }

    /// Withdraw the engine's residual native value balance to the owner.
    ///
    /// Proceeds are forwarded at purchase time, so this balance is normally
    /// zero; the operation exists as an owner safety-valve and is not
    /// stage-gated.
    pub fn retrieve_funds(&mut self, caller: AccountId) -> Result<Wei, SaleError> {
        if caller != self.config.owner {
            return Err(SaleError::Unauthorized);
        }
        self.funds
            .drain_into(self.config.sale_wallet, self.config.owner)
    }
}

// =============================================================================
// SNAPSHOT / RESTORE (in-memory ledger only)
// =============================================================================

impl SaleEngine<InMemoryLedger> {
    /// Capture the complete mutable state for persistence.
    #[must_use]
    pub fn snapshot(&self) -> SaleSnapshot {
        SaleSnapshot {
            stage: self.stage,
            wei_raised: self.wei_raised,
            token_balances: self.ledger.balances().collect(),
            token_supply: self.ledger.total_supply(),
            fund_balances: self.funds.balances().collect(),
        }
    }

    /// Rebuild an engine from a persisted snapshot.
    ///
    /// Validates the configuration but does not re-mint allocations; the
    /// snapshot's balances already include them.
    pub fn restore(
        config: SaleConfig,
        snapshot: SaleSnapshot,
        clock: Box<dyn Clock>,
    ) -> Result<Self, SaleError> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: InMemoryLedger::from_balances(snapshot.token_balances, snapshot.token_supply),
            clock,
            stage: snapshot.stage,
            wei_raised: snapshot.wei_raised,
            funds: FundsBook::from_balances(snapshot.fund_balances),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{DEFAULT_CAP, MINIMUM_CONTRIBUTION, TOTAL_SUPPLY};
    use crate::types::{LedgerError, Timestamp};

    const OWNER: AccountId = AccountId(1);
    const SALE: AccountId = AccountId(2);
    const PROCEEDS: AccountId = AccountId(3);
    const FOUNDER: AccountId = AccountId(4);
    const BOUNTY: AccountId = AccountId(5);
    const FUTURE: AccountId = AccountId(6);
    const PRESALE: AccountId = AccountId(7);
    const INVESTOR: AccountId = AccountId(100);

    fn config() -> SaleConfig {
        SaleConfig {
            nominal_rate: 10,
            owner: OWNER,
            sale_wallet: SALE,
            proceeds_wallet: PROCEEDS,
            founder_wallet: FOUNDER,
            bounty_wallet: BOUNTY,
            future_wallet: FUTURE,
            presale_wallet: PRESALE,
            start_time: Timestamp(1000),
            end_time: Timestamp(5000),
            phase1_start: Timestamp(1000),
            phase2_start: Timestamp(2000),
            phase3_start: Timestamp(3000),
            postsale_start: Timestamp(4000),
            cap: DEFAULT_CAP,
            minimum_contribution: MINIMUM_CONTRIBUTION,
        }
    }

    fn engine_at(time: u64) -> (SaleEngine<InMemoryLedger>, ManualClock) {
        let clock = ManualClock::starting_at(Timestamp(time));
        let engine = SaleEngine::new(config(), InMemoryLedger::new(), Box::new(clock.clone()))
            .expect("construct");
        (engine, clock)
    }

    /// Ledger wrapper that allows the construction-time allocation mints but
    /// refuses every purchase mint, for rollback tests.
    struct MintRefusingLedger(InMemoryLedger);

    impl TokenLedger for MintRefusingLedger {
        fn mint(&mut self, to: AccountId, amount: Tokens) -> Result<(), LedgerError> {
            if to.0 < 10 {
                return self.0.mint(to, amount);
            }
            Err(LedgerError::Refused("mint disabled".to_string()))
        }
        fn transfer(
            &mut self,
            from: AccountId,
            to: AccountId,
            amount: Tokens,
        ) -> Result<(), LedgerError> {
            self.0.transfer(from, to, amount)
        }
        fn balance_of(&self, account: AccountId) -> Tokens {
            self.0.balance_of(account)
        }
        fn total_supply(&self) -> Tokens {
            self.0.total_supply()
        }
    }

    #[test]
    fn construction_mints_all_allocations() {
        let (engine, _) = engine_at(0);
        let ledger = engine.ledger();

        assert_eq!(ledger.balance_of(FOUNDER), FOUNDER_ALLOCATION);
        assert_eq!(ledger.balance_of(BOUNTY), BOUNTY_ALLOCATION);
        assert_eq!(ledger.balance_of(FUTURE), FUTURE_RESERVE_ALLOCATION);
        assert_eq!(ledger.balance_of(PRESALE), PRESALE_ALLOCATION);
        assert_eq!(ledger.balance_of(SALE), SALE_SUPPLY);
        assert_eq!(ledger.total_supply(), TOTAL_SUPPLY);
    }

    #[test]
    fn construction_rejects_bad_boundaries() {
        let mut bad = config();
        bad.phase2_start = bad.phase1_start;
        let clock = ManualClock::starting_at(Timestamp(0));
        let result = SaleEngine::new(bad, InMemoryLedger::new(), Box::new(clock));
        assert!(matches!(result, Err(SaleError::Configuration(_))));
    }

    #[test]
    fn stage_starts_at_presale_and_advances_once() {
        let (mut engine, clock) = engine_at(0);
        assert_eq!(engine.stage(), Stage::PreSale);
        assert_eq!(engine.set_current_stage(), None);

        clock.set(Timestamp(1000));
        assert_eq!(
            engine.set_current_stage(),
            Some(StageTransition {
                from: Stage::PreSale,
                to: Stage::Phase1
            })
        );
        // Idempotent: same instant, no transition, same stage.
        assert_eq!(engine.set_current_stage(), None);
        assert_eq!(engine.stage(), Stage::Phase1);
    }

    #[test]
    fn stage_never_regresses_when_clock_goes_backwards() {
        let (mut engine, clock) = engine_at(3000);
        engine.set_current_stage();
        assert_eq!(engine.stage(), Stage::Phase3);

        clock.set(Timestamp(0));
        assert_eq!(engine.set_current_stage(), None);
        assert_eq!(engine.stage(), Stage::Phase3);
    }

    #[test]
    fn purchase_happy_path() {
        let (mut engine, _) = engine_at(1000);
        let receipt = engine
            .buy_tokens(INVESTOR, Wei::from_ether(1))
            .expect("purchase");

        assert_eq!(receipt.tokens_issued, Tokens::from_whole(1150));
        assert_eq!(receipt.stage, Stage::Phase1);
        assert_eq!(engine.ledger().balance_of(INVESTOR), Tokens::from_whole(1150));
        assert_eq!(engine.funds().balance_of(PROCEEDS), Wei::from_ether(1));
        assert_eq!(engine.wei_raised(), Wei::from_ether(1));
    }

    #[test]
    fn purchase_refreshes_stage_implicitly() {
        let (mut engine, clock) = engine_at(0);
        clock.set(Timestamp(2500));
        let receipt = engine
            .buy_tokens(INVESTOR, Wei::from_ether(1))
            .expect("purchase");
        // Never explicitly refreshed, yet the phase 2 rate applies.
        assert_eq!(receipt.tokens_issued, Tokens::from_whole(1100));
    }

    #[test]
    fn null_beneficiary_rejected() {
        let (mut engine, _) = engine_at(1000);
        assert_eq!(
            engine.buy_tokens(AccountId::NULL, Wei::from_ether(1)),
            Err(SaleError::NullBeneficiary)
        );
    }

    #[test]
    fn dust_rejected_not_rounded() {
        let (mut engine, _) = engine_at(1000);
        let dust = Wei(MINIMUM_CONTRIBUTION.value() - 1);
        assert!(matches!(
            engine.buy_tokens(INVESTOR, dust),
            Err(SaleError::BelowMinimum { .. })
        ));
        assert_eq!(engine.ledger().balance_of(INVESTOR), Tokens::ZERO);
    }

    #[test]
    fn window_enforced_at_end_time() {
        let (mut engine, clock) = engine_at(999);
        assert_eq!(
            engine.buy_tokens(INVESTOR, Wei::from_ether(1)),
            Err(SaleError::WindowClosed)
        );

        clock.set(Timestamp(5000));
        assert_eq!(
            engine.buy_tokens(INVESTOR, Wei::from_ether(1)),
            Err(SaleError::WindowClosed)
        );
    }

    #[test]
    fn cap_is_a_hard_ceiling_no_partial_fill() {
        let mut small = config();
        small.cap = Wei::from_ether(10);
        let clock = ManualClock::starting_at(Timestamp(1000));
        let mut engine =
            SaleEngine::new(small, InMemoryLedger::new(), Box::new(clock)).expect("construct");

        engine.buy_tokens(INVESTOR, Wei::from_ether(9)).expect("ok");
        let err = engine
            .buy_tokens(INVESTOR, Wei::from_ether(2))
            .expect_err("over cap");
        assert!(matches!(err, SaleError::CapExceeded { .. }));
        // Fully rejected: raised total and balances unchanged.
        assert_eq!(engine.wei_raised(), Wei::from_ether(9));
        assert_eq!(engine.ledger().balance_of(INVESTOR), Tokens::from_whole(9 * 1150));

        // Exactly reaching the cap is allowed.
        engine.buy_tokens(INVESTOR, Wei::from_ether(1)).expect("ok");
        assert_eq!(engine.wei_raised(), Wei::from_ether(10));
    }

    #[test]
    fn mint_failure_rolls_back_value_transfer() {
        let ledger = MintRefusingLedger(InMemoryLedger::new());
        let clock = ManualClock::starting_at(Timestamp(1000));
        let mut engine =
            SaleEngine::new(config(), ledger, Box::new(clock)).expect("allocations mint");

        let err = engine
            .buy_tokens(INVESTOR, Wei::from_ether(1))
            .expect_err("mint refused");
        assert!(matches!(err, SaleError::Ledger(_)));
        assert_eq!(engine.funds().balance_of(PROCEEDS), Wei::ZERO);
        assert_eq!(engine.wei_raised(), Wei::ZERO);
    }

    #[test]
    fn bare_send_is_a_purchase_for_the_caller() {
        let (mut engine, _) = engine_at(1000);
        let receipt = engine
            .contribute(INVESTOR, Wei::from_ether(1))
            .expect("contribute");
        assert_eq!(receipt.beneficiary, INVESTOR);
        assert_eq!(engine.ledger().balance_of(INVESTOR), Tokens::from_whole(1150));
    }

    #[test]
    fn sweep_requires_owner_and_postsale() {
        let (mut engine, clock) = engine_at(1000);
        assert_eq!(
            engine.retrieve_remaining_coins_post_sale(INVESTOR),
            Err(SaleError::Unauthorized)
        );
        assert_eq!(
            engine.retrieve_remaining_coins_post_sale(OWNER),
            Err(SaleError::WindowClosed)
        );

        clock.set(Timestamp(4000));
        let swept = engine
            .retrieve_remaining_coins_post_sale(OWNER)
            .expect("sweep");
        assert_eq!(swept, SALE_SUPPLY);
        assert_eq!(engine.ledger().balance_of(SALE), Tokens::ZERO);
    }

    #[test]
    fn second_sweep_is_a_noop_success() {
        let (mut engine, clock) = engine_at(1000);
        clock.set(Timestamp(4000));
        engine
            .retrieve_remaining_coins_post_sale(OWNER)
            .expect("sweep");

        let future_before = engine.ledger().balance_of(FUTURE);
        let swept = engine
            .retrieve_remaining_coins_post_sale(OWNER)
            .expect("repeat sweep");
        assert_eq!(swept, Tokens::ZERO);
        assert_eq!(engine.ledger().balance_of(FUTURE), future_before);
    }

    #[test]
    fn retrieve_funds_owner_only() {
        let (mut engine, _) = engine_at(1000);
        assert_eq!(
            engine.retrieve_funds(INVESTOR),
            Err(SaleError::Unauthorized)
        );
        assert_eq!(engine.retrieve_funds(OWNER), Ok(Wei::ZERO));
    }

    #[test]
    fn snapshot_round_trip() {
        let (mut engine, clock) = engine_at(1000);
        engine.buy_tokens(INVESTOR, Wei::from_ether(3)).expect("ok");
        engine.set_current_stage();

        let snapshot = engine.snapshot();
        let restored =
            SaleEngine::restore(config(), snapshot.clone(), Box::new(clock)).expect("restore");

        assert_eq!(restored.stage(), engine.stage());
        assert_eq!(restored.wei_raised(), engine.wei_raised());
        assert_eq!(
            restored.ledger().balance_of(INVESTOR),
            engine.ledger().balance_of(INVESTOR)
        );
        assert_eq!(restored.snapshot(), snapshot);
    }
}
