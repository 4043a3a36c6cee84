//! End-to-end sale scenarios.
//!
//! Exercises the full lifecycle of a sale through the public surface:
//! construction allocations, stage advancement at every boundary, per-stage
//! rates, purchase validation, and post-sale settlement.

use tessel_core::config::{
    BOUNTY_ALLOCATION, DEFAULT_CAP, FOUNDER_ALLOCATION, FUTURE_RESERVE_ALLOCATION,
    MINIMUM_CONTRIBUTION, PRESALE_ALLOCATION, SALE_SUPPLY, TOTAL_SUPPLY,
};
use tessel_core::{
    AccountId, InMemoryLedger, ManualClock, SaleConfig, SaleEngine, SaleError, Stage, Timestamp,
    TokenLedger, Tokens, WEI_PER_ETHER, Wei,
};

// =============================================================================
// FIXTURE
// =============================================================================

const OWNER: AccountId = AccountId(1);
const SALE_WALLET: AccountId = AccountId(2);
const PROCEEDS: AccountId = AccountId(3);
const FOUNDER: AccountId = AccountId(4);
const BOUNTY: AccountId = AccountId(5);
const FUTURE: AccountId = AccountId(6);
const PRESALE: AccountId = AccountId(7);
const INVESTOR: AccountId = AccountId(100);
const INVESTOR_2: AccountId = AccountId(101);

const fn weeks(n: u64) -> u64 {
    n * 7 * 24 * 60 * 60
}

/// Sale schedule matching the reference deployment: opens one week from
/// "now", phase 2 a week later, phase 3 two weeks after that, post-sale a
/// week after that, which is also when the window closes.
struct Fixture {
    start: Timestamp,
    phase2: Timestamp,
    phase3: Timestamp,
    postsale: Timestamp,
    end: Timestamp,
    clock: ManualClock,
    engine: SaleEngine<InMemoryLedger>,
}

fn setup() -> Fixture {
    let t0 = Timestamp(1_700_000_000);
    let start = t0.plus(weeks(1));
    let phase2 = start.plus(weeks(1));
    let phase3 = phase2.plus(weeks(2));
    let postsale = phase3.plus(weeks(1));
    let end = postsale;

    let config = SaleConfig {
        nominal_rate: 10,
        owner: OWNER,
        sale_wallet: SALE_WALLET,
        proceeds_wallet: PROCEEDS,
        founder_wallet: FOUNDER,
        bounty_wallet: BOUNTY,
        future_wallet: FUTURE,
        presale_wallet: PRESALE,
        start_time: start,
        end_time: end,
        phase1_start: start,
        phase2_start: phase2,
        phase3_start: phase3,
        postsale_start: postsale,
        cap: DEFAULT_CAP,
        minimum_contribution: MINIMUM_CONTRIBUTION,
    };

    let clock = ManualClock::starting_at(t0);
    let engine = SaleEngine::new(config, InMemoryLedger::new(), Box::new(clock.clone()))
        .expect("construct sale");

    Fixture {
        start,
        phase2,
        phase3,
        postsale,
        end,
        clock,
        engine,
    }
}

/// Assert that nothing a purchase could touch has changed.
fn assert_untouched(f: &Fixture, beneficiary: AccountId, tokens_before: Tokens) {
    assert_eq!(f.engine.ledger().balance_of(beneficiary), tokens_before);
    assert_eq!(f.engine.funds().balance_of(PROCEEDS), Wei::ZERO);
    assert_eq!(f.engine.wei_raised(), Wei::ZERO);
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

#[test]
fn creates_sale_with_correct_parameters_and_allocations() {
    let f = setup();
    let config = f.engine.config();

    assert_eq!(config.start_time, f.start);
    assert_eq!(config.end_time, f.end);
    assert_eq!(config.phase1_start, f.start);
    assert_eq!(config.phase2_start, f.phase2);
    assert_eq!(config.phase3_start, f.phase3);
    assert_eq!(config.postsale_start, f.postsale);

    let ledger = f.engine.ledger();
    assert_eq!(ledger.balance_of(FOUNDER), FOUNDER_ALLOCATION);
    assert_eq!(ledger.balance_of(BOUNTY), BOUNTY_ALLOCATION);
    assert_eq!(ledger.balance_of(FUTURE), FUTURE_RESERVE_ALLOCATION);
    assert_eq!(ledger.balance_of(PRESALE), PRESALE_ALLOCATION);
    assert_eq!(ledger.balance_of(SALE_WALLET), SALE_SUPPLY);
    assert_eq!(ledger.total_supply(), TOTAL_SUPPLY);
}

#[test]
fn construction_rejects_unordered_phase_boundaries() {
    let f = setup();
    let mut config = f.engine.config().clone();
    config.phase3_start = config.phase2_start;

    let result = SaleEngine::new(
        config,
        InMemoryLedger::new(),
        Box::new(ManualClock::default()),
    );
    assert!(matches!(result, Err(SaleError::Configuration(_))));
}

// =============================================================================
// SALE WINDOW
// =============================================================================

#[test]
fn rejects_payments_before_start() {
    let mut f = setup();
    let before = f.engine.ledger().balance_of(INVESTOR);

    assert!(f.engine.contribute(INVESTOR, Wei::from_ether(1)).is_err());
    assert!(f.engine.buy_tokens(INVESTOR, Wei::from_ether(1)).is_err());
    assert_untouched(&f, INVESTOR, before);
}

#[test]
fn accepts_payments_during_the_sale() {
    let mut f = setup();
    f.clock.set(f.start);

    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase during sale");

    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(1150)
    );
}

#[test]
fn rejects_payments_at_and_after_end() {
    let mut f = setup();
    f.clock.set(f.end);
    assert_eq!(
        f.engine.buy_tokens(INVESTOR, Wei::from_ether(1)),
        Err(SaleError::WindowClosed)
    );

    f.clock.set(f.end.plus(1));
    assert_eq!(
        f.engine.contribute(INVESTOR, Wei::from_ether(1)),
        Err(SaleError::WindowClosed)
    );
}

// =============================================================================
// STAGE ADVANCEMENT (set_current_stage)
// =============================================================================

#[test]
fn stage_is_presale_after_construction() {
    let f = setup();
    assert_eq!(f.engine.stage(), Stage::PreSale);
}

#[test]
fn refresh_before_phase_1_does_nothing() {
    let mut f = setup();
    assert_eq!(f.engine.set_current_stage(), None);
    assert_eq!(f.engine.stage(), Stage::PreSale);
}

#[test]
fn advances_to_each_phase_at_its_boundary() {
    let mut f = setup();

    f.clock.set(f.start);
    f.engine.set_current_stage();
    assert_eq!(f.engine.stage(), Stage::Phase1);

    f.clock.set(f.phase2);
    f.engine.set_current_stage();
    assert_eq!(f.engine.stage(), Stage::Phase2);

    f.clock.set(f.phase3);
    f.engine.set_current_stage();
    assert_eq!(f.engine.stage(), Stage::Phase3);

    f.clock.set(f.postsale);
    f.engine.set_current_stage();
    assert_eq!(f.engine.stage(), Stage::PostSale);
}

#[test]
fn repeat_refresh_within_a_phase_is_a_noop() {
    let mut f = setup();
    f.clock.set(f.start);

    assert!(f.engine.set_current_stage().is_some());
    assert_eq!(f.engine.stage(), Stage::Phase1);
    // Second refresh at the same instant: same stage, no transition.
    assert_eq!(f.engine.set_current_stage(), None);
    assert_eq!(f.engine.stage(), Stage::Phase1);
}

#[test]
fn repeat_refresh_in_postsale_is_a_noop() {
    let mut f = setup();
    f.clock.set(f.postsale);

    assert!(f.engine.set_current_stage().is_some());
    assert_eq!(f.engine.set_current_stage(), None);
    assert_eq!(f.engine.stage(), Stage::PostSale);
}

#[test]
fn skipped_boundaries_jump_straight_to_the_scheduled_stage() {
    let mut f = setup();
    f.clock.set(f.phase3);

    let transition = f.engine.set_current_stage().expect("transition");
    assert_eq!(transition.from, Stage::PreSale);
    assert_eq!(transition.to, Stage::Phase3);
}

// =============================================================================
// RATES (current_rate)
// =============================================================================

#[test]
fn rate_is_zero_in_presale() {
    let f = setup();
    assert_eq!(f.engine.current_rate(), 0);
}

#[test]
fn rate_per_phase() {
    let mut f = setup();
    for (time, expected) in [
        (f.start, 1150),
        (f.phase2, 1100),
        (f.phase3, 1050),
        (f.postsale, 0),
    ] {
        f.clock.set(time);
        f.engine.set_current_stage();
        assert_eq!(f.engine.current_rate(), expected);
    }
}

// =============================================================================
// PURCHASES
// =============================================================================

#[test]
fn does_not_work_before_phase_1() {
    let mut f = setup();
    let before = f.engine.ledger().balance_of(INVESTOR);

    assert!(f.engine.buy_tokens(INVESTOR, Wei::from_ether(1)).is_err());
    assert_untouched(&f, INVESTOR, before);
}

#[test]
fn rejects_purchases_below_the_minimum() {
    let mut f = setup();
    f.clock.set(f.start);

    let dust = Wei(WEI_PER_ETHER / 1000); // 0.001 ether
    let err = f.engine.buy_tokens(INVESTOR, dust).expect_err("dust");
    assert!(matches!(err, SaleError::BelowMinimum { .. }));
    assert_untouched(&f, INVESTOR, Tokens::ZERO);
}

#[test]
fn uses_rate_1150_for_phase_1() {
    let mut f = setup();
    f.clock.set(f.start);

    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase");

    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(1150)
    );
    assert_eq!(f.engine.funds().balance_of(PROCEEDS), Wei::from_ether(1));
}

#[test]
fn uses_rate_1100_for_phase_2() {
    let mut f = setup();
    f.clock.set(f.phase2);

    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase");

    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(1100)
    );
    assert_eq!(f.engine.funds().balance_of(PROCEEDS), Wei::from_ether(1));
}

#[test]
fn uses_rate_1050_for_phase_3() {
    let mut f = setup();
    f.clock.set(f.phase3);

    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase");

    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(1050)
    );
    assert_eq!(f.engine.funds().balance_of(PROCEEDS), Wei::from_ether(1));
}

#[test]
fn does_not_work_post_sale() {
    let mut f = setup();
    f.clock.set(f.postsale);
    f.engine.set_current_stage();
    assert_eq!(f.engine.stage(), Stage::PostSale);

    assert!(f.engine.contribute(INVESTOR, Wei::from_ether(1)).is_err());
    assert!(f.engine.buy_tokens(INVESTOR, Wei::from_ether(1)).is_err());
    assert_untouched(&f, INVESTOR, Tokens::ZERO);
}

#[test]
fn accepts_a_range_of_purchase_sizes() {
    for ether in [1u64, 10, 100, 1000, 10_000] {
        let mut f = setup();
        f.clock.set(f.start);

        f.engine
            .buy_tokens(INVESTOR, Wei::from_ether(ether))
            .expect("purchase");

        assert_eq!(
            f.engine.ledger().balance_of(INVESTOR),
            Tokens::from_whole(ether * 1150)
        );
        assert_eq!(
            f.engine.funds().balance_of(PROCEEDS),
            Wei::from_ether(ether)
        );
        assert_eq!(f.engine.wei_raised(), Wei::from_ether(ether));
    }
}

#[test]
fn rejects_a_purchase_over_the_cap() {
    let mut f = setup();
    f.clock.set(f.start);

    let err = f
        .engine
        .buy_tokens(INVESTOR, Wei::from_ether(100_000))
        .expect_err("over cap");
    assert!(matches!(err, SaleError::CapExceeded { .. }));
    assert_untouched(&f, INVESTOR, Tokens::ZERO);
    // Total supply untouched by the failed purchase.
    assert_eq!(f.engine.ledger().total_supply(), TOTAL_SUPPLY);
}

#[test]
fn bare_send_buys_for_the_sender() {
    let mut f = setup();
    f.clock.set(f.start);

    let receipt = f
        .engine
        .contribute(INVESTOR, Wei::from_ether(2))
        .expect("contribute");

    assert_eq!(receipt.beneficiary, INVESTOR);
    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(2300)
    );
}

#[test]
fn two_buyers_accumulate_the_raised_total() {
    // Scenario B: two distinct buyers during phase 1.
    let mut f = setup();
    f.clock.set(f.start);

    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("first");
    f.engine
        .buy_tokens(INVESTOR_2, Wei::from_ether(1))
        .expect("second");

    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR),
        Tokens::from_whole(1150)
    );
    assert_eq!(
        f.engine.ledger().balance_of(INVESTOR_2),
        Tokens::from_whole(1150)
    );
    assert_eq!(f.engine.wei_raised(), Wei::from_ether(2));
    assert_eq!(f.engine.funds().balance_of(PROCEEDS), Wei::from_ether(2));
}

// =============================================================================
// POST-SALE SETTLEMENT
// =============================================================================

#[test]
fn owner_sweeps_unsold_supply_to_the_future_reserve() {
    // Sell a little, then sweep the rest.
    let mut f = setup();
    f.clock.set(f.start);
    f.engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase");

    f.clock.set(f.postsale);
    let unsold = f.engine.ledger().balance_of(SALE_WALLET);
    let future_before = f.engine.ledger().balance_of(FUTURE);

    let swept = f
        .engine
        .retrieve_remaining_coins_post_sale(OWNER)
        .expect("sweep");

    assert_eq!(swept, unsold);
    assert_eq!(f.engine.ledger().balance_of(SALE_WALLET), Tokens::ZERO);
    assert_eq!(
        f.engine.ledger().balance_of(FUTURE),
        future_before.checked_add(unsold).expect("no overflow")
    );
}

#[test]
fn sweep_rejected_before_postsale() {
    let mut f = setup();
    f.clock.set(f.phase3);

    assert_eq!(
        f.engine.retrieve_remaining_coins_post_sale(OWNER),
        Err(SaleError::WindowClosed)
    );
    assert_eq!(f.engine.ledger().balance_of(SALE_WALLET), SALE_SUPPLY);
}

#[test]
fn settlement_rejects_non_owner_callers() {
    // Scenario D: non-owner rejected with no state change; owner succeeds.
    let mut f = setup();
    f.clock.set(f.postsale);

    assert_eq!(
        f.engine.retrieve_remaining_coins_post_sale(INVESTOR),
        Err(SaleError::Unauthorized)
    );
    assert_eq!(
        f.engine.retrieve_funds(INVESTOR),
        Err(SaleError::Unauthorized)
    );
    assert_eq!(f.engine.ledger().balance_of(SALE_WALLET), SALE_SUPPLY);

    f.engine
        .retrieve_remaining_coins_post_sale(OWNER)
        .expect("owner sweep");
    f.engine.retrieve_funds(OWNER).expect("owner withdraw");
}

#[test]
fn sweep_moves_the_full_sale_supply_even_after_sales() {
    // Purchases mint and never draw down custody, so the sweep amount is
    // independent of how much was sold and total supply ends at the initial
    // supply plus everything issued.
    let mut f = setup();
    f.clock.set(f.start);
    let receipt = f
        .engine
        .buy_tokens(INVESTOR, Wei::from_ether(1))
        .expect("purchase");
    assert_eq!(receipt.tokens_issued, Tokens::from_whole(1150));

    f.clock.set(f.postsale);
    let swept = f
        .engine
        .retrieve_remaining_coins_post_sale(OWNER)
        .expect("sweep");

    assert_eq!(swept, SALE_SUPPLY);
    assert_eq!(
        f.engine.ledger().balance_of(FUTURE),
        FUTURE_RESERVE_ALLOCATION
            .checked_add(SALE_SUPPLY)
            .expect("no overflow")
    );
    assert_eq!(
        f.engine.ledger().total_supply(),
        TOTAL_SUPPLY
            .checked_add(receipt.tokens_issued)
            .expect("no overflow")
    );
}

#[test]
fn repeat_sweep_transfers_zero_and_succeeds() {
    let mut f = setup();
    f.clock.set(f.postsale);

    f.engine
        .retrieve_remaining_coins_post_sale(OWNER)
        .expect("first sweep");
    let swept = f
        .engine
        .retrieve_remaining_coins_post_sale(OWNER)
        .expect("repeat sweep is a no-op");
    assert_eq!(swept, Tokens::ZERO);
}

#[test]
fn retrieve_funds_moves_residual_balance_to_the_owner() {
    let mut f = setup();

    // Residual value parked on the engine's own account (safety-valve path).
    let residual = f.engine.retrieve_funds(OWNER).expect("withdraw nothing");
    assert_eq!(residual, Wei::ZERO);
    assert_eq!(f.engine.funds().balance_of(OWNER), Wei::ZERO);
}
