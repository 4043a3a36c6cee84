//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command is a full load-drive-persist cycle: the engine is restored
//! from the database, the operation runs, and the snapshot is written back
//! before the process exits.

use crate::api;
use crate::config::SaleConfigFile;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessel_core::{
    AccountId, InMemoryLedger, RedbStore, SaleEngine, SaleError, SystemClock, TokenLedger, Wei,
};

// =============================================================================
// ENGINE LOADING
// =============================================================================

/// Open the store and restore the engine from its persisted state.
///
/// Fails with a configuration error when the database has not been
/// initialized yet.
fn load_engine(db_path: &Path) -> Result<(SaleEngine<InMemoryLedger>, RedbStore), SaleError> {
    let store = RedbStore::open(db_path)?;

    let config = store.load_config()?.ok_or_else(|| {
        SaleError::Configuration(format!(
            "database {:?} is not initialized; run `tessel init -c <config.toml>` first",
            db_path
        ))
    })?;
    let snapshot = store.load()?.ok_or_else(|| {
        SaleError::Storage(format!("database {:?} has a config but no snapshot", db_path))
    })?;

    let engine = SaleEngine::restore(config, snapshot, Box::new(SystemClock))?;
    Ok((engine, store))
}

/// Persist the engine state back to the store.
fn persist(store: &RedbStore, engine: &SaleEngine<InMemoryLedger>) -> Result<(), SaleError> {
    store.save(&engine.snapshot())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new sale database from a TOML config file.
pub fn cmd_init(db_path: &PathBuf, config_path: &Path, force: bool) -> Result<(), SaleError> {
    if db_path.exists() && !force {
        return Err(SaleError::Configuration(
            "database already exists; use --force to overwrite".to_string(),
        ));
    }

    let config = SaleConfigFile::load(config_path)?.into_sale_config()?;

    // Construction mints the fixed allocations and the sale supply.
    let engine = SaleEngine::new(config.clone(), InMemoryLedger::new(), Box::new(SystemClock))?;

    let store = RedbStore::open(db_path)?;
    store.save_config(&config)?;
    persist(&store, &engine)?;

    println!("Initialized sale database at {:?}", db_path);
    println!(
        "Total supply: {} (sale supply held by {})",
        engine.ledger().total_supply(),
        config.sale_wallet
    );
    println!(
        "Window: {} .. {} (cap {})",
        config.start_time, config.end_time, config.cap
    );

    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server on an initialized database.
pub async fn cmd_server(db_path: &PathBuf, host: &str, port: u16) -> Result<(), SaleError> {
    let (engine, store) = load_engine(db_path)?;

    println!("Tessel Token Sale Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health        - Health check");
    println!("  GET  /status        - Sale status");
    println!("  GET  /stage         - Current stage");
    println!("  POST /stage/refresh - Refresh the stage");
    println!("  GET  /rate          - Current rate");
    println!("  POST /purchase      - Purchase tokens");
    println!("  POST /sweep         - Sweep unsold supply (owner)");
    println!("  POST /withdraw      - Withdraw residual funds (owner)");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = api::AppState::with_store(engine, Arc::new(store));
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show sale status.
pub fn cmd_status(db_path: &PathBuf, json_mode: bool) -> Result<(), SaleError> {
    let (engine, _store) = load_engine(db_path)?;
    let stage = engine.stage();
    let config = engine.config();
    let unsold = engine.ledger().balance_of(config.sale_wallet);

    if json_mode {
        // u128 quantities are emitted as strings; serde_json::Value has no
        // 128-bit number representation.
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "stage": stage.name(),
            "next_stage": stage.next().map(|s| s.name()),
            "rate": stage.rate().to_string(),
            "accepts_purchases": stage.accepts_purchases(),
            "wei_raised": engine.wei_raised().value().to_string(),
            "cap": config.cap.value().to_string(),
            "token_supply": engine.ledger().total_supply().value().to_string(),
            "unsold_supply": unsold.value().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Tessel Sale Status");
    println!("==================");
    println!("Database: {:?}", db_path);
    println!();
    println!("Stage:         {}", stage);
    if stage.is_terminal() {
        println!("Next stage:    none (sale complete)");
    } else if let Some(next) = stage.next() {
        println!("Next stage:    {}", next);
    }
    println!("Rate:          {} tokens/wei", stage.rate());
    println!("Raised:        {}", engine.wei_raised());
    println!("Cap:           {}", config.cap);
    println!("Token supply:  {}", engine.ledger().total_supply());
    println!("Unsold supply: {}", unsold);

    Ok(())
}

// =============================================================================
// STAGE COMMAND
// =============================================================================

/// Refresh the stage from the system clock and show it.
pub fn cmd_stage(db_path: &PathBuf, json_mode: bool) -> Result<(), SaleError> {
    let (mut engine, store) = load_engine(db_path)?;

    let transition = engine.set_current_stage();
    if transition.is_some() {
        persist(&store, &engine)?;
    }

    if json_mode {
        let output = serde_json::json!({
            "stage": engine.stage().name(),
            "rate": engine.current_rate().to_string(),
            "accepts_purchases": engine.stage().accepts_purchases(),
            "changed": transition.is_some(),
            "previous": transition.map(|t| t.from.name()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    match transition {
        Some(t) => println!("Stage advanced: {} -> {}", t.from, t.to),
        None => println!("Stage unchanged: {}", engine.stage()),
    }
    println!("Rate: {} tokens/wei", engine.current_rate());

    Ok(())
}

// =============================================================================
// RATE COMMAND
// =============================================================================

/// Show the current rate, as last refreshed.
pub fn cmd_rate(db_path: &PathBuf, json_mode: bool) -> Result<(), SaleError> {
    let (engine, _store) = load_engine(db_path)?;

    if json_mode {
        let output = serde_json::json!({
            "stage": engine.stage().name(),
            "rate": engine.current_rate().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Stage {} rate: {} tokens/wei",
        engine.stage(),
        engine.current_rate()
    );

    Ok(())
}

// =============================================================================
// BUY COMMAND
// =============================================================================

/// Purchase tokens for a beneficiary.
pub fn cmd_buy(
    db_path: &PathBuf,
    json_mode: bool,
    beneficiary: u64,
    ether: Option<u64>,
    wei: Option<u128>,
) -> Result<(), SaleError> {
    let amount = match (ether, wei) {
        (Some(e), _) => Wei::from_ether(e),
        (None, Some(w)) => Wei::new(w),
        (None, None) => {
            return Err(SaleError::Configuration(
                "specify the contribution with --ether or --wei".to_string(),
            ));
        }
    };

    let (mut engine, store) = load_engine(db_path)?;
    let receipt = engine.buy_tokens(AccountId(beneficiary), amount)?;
    persist(&store, &engine)?;

    if json_mode {
        let output = serde_json::json!({
            "beneficiary": receipt.beneficiary.0,
            "contribution_wei": receipt.contribution.value().to_string(),
            "tokens_issued": receipt.tokens_issued.value().to_string(),
            "stage": receipt.stage.name(),
            "wei_raised": receipt.wei_raised.value().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Purchase accepted in stage {}", receipt.stage);
    println!("  Beneficiary:  {}", receipt.beneficiary);
    println!("  Contribution: {}", receipt.contribution);
    println!("  Issued:       {}", receipt.tokens_issued);
    println!("  Raised total: {}", receipt.wei_raised);

    Ok(())
}

// =============================================================================
// SETTLEMENT COMMANDS
// =============================================================================

/// Sweep the unsold supply to the future-reserve wallet.
pub fn cmd_sweep(db_path: &PathBuf, json_mode: bool, caller: u64) -> Result<(), SaleError> {
    let (mut engine, store) = load_engine(db_path)?;
    let swept = engine.retrieve_remaining_coins_post_sale(AccountId(caller))?;
    persist(&store, &engine)?;

    if json_mode {
        let output = serde_json::json!({ "swept_tokens": swept.value().to_string() });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Swept {} to the future reserve", swept);
    Ok(())
}

/// Withdraw the residual funds balance to the owner.
pub fn cmd_withdraw(db_path: &PathBuf, json_mode: bool, caller: u64) -> Result<(), SaleError> {
    let (mut engine, store) = load_engine(db_path)?;
    let withdrawn = engine.retrieve_funds(AccountId(caller))?;
    persist(&store, &engine)?;

    if json_mode {
        let output = serde_json::json!({ "withdrawn_wei": withdrawn.value().to_string() });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Withdrew {} to the owner", withdrawn);
    Ok(())
}
