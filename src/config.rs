//! Configuration for the ledger engine
//!
//! The engine holds a single mutable configuration record; runtime updates go
//! through the administrator-gated setters on
//! [`LedgerEngine`](crate::engine::LedgerEngine).

use crate::types::{AccountId, Amount, MAX_FEE_BPS};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Administrator address (configuration and privileged mints)
    pub admin: AccountId,

    /// Minter role address (privileged mints only)
    pub minter: AccountId,

    /// Fee recipient address (receives the fee split of every sale)
    pub fee_recipient: AccountId,

    /// Treasury payout address (receives withdrawals)
    pub treasury: AccountId,

    /// Price per whole token, in external base units
    pub token_price: Amount,

    /// Per-item collectible mint price, in external base units
    pub collectible_mint_price: Amount,

    /// Sale fee rate in basis points (bounded by [`MAX_FEE_BPS`])
    pub fee_bps: u32,

    /// Global pause flag
    pub paused: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin: AccountId::new("admin"),
            minter: AccountId::new("minter"),
            fee_recipient: AccountId::new("fee-recipient"),
            treasury: AccountId::new("treasury"),
            token_price: 1_000_000_000_000,             // 10^12 per whole token
            collectible_mint_price: 50_000_000_000_000, // 5x10^13 per item
            fee_bps: 500,                               // 5%
            paused: false,
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> crate::Result<Self> {
        let mut config = EngineConfig::default();

        if let Ok(admin) = std::env::var("LEDGER_ADMIN") {
            config.admin = AccountId::new(admin);
        }
        if let Ok(minter) = std::env::var("LEDGER_MINTER") {
            config.minter = AccountId::new(minter);
        }
        if let Ok(recipient) = std::env::var("LEDGER_FEE_RECIPIENT") {
            config.fee_recipient = AccountId::new(recipient);
        }
        if let Ok(treasury) = std::env::var("LEDGER_TREASURY") {
            config.treasury = AccountId::new(treasury);
        }
        if let Ok(price) = std::env::var("LEDGER_TOKEN_PRICE") {
            config.token_price = price
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad LEDGER_TOKEN_PRICE: {}", e)))?;
        }
        if let Ok(price) = std::env::var("LEDGER_MINT_PRICE") {
            config.collectible_mint_price = price
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad LEDGER_MINT_PRICE: {}", e)))?;
        }
        if let Ok(bps) = std::env::var("LEDGER_FEE_BPS") {
            config.fee_bps = bps
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad LEDGER_FEE_BPS: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants on the configuration record
    pub fn validate(&self) -> crate::Result<()> {
        if self.admin.is_empty() {
            return Err(crate::Error::Config("admin address is empty".to_string()));
        }
        if self.fee_recipient.is_empty() {
            return Err(crate::Error::Config(
                "fee recipient address is empty".to_string(),
            ));
        }
        if self.treasury.is_empty() {
            return Err(crate::Error::Config(
                "treasury address is empty".to_string(),
            ));
        }
        if self.fee_bps > MAX_FEE_BPS {
            return Err(crate::Error::Config(format!(
                "fee_bps {} exceeds maximum {}",
                self.fee_bps, MAX_FEE_BPS
            )));
        }
        Ok(())
    }
}
