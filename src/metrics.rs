//! Metrics collection for observability
//!
//! Prometheus counters for monitoring the engine.
//!
//! # Metrics
//!
//! - `ledger_operations_total` - Committed mutating operations
//! - `ledger_purchases_total` - Token purchases
//! - `ledger_tokens_minted_total` - Privileged token mints
//! - `ledger_tokens_burned_total` - Token burns
//! - `ledger_collectibles_minted_total` - Collectible mints
//! - `ledger_collectible_transfers_total` - Collectible ownership transfers
//! - `ledger_treasury_withdrawals_total` - Treasury payouts

use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed mutating operations
    pub operations_total: IntCounter,

    /// Token purchases
    pub purchases_total: IntCounter,

    /// Privileged token mints
    pub tokens_minted_total: IntCounter,

    /// Token burns
    pub tokens_burned_total: IntCounter,

    /// Collectible mints
    pub collectibles_minted_total: IntCounter,

    /// Collectible transfers
    pub collectible_transfers_total: IntCounter,

    /// Treasury payouts
    pub treasury_withdrawals_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounter::new(
            "ledger_operations_total",
            "Committed mutating operations",
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let purchases_total =
            IntCounter::new("ledger_purchases_total", "Token purchases")?;
        registry.register(Box::new(purchases_total.clone()))?;

        let tokens_minted_total = IntCounter::new(
            "ledger_tokens_minted_total",
            "Privileged token mints",
        )?;
        registry.register(Box::new(tokens_minted_total.clone()))?;

        let tokens_burned_total =
            IntCounter::new("ledger_tokens_burned_total", "Token burns")?;
        registry.register(Box::new(tokens_burned_total.clone()))?;

        let collectibles_minted_total = IntCounter::new(
            "ledger_collectibles_minted_total",
            "Collectible mints",
        )?;
        registry.register(Box::new(collectibles_minted_total.clone()))?;

        let collectible_transfers_total = IntCounter::new(
            "ledger_collectible_transfers_total",
            "Collectible ownership transfers",
        )?;
        registry.register(Box::new(collectible_transfers_total.clone()))?;

        let treasury_withdrawals_total = IntCounter::new(
            "ledger_treasury_withdrawals_total",
            "Treasury payouts",
        )?;
        registry.register(Box::new(treasury_withdrawals_total.clone()))?;

        Ok(Self {
            operations_total,
            purchases_total,
            tokens_minted_total,
            tokens_burned_total,
            collectibles_minted_total,
            collectible_transfers_total,
            treasury_withdrawals_total,
            registry,
        })
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
