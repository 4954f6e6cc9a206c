//! Collectible Ledger
//!
//! Self-contained ledger combining a fungible-token balance sheet, a capped
//! trait-tagged collectible registry, and a sales/treasury accounting layer.
//!
//! # Architecture
//!
//! - **BalanceLedger**: account balances with conservation invariants
//! - **CollectibleRegistry**: capped, sequential-id registry with a per-owner
//!   reverse index and an append-only global mint order
//! - **TraitGenerator**: deterministic seed-derived trait assignment
//! - **SalesAccounting**: basis-point fee splitting and price quotes
//! - **LedgerEngine**: public operation surface with pause, authorization,
//!   and reentrancy guards
//!
//! # Invariants
//!
//! - Conservation: sum of balances == total supply after every operation
//! - No double mint: ids are sequential from 1 and never reused
//! - Cap enforcement: no mint succeeds past the collectible supply cap
//! - Fee exactness: fee + treasury == payment for every split
//! - Atomicity: every operation commits entirely or has no effect
//!
//! The engine runs inside a single globally-serialized host environment;
//! persistence across restarts and the outer transport are the host's
//! responsibility.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod accounting;
pub mod balances;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod traits_gen;
pub mod types;

// Re-exports
pub use accounting::FeeSplit;
pub use balances::BalanceLedger;
pub use config::EngineConfig;
pub use engine::{
    CountingSequence, LedgerEngine, RecordingTransfers, SequenceSource, ValueTransfer,
};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use registry::CollectibleRegistry;
pub use traits_gen::{EntropySource, StaticEntropy};
pub use types::{
    AccountId, Amount, Collectible, ConfigSnapshot, EventKind, EventRecord, HolderSummary,
    PurchaseQuote, BPS_DENOMINATOR, HOLD_THRESHOLD, MAX_FEE_BPS, MAX_SUPPLY, MINT_BATCH_CAP,
    ONE_TOKEN, TRAIT_COUNT,
};
