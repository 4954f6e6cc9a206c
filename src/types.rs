//! Core types for the collectible ledger
//!
//! All types are designed for:
//! - Deterministic serialization (serde)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (u128 base units, checked operations)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fungible amount in base units (18 implied fractional digits)
pub type Amount = u128;

/// One whole token in base units
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Number of distinct collectible traits
pub const TRAIT_COUNT: u8 = 16;

/// Hard cap on the number of collectibles that can ever be minted
pub const MAX_SUPPLY: u64 = 10_000;

/// Maximum collectibles mintable in one batch call
pub const MINT_BATCH_CAP: u64 = 8;

/// Basis-point denominator for fee rates
pub const BPS_DENOMINATOR: Amount = 10_000;

/// Highest configurable fee rate (10%)
pub const MAX_FEE_BPS: u32 = 1_000;

/// Token balance that entitles a holder to free collectible mints
pub const HOLD_THRESHOLD: Amount = 1_000 * ONE_TOKEN;

/// Account identifier (externally assigned address string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty address is the "null" account and never a valid party
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A minted collectible
///
/// Existence is permanent: once minted the id is never reused and the item is
/// never destroyed. The trait index is fixed at mint time; only the owner
/// changes, via transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    /// Sequential id, assigned starting at 1
    pub id: u64,

    /// Current owner (never the empty address)
    pub owner: AccountId,

    /// Trait index in [0, TRAIT_COUNT)
    pub trait_index: u8,

    /// Host execution sequence number at mint time (audit marker)
    pub minted_seq: u64,
}

/// Event record appended for every committed mutation
///
/// `index` is the local position in the event log; `sequence` is the host
/// execution sequence number at commit time, for ordering by external
/// observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the engine's event log (0-based, dense)
    pub index: u64,

    /// Host execution sequence number
    pub sequence: u64,

    /// Commit timestamp
    pub at: DateTime<Utc>,

    /// What happened
    pub kind: EventKind,
}

/// State transition carried by an event record
///
/// Each variant carries enough fields to reconstruct the state delta it
/// describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Tokens purchased with external value
    Purchase {
        /// Buying account
        buyer: AccountId,
        /// Payment in external base units
        payment: Amount,
        /// Tokens credited to the buyer
        tokens: Amount,
        /// Portion of the payment forwarded to the fee recipient
        fee: Amount,
        /// Portion of the payment accrued to the treasury
        treasury: Amount,
    },
    /// Tokens moved between accounts
    TokensTransferred {
        /// Sending account
        from: AccountId,
        /// Receiving account
        to: AccountId,
        /// Amount moved
        amount: Amount,
    },
    /// Tokens created by a privileged mint
    TokensMinted {
        /// Receiving account
        to: AccountId,
        /// Amount created
        amount: Amount,
    },
    /// Tokens destroyed by their holder
    TokensBurned {
        /// Burning account
        from: AccountId,
        /// Amount destroyed
        amount: Amount,
    },
    /// A collectible was minted (one event per item, batches included)
    CollectibleMinted {
        /// Assigned id
        id: u64,
        /// Initial owner
        owner: AccountId,
        /// Assigned trait
        trait_index: u8,
    },
    /// Payment sub-effect of a paid collectible mint (single or batch)
    CollectibleSale {
        /// Paying account
        buyer: AccountId,
        /// Total payment for the mint call
        payment: Amount,
        /// Portion forwarded to the fee recipient
        fee: Amount,
        /// Portion accrued to the treasury
        treasury: Amount,
        /// Ids minted by the call
        ids: Vec<u64>,
    },
    /// A collectible changed owner
    CollectibleTransferred {
        /// Previous owner
        from: AccountId,
        /// New owner
        to: AccountId,
        /// Collectible id
        id: u64,
    },
    /// Accrued treasury proceeds were paid out
    TreasuryWithdrawn {
        /// Receiving address
        to: AccountId,
        /// Amount paid out
        amount: Amount,
    },
    /// Pause flag changed
    PausedSet {
        /// New flag value
        paused: bool,
    },
    /// Fee recipient changed
    FeeRecipientSet {
        /// New recipient
        recipient: AccountId,
    },
    /// Minter role reassigned
    MinterRoleSet {
        /// New minter
        minter: AccountId,
    },
    /// Token price changed
    TokenPriceSet {
        /// New price per whole token, in external base units
        price: Amount,
    },
    /// Collectible mint price changed
    MintPriceSet {
        /// New per-item mint price
        price: Amount,
    },
    /// Fee rate changed
    FeeBpsSet {
        /// New rate in basis points
        fee_bps: u32,
    },
}

/// Read-only snapshot of the engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Administrator address
    pub admin: AccountId,
    /// Minter role address
    pub minter: AccountId,
    /// Fee recipient address
    pub fee_recipient: AccountId,
    /// Treasury payout address
    pub treasury: AccountId,
    /// Price per whole token
    pub token_price: Amount,
    /// Per-item collectible mint price
    pub collectible_mint_price: Amount,
    /// Fee rate in basis points
    pub fee_bps: u32,
    /// Pause flag
    pub paused: bool,
}

/// Quote for a prospective token purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseQuote {
    /// Tokens the payment would buy
    pub tokens: Amount,
    /// Fee portion of the payment
    pub fee: Amount,
    /// Treasury portion of the payment
    pub treasury: Amount,
}

/// Aggregated per-holder view (balance plus collectible holdings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSummary {
    /// The holder
    pub account: AccountId,
    /// Fungible balance in base units
    pub balance: Amount,
    /// Owned collectible ids (unordered)
    pub collectible_ids: Vec<u64>,
    /// Count of owned collectibles per trait index
    pub trait_counts: [u64; TRAIT_COUNT as usize],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_empty() {
        assert!(AccountId::new("").is_empty());
        assert!(!AccountId::new("alice").is_empty());
    }

    #[test]
    fn test_event_record_serde_roundtrip() {
        let record = EventRecord {
            index: 3,
            sequence: 99,
            at: Utc::now(),
            kind: EventKind::Purchase {
                buyer: AccountId::new("alice"),
                payment: 5_000_000_000_000,
                tokens: 5 * ONE_TOKEN,
                fee: 250_000_000_000,
                treasury: 4_750_000_000_000,
            },
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_hold_threshold_is_thousand_tokens() {
        assert_eq!(HOLD_THRESHOLD, 1_000u128 * 10u128.pow(18));
    }
}
