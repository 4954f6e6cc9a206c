//! Main ledger engine orchestration layer
//!
//! This module ties together the balance ledger, collectible registry, trait
//! generator, and sales accounting into the public operation surface. Every
//! mutating entry point runs under a reentrancy guard and the pause /
//! authorization checks; each call either commits entirely or has no effect.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use collectible_ledger::{
//!     AccountId, CountingSequence, EngineConfig, LedgerEngine, RecordingTransfers,
//!     StaticEntropy,
//! };
//!
//! fn main() -> collectible_ledger::Result<()> {
//!     let engine = LedgerEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(StaticEntropy([0u8; 32])),
//!         Arc::new(RecordingTransfers::accepting()),
//!         Arc::new(CountingSequence::new()),
//!     )?;
//!
//!     let alice = AccountId::new("alice");
//!     let tokens = engine.buy(&alice, 5_000_000_000_000)?;
//!     assert_eq!(engine.balance_of(&alice), tokens);
//!     Ok(())
//! }
//! ```

use crate::{
    accounting::{self, FeeSplit},
    balances::BalanceLedger,
    config::EngineConfig,
    metrics::Metrics,
    registry::CollectibleRegistry,
    traits_gen::{self, EntropySource},
    types::{
        AccountId, Amount, Collectible, ConfigSnapshot, EventKind, EventRecord, HolderSummary,
        PurchaseQuote, HOLD_THRESHOLD, MAX_FEE_BPS, MINT_BATCH_CAP, TRAIT_COUNT,
    },
    Error, Result,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External value-transfer primitive
///
/// Sends external base units to an address outside the ledger. The recipient
/// may reject the transfer; a `false` return fails the enclosing operation
/// with [`Error::TransferFailed`] and rolls back its state changes.
pub trait ValueTransfer: Send + Sync {
    /// Attempt to send `amount` to `to`; `true` on success
    fn send(&self, to: &AccountId, amount: Amount) -> bool;
}

/// Source of the host's monotonic execution sequence number
///
/// Stamped on every event record and on collectibles at mint time for
/// auditability.
pub trait SequenceSource: Send + Sync {
    /// The current execution sequence number
    fn current(&self) -> u64;
}

/// Sequence source that increments on every read
///
/// Stands in for the host counter in tests and examples.
#[derive(Debug, Default)]
pub struct CountingSequence(std::sync::atomic::AtomicU64);

impl CountingSequence {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceSource for CountingSequence {
    fn current(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Value-transfer sink that records every send
///
/// Accepts or rejects all transfers depending on construction. Useful for
/// tests and examples; real deployments wire in the host transfer primitive.
#[derive(Debug)]
pub struct RecordingTransfers {
    accept: bool,
    sent: Mutex<Vec<(AccountId, Amount)>>,
}

impl RecordingTransfers {
    /// Sink that accepts every transfer
    pub fn accepting() -> Self {
        Self {
            accept: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Sink that rejects every transfer
    pub fn rejecting() -> Self {
        Self {
            accept: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All transfers attempted so far (accepted or not)
    pub fn sent(&self) -> Vec<(AccountId, Amount)> {
        self.sent.lock().clone()
    }
}

impl ValueTransfer for RecordingTransfers {
    fn send(&self, to: &AccountId, amount: Amount) -> bool {
        self.sent.lock().push((to.clone(), amount));
        self.accept
    }
}

/// Durable engine state (everything the host persists between calls)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineState {
    config: EngineConfig,
    balances: BalanceLedger,
    registry: CollectibleRegistry,
    treasury: Amount,
    events: Vec<EventRecord>,
}

impl EngineState {
    fn ensure_active(&self) -> Result<()> {
        if self.config.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }

    fn is_admin(&self, caller: &AccountId) -> bool {
        *caller == self.config.admin
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<()> {
        if !self.is_admin(caller) {
            return Err(Error::NotAuthorized(caller.to_string()));
        }
        Ok(())
    }

    fn ensure_privileged_minter(&self, caller: &AccountId) -> Result<()> {
        if !self.is_admin(caller) && *caller != self.config.minter {
            return Err(Error::NotAuthorized(caller.to_string()));
        }
        Ok(())
    }

    fn record(&mut self, sequence: u64, kind: EventKind) {
        self.events.push(EventRecord {
            index: self.events.len() as u64,
            sequence,
            at: Utc::now(),
            kind,
        });
    }
}

/// Ledger engine: token ledger + collectible registry + sales accounting
///
/// All operations take an explicit `caller`; the engine compares it against
/// the stored role addresses instead of relying on ambient identity. External
/// collaborators (entropy, value transfer, sequence counter) are injected.
pub struct LedgerEngine {
    /// Engine state (single-writer; the host serializes mutating calls)
    state: Mutex<EngineState>,

    /// Operation-in-progress flag backing the reentrancy guard
    entered: AtomicBool,

    /// Block-level entropy for trait assignment
    entropy: Arc<dyn EntropySource>,

    /// External value-transfer primitive
    transfers: Arc<dyn ValueTransfer>,

    /// Host execution sequence counter
    sequence: Arc<dyn SequenceSource>,

    /// Prometheus metrics
    metrics: Metrics,
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("entered", &self.entered.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// RAII reentrancy guard; clears the flag on every exit path
struct OpGuard<'a>(&'a AtomicBool);

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LedgerEngine {
    /// Create a new engine from a validated configuration
    pub fn new(
        config: EngineConfig,
        entropy: Arc<dyn EntropySource>,
        transfers: Arc<dyn ValueTransfer>,
        sequence: Arc<dyn SequenceSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(EngineState {
                config,
                balances: BalanceLedger::new(),
                registry: CollectibleRegistry::new(),
                treasury: 0,
                events: Vec::new(),
            }),
            entered: AtomicBool::new(false),
            entropy,
            transfers,
            sequence,
            metrics: Metrics::new()?,
        })
    }

    /// Metrics collector (for export by the host)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Acquire the reentrancy guard; a nested call fails immediately
    fn enter(&self) -> Result<OpGuard<'_>> {
        if self.entered.swap(true, Ordering::SeqCst) {
            return Err(Error::Reentrancy);
        }
        Ok(OpGuard(&self.entered))
    }

    // --- token operations ---

    /// Buy tokens with external value; returns the tokens credited
    pub fn buy(&self, caller: &AccountId, payment: Amount) -> Result<Amount> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let (tokens, split, recipient) = {
            let mut st = self.state.lock();
            st.ensure_active()?;
            if caller.is_empty() {
                return Err(Error::ZeroAddress);
            }
            if payment == 0 {
                return Err(Error::ZeroAmount);
            }
            let tokens = accounting::quote_tokens_for_payment(payment, st.config.token_price)?;
            let split = accounting::split(payment, st.config.fee_bps)?;
            st.treasury = st
                .treasury
                .checked_add(split.treasury)
                .ok_or(Error::ArithmeticOverflow("treasury accrual"))?;
            st.balances.credit(caller, tokens)?;
            st.record(
                seq,
                EventKind::Purchase {
                    buyer: caller.clone(),
                    payment,
                    tokens,
                    fee: split.fee,
                    treasury: split.treasury,
                },
            );
            (tokens, split, st.config.fee_recipient.clone())
        };

        // Ledger mutation is recorded before the external fee send; a failed
        // send rolls the whole operation back (all-or-nothing contract).
        if split.fee > 0 && !self.transfers.send(&recipient, split.fee) {
            let mut st = self.state.lock();
            st.treasury -= split.treasury;
            st.balances.revert_credit(caller, tokens);
            st.events.pop();
            tracing::warn!(%caller, payment, "buy rolled back: fee send failed");
            return Err(Error::TransferFailed);
        }

        tracing::info!(%caller, payment, tokens, fee = split.fee, "tokens purchased");
        self.metrics.operations_total.inc();
        self.metrics.purchases_total.inc();
        Ok(tokens)
    }

    /// Transfer tokens from the caller to another account
    pub fn transfer(&self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.balances.transfer(caller, to, amount)?;
        st.record(
            seq,
            EventKind::TokensTransferred {
                from: caller.clone(),
                to: to.clone(),
                amount,
            },
        );
        tracing::info!(from = %caller, %to, amount, "tokens transferred");
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Privileged mint of tokens to an account (administrator or minter role)
    pub fn admin_mint(&self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.ensure_privileged_minter(caller)?;
        if to.is_empty() {
            return Err(Error::ZeroAddress);
        }
        st.balances.credit(to, amount)?;
        st.record(
            seq,
            EventKind::TokensMinted {
                to: to.clone(),
                amount,
            },
        );
        tracing::info!(%to, amount, "tokens minted");
        self.metrics.operations_total.inc();
        self.metrics.tokens_minted_total.inc();
        Ok(())
    }

    /// Privileged batch mint; validated up front so it fails before any credit
    pub fn admin_mint_batch(
        &self,
        caller: &AccountId,
        tos: &[AccountId],
        amounts: &[Amount],
    ) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.ensure_privileged_minter(caller)?;
        if tos.len() != amounts.len() || tos.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "batch length mismatch: {} recipients, {} amounts",
                tos.len(),
                amounts.len()
            )));
        }

        // Validate the whole batch before mutating anything
        let mut total: Amount = 0;
        for (to, &amount) in tos.iter().zip(amounts) {
            if to.is_empty() {
                return Err(Error::ZeroAddress);
            }
            if amount == 0 {
                return Err(Error::ZeroAmount);
            }
            total = total
                .checked_add(amount)
                .ok_or(Error::ArithmeticOverflow("batch mint total"))?;
        }
        st.balances
            .total_supply()
            .checked_add(total)
            .ok_or(Error::ArithmeticOverflow("total supply"))?;

        for (to, &amount) in tos.iter().zip(amounts) {
            st.balances.credit(to, amount)?;
            st.record(
                seq,
                EventKind::TokensMinted {
                    to: to.clone(),
                    amount,
                },
            );
        }
        tracing::info!(count = tos.len(), total, "token batch minted");
        self.metrics.operations_total.inc();
        self.metrics.tokens_minted_total.inc_by(tos.len() as u64);
        Ok(())
    }

    /// Burn tokens from the caller's balance
    pub fn burn(&self, caller: &AccountId, amount: Amount) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.balances.burn(caller, amount)?;
        st.record(
            seq,
            EventKind::TokensBurned {
                from: caller.clone(),
                amount,
            },
        );
        tracing::info!(%caller, amount, "tokens burned");
        self.metrics.operations_total.inc();
        self.metrics.tokens_burned_total.inc();
        Ok(())
    }

    // --- collectible operations ---

    /// Mint one collectible to the caller
    ///
    /// Requires either `payment >= collectible_mint_price` or a token balance
    /// of at least [`HOLD_THRESHOLD`]. Paid mints are fee-split like
    /// purchases.
    pub fn mint_collectible(&self, caller: &AccountId, payment: Amount) -> Result<u64> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let seed = self.entropy.current_seed();

        let (id, split, recipient) = {
            let mut st = self.state.lock();
            st.ensure_active()?;
            if caller.is_empty() {
                return Err(Error::ZeroAddress);
            }
            let split = st.collectible_payment_split(caller, payment, 1)?;
            let trait_index = traits_gen::trait_for(&seed, caller, st.registry.next_id(), 0);
            let id = st.registry.mint_one(caller, trait_index, seq)?;
            st.treasury = st
                .treasury
                .checked_add(split.treasury)
                .ok_or(Error::ArithmeticOverflow("treasury accrual"))?;
            st.record(
                seq,
                EventKind::CollectibleMinted {
                    id,
                    owner: caller.clone(),
                    trait_index,
                },
            );
            if payment > 0 {
                st.record(
                    seq,
                    EventKind::CollectibleSale {
                        buyer: caller.clone(),
                        payment,
                        fee: split.fee,
                        treasury: split.treasury,
                        ids: vec![id],
                    },
                );
            }
            (id, split, st.config.fee_recipient.clone())
        };

        if split.fee > 0 && !self.transfers.send(&recipient, split.fee) {
            let mut st = self.state.lock();
            st.registry.rollback_last(1);
            st.treasury -= split.treasury;
            st.events.pop(); // sale
            st.events.pop(); // mint
            tracing::warn!(%caller, payment, "collectible mint rolled back: fee send failed");
            return Err(Error::TransferFailed);
        }

        tracing::info!(id, %caller, payment, "collectible minted");
        self.metrics.operations_total.inc();
        self.metrics.collectibles_minted_total.inc();
        Ok(id)
    }

    /// Privileged mint of a collectible with an explicit trait, to the caller
    pub fn admin_mint_collectible_with_trait(
        &self,
        caller: &AccountId,
        trait_index: u8,
    ) -> Result<u64> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.ensure_privileged_minter(caller)?;
        let id = st.registry.mint_one(caller, trait_index, seq)?;
        st.record(
            seq,
            EventKind::CollectibleMinted {
                id,
                owner: caller.clone(),
                trait_index,
            },
        );
        tracing::info!(id, %caller, trait_index, "collectible minted with explicit trait");
        self.metrics.operations_total.inc();
        self.metrics.collectibles_minted_total.inc();
        Ok(id)
    }

    /// Mint up to [`MINT_BATCH_CAP`] collectibles to the caller in one call
    ///
    /// Required payment and hold threshold both scale by `count`. Trait
    /// derivation hashes the batch's first id for every item; the per-item
    /// nonce alone disambiguates so a batch does not collapse onto identical
    /// outcomes.
    pub fn mint_collectible_batch(
        &self,
        caller: &AccountId,
        count: u64,
        payment: Amount,
    ) -> Result<Vec<u64>> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let seed = self.entropy.current_seed();

        let (ids, split, recipient) = {
            let mut st = self.state.lock();
            st.ensure_active()?;
            if caller.is_empty() {
                return Err(Error::ZeroAddress);
            }
            if count == 0 || count > MINT_BATCH_CAP {
                return Err(Error::InvalidArgument(format!(
                    "batch count {} outside 1..={}",
                    count, MINT_BATCH_CAP
                )));
            }
            let split = st.collectible_payment_split(caller, payment, count)?;

            let first_id = st.registry.next_id();
            let traits: Vec<u8> = (0..count)
                .map(|i| traits_gen::trait_for(&seed, caller, first_id, i as u32))
                .collect();
            let ids = st.registry.mint_many(caller, &traits, seq)?;

            st.treasury = st
                .treasury
                .checked_add(split.treasury)
                .ok_or(Error::ArithmeticOverflow("treasury accrual"))?;
            for (&id, &trait_index) in ids.iter().zip(&traits) {
                st.record(
                    seq,
                    EventKind::CollectibleMinted {
                        id,
                        owner: caller.clone(),
                        trait_index,
                    },
                );
            }
            if payment > 0 {
                st.record(
                    seq,
                    EventKind::CollectibleSale {
                        buyer: caller.clone(),
                        payment,
                        fee: split.fee,
                        treasury: split.treasury,
                        ids: ids.clone(),
                    },
                );
            }
            (ids, split, st.config.fee_recipient.clone())
        };

        if split.fee > 0 && !self.transfers.send(&recipient, split.fee) {
            let mut st = self.state.lock();
            st.registry.rollback_last(count);
            st.treasury -= split.treasury;
            let emitted = count as usize + usize::from(payment > 0);
            for _ in 0..emitted {
                st.events.pop();
            }
            tracing::warn!(%caller, count, payment, "batch mint rolled back: fee send failed");
            return Err(Error::TransferFailed);
        }

        tracing::info!(%caller, count, payment, "collectible batch minted");
        self.metrics.operations_total.inc();
        self.metrics.collectibles_minted_total.inc_by(count);
        Ok(ids)
    }

    /// Transfer a collectible owned by the caller
    pub fn transfer_collectible(&self, caller: &AccountId, to: &AccountId, id: u64) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_active()?;
        st.registry.transfer(caller, to, id)?;
        st.record(
            seq,
            EventKind::CollectibleTransferred {
                from: caller.clone(),
                to: to.clone(),
                id,
            },
        );
        tracing::info!(from = %caller, %to, id, "collectible transferred");
        self.metrics.operations_total.inc();
        self.metrics.collectible_transfers_total.inc();
        Ok(())
    }

    // --- treasury ---

    /// Pay out the accrued treasury balance to the treasury address
    ///
    /// The accrual is zeroed before the external send so a reentrant observer
    /// can never see (or re-spend) the pre-withdrawal balance. A failed send
    /// restores the accrual and fails the operation.
    pub fn withdraw_treasury(&self, caller: &AccountId) -> Result<Amount> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let (amount, to) = {
            let mut st = self.state.lock();
            st.ensure_active()?;
            if !st.is_admin(caller) && *caller != st.config.treasury {
                return Err(Error::NotAuthorized(caller.to_string()));
            }
            if st.treasury == 0 {
                return Err(Error::ZeroAmount);
            }
            let amount = st.treasury;
            st.treasury = 0;
            let to = st.config.treasury.clone();
            st.record(
                seq,
                EventKind::TreasuryWithdrawn {
                    to: to.clone(),
                    amount,
                },
            );
            (amount, to)
        };

        if !self.transfers.send(&to, amount) {
            let mut st = self.state.lock();
            st.treasury = amount;
            st.events.pop();
            tracing::warn!(amount, "treasury withdrawal rolled back: send failed");
            return Err(Error::TransferFailed);
        }

        tracing::info!(%to, amount, "treasury withdrawn");
        self.metrics.operations_total.inc();
        self.metrics.treasury_withdrawals_total.inc();
        Ok(amount)
    }

    // --- configuration (administrator only; exempt from the pause gate so
    // the administrator can always unpause) ---

    /// Set the global pause flag
    pub fn set_paused(&self, caller: &AccountId, paused: bool) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        st.config.paused = paused;
        st.record(seq, EventKind::PausedSet { paused });
        tracing::info!(paused, "pause flag set");
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Set the fee recipient address
    pub fn set_fee_recipient(&self, caller: &AccountId, recipient: AccountId) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        if recipient.is_empty() {
            return Err(Error::ZeroAddress);
        }
        st.config.fee_recipient = recipient.clone();
        st.record(seq, EventKind::FeeRecipientSet { recipient });
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Reassign the minter role
    pub fn set_minter_role(&self, caller: &AccountId, minter: AccountId) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        if minter.is_empty() {
            return Err(Error::ZeroAddress);
        }
        st.config.minter = minter.clone();
        st.record(seq, EventKind::MinterRoleSet { minter });
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Set the price per whole token
    pub fn set_token_price(&self, caller: &AccountId, price: Amount) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        st.config.token_price = price;
        st.record(seq, EventKind::TokenPriceSet { price });
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Set the per-item collectible mint price
    pub fn set_collectible_mint_price(&self, caller: &AccountId, price: Amount) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        st.config.collectible_mint_price = price;
        st.record(seq, EventKind::MintPriceSet { price });
        self.metrics.operations_total.inc();
        Ok(())
    }

    /// Set the sale fee rate in basis points (bounded by [`MAX_FEE_BPS`])
    pub fn set_fee_bps(&self, caller: &AccountId, fee_bps: u32) -> Result<()> {
        let _op = self.enter()?;
        let seq = self.sequence.current();
        let mut st = self.state.lock();
        st.ensure_admin(caller)?;
        if fee_bps > MAX_FEE_BPS {
            return Err(Error::InvalidArgument(format!(
                "fee_bps {} exceeds maximum {}",
                fee_bps, MAX_FEE_BPS
            )));
        }
        st.config.fee_bps = fee_bps;
        st.record(seq, EventKind::FeeBpsSet { fee_bps });
        self.metrics.operations_total.inc();
        Ok(())
    }

    // --- read surface (not gated; reads never mutate) ---

    /// Token balance of an account
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.state.lock().balances.balance_of(account)
    }

    /// Total token supply
    pub fn total_supply(&self) -> Amount {
        self.state.lock().balances.total_supply()
    }

    /// Accrued treasury balance pending withdrawal
    pub fn treasury_balance(&self) -> Amount {
        self.state.lock().treasury
    }

    /// Snapshot of the current configuration
    pub fn config_snapshot(&self) -> ConfigSnapshot {
        let st = self.state.lock();
        ConfigSnapshot {
            admin: st.config.admin.clone(),
            minter: st.config.minter.clone(),
            fee_recipient: st.config.fee_recipient.clone(),
            treasury: st.config.treasury.clone(),
            token_price: st.config.token_price,
            collectible_mint_price: st.config.collectible_mint_price,
            fee_bps: st.config.fee_bps,
            paused: st.config.paused,
        }
    }

    /// Quote a token purchase without executing it
    pub fn quote_buy(&self, payment: Amount) -> Result<PurchaseQuote> {
        let st = self.state.lock();
        let tokens = accounting::quote_tokens_for_payment(payment, st.config.token_price)?;
        let split = accounting::split(payment, st.config.fee_bps)?;
        Ok(PurchaseQuote {
            tokens,
            fee: split.fee,
            treasury: split.treasury,
        })
    }

    /// Payment value of a token amount at the current price
    pub fn quote_payment(&self, amount: Amount) -> Result<Amount> {
        let st = self.state.lock();
        accounting::quote_payment_for_tokens(amount, st.config.token_price)
    }

    /// Required payment for a collectible batch of the given size
    pub fn collectible_mint_cost(&self, count: u64) -> Result<Amount> {
        if count == 0 || count > MINT_BATCH_CAP {
            return Err(Error::InvalidArgument(format!(
                "batch count {} outside 1..={}",
                count, MINT_BATCH_CAP
            )));
        }
        let st = self.state.lock();
        st.config
            .collectible_mint_price
            .checked_mul(count as Amount)
            .ok_or(Error::ArithmeticOverflow("mint cost"))
    }

    /// Look up a collectible by id
    pub fn collectible(&self, id: u64) -> Result<Collectible> {
        self.state.lock().registry.get(id).cloned()
    }

    /// Look up several collectibles; fails on the first unminted id
    pub fn collectibles(&self, ids: &[u64]) -> Result<Vec<Collectible>> {
        self.state.lock().registry.get_batch(ids)
    }

    /// Ids owned by an account (unordered)
    pub fn collectibles_of(&self, owner: &AccountId) -> Vec<u64> {
        self.state.lock().registry.owned_by(owner)
    }

    /// Page through all collectibles in mint order
    pub fn collectible_page(&self, offset: u64, limit: u64) -> Vec<Collectible> {
        self.state.lock().registry.page(offset, limit)
    }

    /// Ids carrying a given trait
    pub fn collectibles_with_trait(&self, trait_index: u8) -> Vec<u64> {
        self.state.lock().registry.ids_with_trait(trait_index)
    }

    /// The `n` most recently minted collectibles, newest first
    pub fn recent_collectibles(&self, n: u64) -> Vec<Collectible> {
        self.state.lock().registry.recent(n)
    }

    /// Collectibles with ids in `[from_id, to_id]`
    pub fn collectible_range(&self, from_id: u64, to_id: u64) -> Result<Vec<Collectible>> {
        self.state.lock().registry.range(from_id, to_id)
    }

    /// Whether an id has been minted
    pub fn collectible_exists(&self, id: u64) -> bool {
        self.state.lock().registry.exists(id)
    }

    /// Count of minted collectibles per trait index
    pub fn trait_counts(&self) -> [u64; TRAIT_COUNT as usize] {
        self.state.lock().registry.trait_counts()
    }

    /// Rarity of a trait in basis points of the minted set
    pub fn trait_rarity_bps(&self, trait_index: u8) -> Result<u64> {
        self.state.lock().registry.rarity_bps(trait_index)
    }

    /// Total collectibles minted so far
    pub fn total_collectibles(&self) -> u64 {
        self.state.lock().registry.total_minted()
    }

    /// Collectibles still mintable before the cap
    pub fn remaining_collectibles(&self) -> u64 {
        self.state.lock().registry.remaining_capacity()
    }

    /// Aggregated holder dashboard: balance plus collectible holdings
    pub fn holder_summary(&self, account: &AccountId) -> HolderSummary {
        let st = self.state.lock();
        let collectible_ids = st.registry.owned_by(account);
        let mut trait_counts = [0u64; TRAIT_COUNT as usize];
        for &id in &collectible_ids {
            if let Ok(item) = st.registry.get(id) {
                trait_counts[item.trait_index as usize] += 1;
            }
        }
        HolderSummary {
            account: account.clone(),
            balance: st.balances.balance_of(account),
            collectible_ids,
            trait_counts,
        }
    }

    /// Full event log
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().events.clone()
    }

    /// Events at or after a log index
    pub fn events_since(&self, index: u64) -> Vec<EventRecord> {
        self.state
            .lock()
            .events
            .iter()
            .skip(index as usize)
            .cloned()
            .collect()
    }
}

impl EngineState {
    /// Gate and split the payment for a collectible mint of `count` items
    ///
    /// Zero payment requires a held balance of `count x HOLD_THRESHOLD`; a
    /// non-zero payment must cover `count x collectible_mint_price` and is
    /// fee-split like a purchase.
    fn collectible_payment_split(
        &self,
        caller: &AccountId,
        payment: Amount,
        count: u64,
    ) -> Result<FeeSplit> {
        if payment == 0 {
            let required = HOLD_THRESHOLD
                .checked_mul(count as Amount)
                .ok_or(Error::ArithmeticOverflow("hold requirement"))?;
            let balance = self.balances.balance_of(caller);
            if balance < required {
                return Err(Error::HoldRequirementNotMet { balance, required });
            }
            return Ok(FeeSplit {
                fee: 0,
                treasury: 0,
            });
        }

        let required = self
            .config
            .collectible_mint_price
            .checked_mul(count as Amount)
            .ok_or(Error::ArithmeticOverflow("mint cost"))?;
        if payment < required {
            return Err(Error::InsufficientPayment);
        }
        accounting::split(payment, self.config.fee_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits_gen::StaticEntropy;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn admin() -> AccountId {
        AccountId::new("admin")
    }

    fn test_engine() -> LedgerEngine {
        LedgerEngine::new(
            EngineConfig::default(),
            Arc::new(StaticEntropy([3u8; 32])),
            Arc::new(RecordingTransfers::accepting()),
            Arc::new(CountingSequence::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_buy_credits_and_splits() {
        let engine = test_engine();
        // price 10^12, payment 5x10^12, fee 500 bps
        let payment = 5_000_000_000_000u128;
        let tokens = engine.buy(&alice(), payment).unwrap();
        assert_eq!(tokens, 5 * crate::types::ONE_TOKEN);
        assert_eq!(engine.balance_of(&alice()), tokens);

        let fee = payment * 500 / 10_000;
        assert_eq!(fee, 250_000_000_000);
        assert_eq!(engine.treasury_balance(), payment - fee);
    }

    #[test]
    fn test_buy_zero_payment() {
        let engine = test_engine();
        assert_eq!(engine.buy(&alice(), 0), Err(Error::ZeroAmount));
    }

    #[test]
    fn test_buy_unpriced_fails() {
        let engine = test_engine();
        engine.set_token_price(&admin(), 0).unwrap();
        assert_eq!(engine.buy(&alice(), 1_000), Err(Error::PriceZero));
    }

    #[test]
    fn test_buy_fee_send_failure_rolls_back() {
        let engine = LedgerEngine::new(
            EngineConfig::default(),
            Arc::new(StaticEntropy([3u8; 32])),
            Arc::new(RecordingTransfers::rejecting()),
            Arc::new(CountingSequence::new()),
        )
        .unwrap();

        let err = engine.buy(&alice(), 5_000_000_000_000).unwrap_err();
        assert_eq!(err, Error::TransferFailed);
        assert_eq!(engine.balance_of(&alice()), 0);
        assert_eq!(engine.total_supply(), 0);
        assert_eq!(engine.treasury_balance(), 0);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_pause_gates_value_ops_but_not_config() {
        let engine = test_engine();
        engine.set_paused(&admin(), true).unwrap();

        assert_eq!(engine.buy(&alice(), 1_000), Err(Error::Paused));
        assert_eq!(
            engine.mint_collectible(&alice(), 1_000_000),
            Err(Error::Paused)
        );
        assert_eq!(engine.withdraw_treasury(&admin()), Err(Error::Paused));

        // Administrator can still reconfigure and unpause
        engine.set_fee_bps(&admin(), 250).unwrap();
        engine.set_paused(&admin(), false).unwrap();
        engine.buy(&alice(), 5_000_000_000_000).unwrap();
    }

    #[test]
    fn test_config_setters_require_admin() {
        let engine = test_engine();
        assert!(matches!(
            engine.set_paused(&alice(), true),
            Err(Error::NotAuthorized(_))
        ));
        assert!(matches!(
            engine.set_fee_bps(&alice(), 100),
            Err(Error::NotAuthorized(_))
        ));
    }

    #[test]
    fn test_fee_bps_cap() {
        let engine = test_engine();
        assert!(matches!(
            engine.set_fee_bps(&admin(), 1_001),
            Err(Error::InvalidArgument(_))
        ));
        engine.set_fee_bps(&admin(), 1_000).unwrap();
    }

    #[test]
    fn test_admin_mint_and_burn() {
        let engine = test_engine();
        engine.admin_mint(&admin(), &alice(), 500).unwrap();
        assert_eq!(engine.total_supply(), 500);
        engine.burn(&alice(), 200).unwrap();
        assert_eq!(engine.balance_of(&alice()), 300);
        assert_eq!(engine.total_supply(), 300);
    }

    #[test]
    fn test_admin_mint_requires_role() {
        let engine = test_engine();
        assert!(matches!(
            engine.admin_mint(&alice(), &alice(), 500),
            Err(Error::NotAuthorized(_))
        ));
        // Minter role also qualifies
        engine
            .admin_mint(&AccountId::new("minter"), &alice(), 500)
            .unwrap();
    }

    #[test]
    fn test_admin_mint_batch_validates_before_mutating() {
        let engine = test_engine();
        let err = engine
            .admin_mint_batch(
                &admin(),
                &[alice(), AccountId::new("")],
                &[100, 200],
            )
            .unwrap_err();
        assert_eq!(err, Error::ZeroAddress);
        assert_eq!(engine.total_supply(), 0);

        assert!(matches!(
            engine.admin_mint_batch(&admin(), &[alice()], &[100, 200]),
            Err(Error::InvalidArgument(_))
        ));

        engine
            .admin_mint_batch(&admin(), &[alice(), AccountId::new("bob")], &[100, 200])
            .unwrap();
        assert_eq!(engine.total_supply(), 300);
    }

    #[test]
    fn test_paid_mint_collectible() {
        let engine = test_engine();
        let price = engine.config_snapshot().collectible_mint_price;
        let id = engine.mint_collectible(&alice(), price).unwrap();
        assert_eq!(id, 1);

        let item = engine.collectible(id).unwrap();
        assert_eq!(item.owner, alice());
        assert!(item.trait_index < TRAIT_COUNT);

        let split = accounting::split(price, 500).unwrap();
        assert_eq!(engine.treasury_balance(), split.treasury);
    }

    #[test]
    fn test_underpaid_mint_rejected() {
        let engine = test_engine();
        let price = engine.config_snapshot().collectible_mint_price;
        assert_eq!(
            engine.mint_collectible(&alice(), price - 1),
            Err(Error::InsufficientPayment)
        );
    }

    #[test]
    fn test_hold_threshold_gate() {
        let engine = test_engine();
        // Just below the threshold: free mint rejected
        engine
            .admin_mint(&admin(), &alice(), HOLD_THRESHOLD - 1)
            .unwrap();
        assert!(matches!(
            engine.mint_collectible(&alice(), 0),
            Err(Error::HoldRequirementNotMet { .. })
        ));

        // At the threshold: free mint allowed
        engine.admin_mint(&admin(), &alice(), 1).unwrap();
        let id = engine.mint_collectible(&alice(), 0).unwrap();
        assert_eq!(id, 1);
        assert_eq!(engine.treasury_balance(), 0);
    }

    #[test]
    fn test_batch_mint_scales_requirements() {
        let engine = test_engine();
        let price = engine.config_snapshot().collectible_mint_price;

        assert_eq!(
            engine.mint_collectible_batch(&alice(), 3, 3 * price - 1),
            Err(Error::InsufficientPayment)
        );

        let ids = engine
            .mint_collectible_batch(&alice(), 3, 3 * price)
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(engine.collectibles_of(&alice()).len(), 3);
    }

    #[test]
    fn test_batch_count_bounds() {
        let engine = test_engine();
        assert!(matches!(
            engine.mint_collectible_batch(&alice(), 0, 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.mint_collectible_batch(&alice(), MINT_BATCH_CAP + 1, Amount::MAX),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_explicit_trait_mint() {
        let engine = test_engine();
        let id = engine
            .admin_mint_collectible_with_trait(&admin(), 11)
            .unwrap();
        assert_eq!(engine.collectible(id).unwrap().trait_index, 11);

        assert!(matches!(
            engine.admin_mint_collectible_with_trait(&admin(), TRAIT_COUNT),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.admin_mint_collectible_with_trait(&alice(), 1),
            Err(Error::NotAuthorized(_))
        ));
    }

    #[test]
    fn test_transfer_collectible_ownership_check() {
        let engine = test_engine();
        let price = engine.config_snapshot().collectible_mint_price;
        let id = engine.mint_collectible(&alice(), price).unwrap();

        let bob = AccountId::new("bob");
        assert!(matches!(
            engine.transfer_collectible(&bob, &alice(), id),
            Err(Error::NotOwner { .. })
        ));

        engine.transfer_collectible(&alice(), &bob, id).unwrap();
        assert_eq!(engine.collectible(id).unwrap().owner, bob);
        assert!(engine.collectibles_of(&alice()).is_empty());
        assert_eq!(engine.collectibles_of(&bob), vec![id]);
    }

    #[test]
    fn test_withdraw_treasury() {
        let transfers = Arc::new(RecordingTransfers::accepting());
        let engine = LedgerEngine::new(
            EngineConfig::default(),
            Arc::new(StaticEntropy([3u8; 32])),
            transfers.clone(),
            Arc::new(CountingSequence::new()),
        )
        .unwrap();

        // Nothing accrued yet
        assert_eq!(engine.withdraw_treasury(&admin()), Err(Error::ZeroAmount));

        let payment = 5_000_000_000_000u128;
        engine.buy(&alice(), payment).unwrap();
        let accrued = engine.treasury_balance();

        // Unauthorized caller
        assert!(matches!(
            engine.withdraw_treasury(&alice()),
            Err(Error::NotAuthorized(_))
        ));

        let paid = engine.withdraw_treasury(&admin()).unwrap();
        assert_eq!(paid, accrued);
        assert_eq!(engine.treasury_balance(), 0);

        let sent = transfers.sent();
        assert_eq!(sent.last().unwrap(), &(AccountId::new("treasury"), accrued));

        // Treasury address itself may also withdraw
        engine.buy(&alice(), payment).unwrap();
        engine
            .withdraw_treasury(&AccountId::new("treasury"))
            .unwrap();
    }

    #[test]
    fn test_withdraw_send_failure_restores_accrual() {
        let engine = LedgerEngine::new(
            EngineConfig {
                fee_bps: 0,
                ..Default::default()
            },
            Arc::new(StaticEntropy([3u8; 32])),
            Arc::new(RecordingTransfers::rejecting()),
            Arc::new(CountingSequence::new()),
        )
        .unwrap();

        // fee_bps 0 so buy succeeds without a fee send
        engine.buy(&alice(), 5_000_000_000_000).unwrap();
        let accrued = engine.treasury_balance();
        assert!(accrued > 0);

        assert_eq!(
            engine.withdraw_treasury(&admin()),
            Err(Error::TransferFailed)
        );
        assert_eq!(engine.treasury_balance(), accrued);
    }

    #[test]
    fn test_events_carry_sequence_and_index() {
        let engine = test_engine();
        engine.buy(&alice(), 5_000_000_000_000).unwrap();
        engine.admin_mint(&admin(), &alice(), 100).unwrap();

        let events = engine.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].index, 0);
        assert_eq!(events[1].index, 1);
        // CountingSequence hands out increasing sequence numbers
        assert!(events[1].sequence > events[0].sequence);
        assert!(matches!(events[0].kind, EventKind::Purchase { .. }));

        assert_eq!(engine.events_since(1).len(), 1);
    }

    #[test]
    fn test_holder_summary() {
        let engine = test_engine();
        let price = engine.config_snapshot().collectible_mint_price;
        engine.buy(&alice(), 5_000_000_000_000).unwrap();
        engine.mint_collectible_batch(&alice(), 2, 2 * price).unwrap();

        let summary = engine.holder_summary(&alice());
        assert_eq!(summary.balance, engine.balance_of(&alice()));
        assert_eq!(summary.collectible_ids.len(), 2);
        assert_eq!(summary.trait_counts.iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_quotes_match_execution() {
        let engine = test_engine();
        let payment = 7_777_000_000_000u128;
        let quote = engine.quote_buy(payment).unwrap();
        let tokens = engine.buy(&alice(), payment).unwrap();
        assert_eq!(quote.tokens, tokens);
        assert_eq!(quote.fee + quote.treasury, payment);
        assert_eq!(engine.treasury_balance(), quote.treasury);
    }
}
