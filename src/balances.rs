//! Fungible balance ledger
//!
//! Tracks account balances and total supply with checked arithmetic. The
//! conservation invariant (sum of balances == total supply) holds after every
//! committed operation: supply changes only through [`BalanceLedger::credit`]
//! and [`BalanceLedger::burn`], and transfers move balance without touching
//! supply. Accounts persist at zero; entries are never removed.

use crate::types::{AccountId, Amount};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Account balance book
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    balances: HashMap<AccountId, Amount>,
    total_supply: Amount,
}

impl BalanceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account (zero for accounts never seen)
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total token supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Number of accounts with a ledger entry (including zero balances)
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Mint tokens: increase an account's balance and the total supply
    pub fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        // Check the supply bound before touching either field so a failed
        // credit leaves no partial change. Any single balance <= supply, so a
        // supply that fits implies the balance fits.
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow("total supply"))?;
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance += amount;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Decrease an account's balance without changing supply
    pub fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let balance = self.balances.entry(account.clone()).or_insert(0);
        if *balance < amount {
            return Err(Error::InsufficientBalance {
                available: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    /// Destroy tokens: decrease balance and total supply together
    pub fn burn(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        self.debit(account, amount)?;
        // debit verified balance >= amount, and supply >= any single balance
        self.total_supply -= amount;
        Ok(())
    }

    /// Move tokens between accounts
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if to.is_empty() {
            return Err(Error::ZeroAddress);
        }
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        // Receiving side cannot overflow: every balance is bounded by the
        // total supply, which already fits in the amount type.
        self.debit(from, amount)?;
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    /// Undo a credit applied earlier in the same operation
    ///
    /// Only used by the engine to realize all-or-nothing semantics when an
    /// external fee send fails after the credit has been applied. Never
    /// reachable through the public operation surface.
    pub(crate) fn revert_credit(&mut self, account: &AccountId, amount: Amount) {
        if let Some(balance) = self.balances.get_mut(account) {
            *balance = balance.saturating_sub(amount);
        }
        self.total_supply = self.total_supply.saturating_sub(amount);
    }

    /// Sum of all balances (invariant checking; linear over holders)
    pub fn balance_sum(&self) -> Amount {
        self.balances.values().copied().sum()
    }
}
