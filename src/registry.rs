//! Capped collectible registry
//!
//! Ids are assigned sequentially starting at 1 and never reused. A minted
//! collectible is permanent: there is no burn path, only ownership transfer.
//! The per-owner reverse index mirrors the owner field exactly; removal uses
//! swap-remove since ordering within an owner's holdings is not significant.

use crate::types::{AccountId, Collectible, MAX_SUPPLY, TRAIT_COUNT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registry of all minted collectibles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectibleRegistry {
    /// id -> collectible
    items: HashMap<u64, Collectible>,

    /// owner -> owned ids (unordered)
    by_owner: HashMap<AccountId, Vec<u64>>,

    /// Append-only global mint order (enumeration, pagination, recency)
    all_ids: Vec<u64>,

    /// Next id to assign (ids start at 1)
    next_id: u64,
}

impl Default for CollectibleRegistry {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            by_owner: HashMap::new(),
            all_ids: Vec::new(),
            next_id: 1,
        }
    }
}

impl CollectibleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Total collectibles minted so far
    pub fn total_minted(&self) -> u64 {
        self.all_ids.len() as u64
    }

    /// Collectibles still mintable before the cap
    pub fn remaining_capacity(&self) -> u64 {
        MAX_SUPPLY - self.total_minted()
    }

    /// The id the next successful mint will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Mint one collectible with a pre-assigned trait
    pub fn mint_one(&mut self, to: &AccountId, trait_index: u8, seq: u64) -> Result<u64> {
        if to.is_empty() {
            return Err(Error::ZeroAddress);
        }
        if trait_index >= TRAIT_COUNT {
            return Err(Error::InvalidArgument(format!(
                "trait {} out of range 0..{}",
                trait_index, TRAIT_COUNT
            )));
        }
        if self.total_minted() >= MAX_SUPPLY {
            return Err(Error::MaxSupplyReached);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(
            id,
            Collectible {
                id,
                owner: to.clone(),
                trait_index,
                minted_seq: seq,
            },
        );
        self.by_owner.entry(to.clone()).or_default().push(id);
        self.all_ids.push(id);
        Ok(id)
    }

    /// Mint a batch of collectibles, one per trait entry
    ///
    /// The cap is checked once up front for the whole batch, so a batch that
    /// would cross the cap fails before any item is minted.
    pub fn mint_many(&mut self, to: &AccountId, traits: &[u8], seq: u64) -> Result<Vec<u64>> {
        if to.is_empty() {
            return Err(Error::ZeroAddress);
        }
        if traits.is_empty() {
            return Err(Error::ZeroAmount);
        }
        for &t in traits {
            if t >= TRAIT_COUNT {
                return Err(Error::InvalidArgument(format!(
                    "trait {} out of range 0..{}",
                    t, TRAIT_COUNT
                )));
            }
        }
        if self.total_minted() + traits.len() as u64 > MAX_SUPPLY {
            return Err(Error::MaxSupplyReached);
        }

        let mut ids = Vec::with_capacity(traits.len());
        for &t in traits {
            // Preconditions verified above; each item mint cannot fail
            let id = self.mint_one(to, t, seq)?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Transfer ownership of a collectible
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, id: u64) -> Result<()> {
        if to.is_empty() {
            return Err(Error::ZeroAddress);
        }
        let item = self.items.get_mut(&id).ok_or(Error::NotFound(id))?;
        if item.owner != *from {
            return Err(Error::NotOwner {
                id,
                claimed: from.to_string(),
            });
        }

        // Swap-remove from the sender's index; holdings are unordered
        let owned = self
            .by_owner
            .get_mut(from)
            .expect("reverse index mirrors owner field");
        let pos = owned
            .iter()
            .position(|&owned_id| owned_id == id)
            .expect("reverse index mirrors owner field");
        owned.swap_remove(pos);

        item.owner = to.clone();
        self.by_owner.entry(to.clone()).or_default().push(id);
        Ok(())
    }

    /// Undo the `n` most recent mints
    ///
    /// Only used by the engine to realize all-or-nothing semantics when an
    /// external fee send fails after mint bookkeeping has been applied. Never
    /// reachable through the public operation surface.
    pub(crate) fn rollback_last(&mut self, n: u64) {
        for _ in 0..n {
            let Some(id) = self.all_ids.pop() else {
                return;
            };
            if let Some(item) = self.items.remove(&id) {
                if let Some(owned) = self.by_owner.get_mut(&item.owner) {
                    if let Some(pos) = owned.iter().position(|&owned_id| owned_id == id) {
                        owned.swap_remove(pos);
                    }
                }
            }
            self.next_id = id;
        }
    }

    // --- read surface ---

    /// Look up a collectible by id
    pub fn get(&self, id: u64) -> Result<&Collectible> {
        self.items.get(&id).ok_or(Error::NotFound(id))
    }

    /// Look up several collectibles; fails on the first unminted id
    pub fn get_batch(&self, ids: &[u64]) -> Result<Vec<Collectible>> {
        ids.iter().map(|&id| self.get(id).cloned()).collect()
    }

    /// Whether an id has been minted
    pub fn exists(&self, id: u64) -> bool {
        self.items.contains_key(&id)
    }

    /// Ids currently owned by an account (unordered)
    pub fn owned_by(&self, owner: &AccountId) -> Vec<u64> {
        self.by_owner.get(owner).cloned().unwrap_or_default()
    }

    /// Page through all collectibles in mint order
    pub fn page(&self, offset: u64, limit: u64) -> Vec<Collectible> {
        self.all_ids
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|id| self.items[id].clone())
            .collect()
    }

    /// Ids carrying a given trait
    ///
    /// Linear scan over the full set; acceptable only because the registry is
    /// capped at [`MAX_SUPPLY`].
    pub fn ids_with_trait(&self, trait_index: u8) -> Vec<u64> {
        self.all_ids
            .iter()
            .copied()
            .filter(|id| self.items[id].trait_index == trait_index)
            .collect()
    }

    /// The `n` most recently minted collectibles, newest first
    pub fn recent(&self, n: u64) -> Vec<Collectible> {
        self.all_ids
            .iter()
            .rev()
            .take(n as usize)
            .map(|id| self.items[id].clone())
            .collect()
    }

    /// Collectibles with ids in `[from_id, to_id]`, skipping unminted ids
    pub fn range(&self, from_id: u64, to_id: u64) -> Result<Vec<Collectible>> {
        if from_id > to_id {
            return Err(Error::InvalidArgument(format!(
                "range start {} exceeds end {}",
                from_id, to_id
            )));
        }
        // Clamp to the minted id space so oversized ranges stay bounded
        let end = to_id.min(self.next_id.saturating_sub(1));
        Ok((from_id..=end)
            .filter_map(|id| self.items.get(&id).cloned())
            .collect())
    }

    /// Count of minted collectibles per trait index
    pub fn trait_counts(&self) -> [u64; TRAIT_COUNT as usize] {
        let mut counts = [0u64; TRAIT_COUNT as usize];
        for item in self.items.values() {
            counts[item.trait_index as usize] += 1;
        }
        counts
    }

    /// Rarity of a trait in basis points of the minted set (truncating)
    ///
    /// Returns 0 when nothing has been minted yet.
    pub fn rarity_bps(&self, trait_index: u8) -> Result<u64> {
        if trait_index >= TRAIT_COUNT {
            return Err(Error::InvalidArgument(format!(
                "trait {} out of range 0..{}",
                trait_index, TRAIT_COUNT
            )));
        }
        let total = self.total_minted();
        if total == 0 {
            return Ok(0);
        }
        let count = self.trait_counts()[trait_index as usize];
        Ok(count * 10_000 / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    #[test]
    fn test_sequential_ids_from_one() {
        let mut registry = CollectibleRegistry::new();
        assert_eq!(registry.mint_one(&alice(), 0, 1).unwrap(), 1);
        assert_eq!(registry.mint_one(&alice(), 1, 2).unwrap(), 2);
        assert_eq!(registry.mint_one(&bob(), 2, 3).unwrap(), 3);
        assert_eq!(registry.total_minted(), 3);
    }

    #[test]
    fn test_mint_records_fields() {
        let mut registry = CollectibleRegistry::new();
        let id = registry.mint_one(&alice(), 7, 42).unwrap();
        let item = registry.get(id).unwrap();
        assert_eq!(item.owner, alice());
        assert_eq!(item.trait_index, 7);
        assert_eq!(item.minted_seq, 42);
    }

    #[test]
    fn test_mint_trait_out_of_range() {
        let mut registry = CollectibleRegistry::new();
        assert!(matches!(
            registry.mint_one(&alice(), TRAIT_COUNT, 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mint_to_zero_address() {
        let mut registry = CollectibleRegistry::new();
        assert_eq!(
            registry.mint_one(&AccountId::new(""), 0, 1),
            Err(Error::ZeroAddress)
        );
    }

    #[test]
    fn test_batch_cap_checked_up_front() {
        let mut registry = CollectibleRegistry::new();
        for _ in 0..MAX_SUPPLY - 2 {
            registry.mint_one(&alice(), 0, 1).unwrap();
        }
        // Three more would cross the cap: the whole batch fails, zero minted
        let before = registry.total_minted();
        assert_eq!(
            registry.mint_many(&bob(), &[1, 2, 3], 5),
            Err(Error::MaxSupplyReached)
        );
        assert_eq!(registry.total_minted(), before);
        assert!(registry.owned_by(&bob()).is_empty());

        // Exactly filling the cap succeeds
        let ids = registry.mint_many(&bob(), &[1, 2], 6).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(registry.total_minted(), MAX_SUPPLY);
        assert_eq!(registry.remaining_capacity(), 0);
        assert_eq!(
            registry.mint_one(&bob(), 0, 7),
            Err(Error::MaxSupplyReached)
        );
    }

    #[test]
    fn test_transfer_updates_indices() {
        let mut registry = CollectibleRegistry::new();
        let id = registry.mint_one(&alice(), 3, 1).unwrap();
        registry.mint_one(&alice(), 4, 2).unwrap();

        registry.transfer(&alice(), &bob(), id).unwrap();

        assert_eq!(registry.get(id).unwrap().owner, bob());
        assert!(!registry.owned_by(&alice()).contains(&id));
        let bobs = registry.owned_by(&bob());
        assert_eq!(bobs.iter().filter(|&&owned| owned == id).count(), 1);
    }

    #[test]
    fn test_transfer_not_owner() {
        let mut registry = CollectibleRegistry::new();
        let id = registry.mint_one(&alice(), 0, 1).unwrap();
        assert!(matches!(
            registry.transfer(&bob(), &alice(), id),
            Err(Error::NotOwner { .. })
        ));
    }

    #[test]
    fn test_transfer_unminted_not_found() {
        let mut registry = CollectibleRegistry::new();
        assert_eq!(
            registry.transfer(&alice(), &bob(), 99),
            Err(Error::NotFound(99))
        );
    }

    #[test]
    fn test_pagination_and_recency() {
        let mut registry = CollectibleRegistry::new();
        for i in 0..10 {
            registry.mint_one(&alice(), (i % 16) as u8, i).unwrap();
        }

        let page = registry.page(2, 3);
        assert_eq!(
            page.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );

        let recent = registry.recent(3);
        assert_eq!(
            recent.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![10, 9, 8]
        );

        // Past-the-end pagination is empty, not an error
        assert!(registry.page(10, 5).is_empty());
    }

    #[test]
    fn test_range_query() {
        let mut registry = CollectibleRegistry::new();
        for i in 0..5 {
            registry.mint_one(&alice(), 0, i).unwrap();
        }
        let items = registry.range(2, 8).unwrap();
        assert_eq!(items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert!(matches!(
            registry.range(5, 2),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_trait_filter_and_rarity() {
        let mut registry = CollectibleRegistry::new();
        registry.mint_one(&alice(), 1, 1).unwrap();
        registry.mint_one(&alice(), 1, 2).unwrap();
        registry.mint_one(&alice(), 2, 3).unwrap();
        registry.mint_one(&alice(), 3, 4).unwrap();

        assert_eq!(registry.ids_with_trait(1), vec![1, 2]);
        assert_eq!(registry.trait_counts()[1], 2);
        // 2 of 4 = 5000 bps, 1 of 4 = 2500 bps (truncating division)
        assert_eq!(registry.rarity_bps(1).unwrap(), 5_000);
        assert_eq!(registry.rarity_bps(2).unwrap(), 2_500);
        assert_eq!(registry.rarity_bps(5).unwrap(), 0);
    }

    #[test]
    fn test_rarity_empty_registry() {
        let registry = CollectibleRegistry::new();
        assert_eq!(registry.rarity_bps(0).unwrap(), 0);
        assert!(registry.rarity_bps(TRAIT_COUNT).is_err());
    }

    #[test]
    fn test_rollback_last_restores_state() {
        let mut registry = CollectibleRegistry::new();
        registry.mint_one(&alice(), 0, 1).unwrap();
        let snapshot = registry.clone();

        registry.mint_many(&bob(), &[1, 2, 3], 2).unwrap();
        registry.rollback_last(3);

        assert_eq!(registry.total_minted(), snapshot.total_minted());
        assert_eq!(registry.next_id(), snapshot.next_id());
        assert!(registry.owned_by(&bob()).is_empty());
        // Ids resume from where the rolled-back batch started
        assert_eq!(registry.mint_one(&bob(), 5, 3).unwrap(), 2);
    }
}
