//! Deterministic trait assignment for collectibles
//!
//! Traits are derived from a wide hash over a block-level entropy seed, the
//! minting account, the token id, and a per-item nonce, reduced modulo
//! [`TRAIT_COUNT`]. The entropy source is an injected dependency so tests can
//! supply fixed seeds.
//!
//! Known limitation, by design: whoever controls the entropy source can bias
//! the outcome. This generator is not suitable where unpredictability must be
//! adversarially robust.

use crate::types::{AccountId, TRAIT_COUNT};
use sha2::{Digest, Sha256};

/// Domain-separation constant mixed into every trait hash
const TRAIT_DOMAIN: &[u8] = b"collectible-ledger/trait/v1";

/// Source of the current block-level entropy seed
pub trait EntropySource: Send + Sync {
    /// The current unpredictable seed
    fn current_seed(&self) -> [u8; 32];
}

/// Entropy source returning a fixed seed
///
/// Useful for tests and deterministic replay.
#[derive(Debug, Clone, Copy)]
pub struct StaticEntropy(pub [u8; 32]);

impl EntropySource for StaticEntropy {
    fn current_seed(&self) -> [u8; 32] {
        self.0
    }
}

/// Derive the trait index for one collectible
///
/// `nonce` disambiguates multiple items minted within the same call so a
/// batch does not collapse onto a single trait.
pub fn trait_for(seed: &[u8; 32], account: &AccountId, token_id: u64, nonce: u32) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(TRAIT_DOMAIN);
    hasher.update(seed);
    hasher.update(account.as_str().as_bytes());
    hasher.update(token_id.to_be_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(word) % TRAIT_COUNT as u64) as u8
}
