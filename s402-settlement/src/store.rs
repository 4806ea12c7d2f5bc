//! In-memory intent storage and the nonce replay guard.
//!
//! Each intent lives behind its own async mutex inside a [`DashMap`], which
//! serializes all mutations per intent without a global lock. Locks are held
//! only for state reads and writes, never across chain adapter calls.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use s402::chain::ChainId;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SettlementError;
use crate::intent::PaymentIntent;

/// Shared handle to a stored intent.
pub type IntentHandle = Arc<Mutex<PaymentIntent>>;

/// In-memory table of payment intents.
///
/// Intents are inserted once and never removed; terminal intents stay
/// queryable for their full history.
#[derive(Debug, Default)]
pub struct IntentStore {
    intents: DashMap<Uuid, IntentHandle>,
}

impl IntentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly created intent and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Internal`] if the id already exists, which
    /// indicates a UUID collision and should never happen.
    pub fn insert(&self, intent: PaymentIntent) -> Result<IntentHandle, SettlementError> {
        let id = intent.id;
        match self.intents.entry(id) {
            Entry::Occupied(_) => Err(SettlementError::Internal(format!(
                "duplicate intent id {id}"
            ))),
            Entry::Vacant(slot) => {
                let handle = Arc::new(Mutex::new(intent));
                slot.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Returns the handle for an intent, if it exists.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<IntentHandle> {
        self.intents.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a point-in-time copy of an intent.
    pub async fn snapshot(&self, id: &Uuid) -> Result<PaymentIntent, SettlementError> {
        let handle = self.get(id).ok_or(SettlementError::IntentNotFound(*id))?;
        let intent = handle.lock().await;
        Ok(intent.clone())
    }

    /// Returns handles to every stored intent.
    ///
    /// Used by the expiry reaper; the set is small enough that a full sweep
    /// is cheaper than maintaining a deadline index.
    #[must_use]
    pub fn all(&self) -> Vec<IntentHandle> {
        self.intents
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Returns the number of stored intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Returns `true` if the store holds no intents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Replay key for a consumed payment authorization.
///
/// A nonce is only meaningful relative to the asset and chain it was signed
/// for; the triple is what must be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonceKey {
    /// Asset contract or mint address.
    pub asset: String,
    /// CAIP-2 chain the authorization targets.
    pub chain: ChainId,
    /// The chain-specific nonce (EIP-3009 nonce or transaction signature).
    pub nonce: String,
}

/// Atomic first-claim-wins registry of consumed nonces.
#[derive(Debug, Default)]
pub struct NonceStore {
    claims: DashMap<NonceKey, Uuid>,
}

impl NonceStore {
    /// Creates an empty nonce store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a nonce for an intent.
    ///
    /// Exactly one claim succeeds per key; a losing claim learns who owns it.
    ///
    /// # Errors
    ///
    /// Returns the owning intent id if the nonce is already claimed.
    pub fn claim(&self, key: NonceKey, intent_id: Uuid) -> Result<(), Uuid> {
        match self.claims.entry(key) {
            Entry::Occupied(existing) => Err(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(intent_id);
                Ok(())
            }
        }
    }

    /// Releases a claim so the proof can be re-driven.
    ///
    /// Only the owning intent can release; a stale release by another intent
    /// is a no-op.
    pub fn release(&self, key: &NonceKey, intent_id: Uuid) {
        self.claims.remove_if(key, |_, owner| *owner == intent_id);
    }

    /// Returns the intent currently owning a nonce, if any.
    #[must_use]
    pub fn owner(&self, key: &NonceKey) -> Option<Uuid> {
        self.claims.get(key).map(|entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(nonce: &str) -> NonceKey {
        NonceKey {
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            chain: "eip155:8453".parse().unwrap(),
            nonce: nonce.into(),
        }
    }

    #[test]
    fn first_claim_wins() {
        let store = NonceStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(store.claim(key("0x01"), first).is_ok());
        assert_eq!(store.claim(key("0x01"), second), Err(first));
        assert_eq!(store.owner(&key("0x01")), Some(first));
    }

    #[test]
    fn release_reopens_the_claim() {
        let store = NonceStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(store.claim(key("0x01"), first).is_ok());
        store.release(&key("0x01"), first);
        assert!(store.claim(key("0x01"), second).is_ok());
    }

    #[test]
    fn release_by_non_owner_is_a_noop() {
        let store = NonceStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(store.claim(key("0x01"), owner).is_ok());
        store.release(&key("0x01"), other);
        assert_eq!(store.owner(&key("0x01")), Some(owner));
    }

    #[test]
    fn distinct_chains_do_not_collide() {
        let store = NonceStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let base = key("0x01");
        let solana = NonceKey {
            asset: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".into(),
            chain: "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp".parse().unwrap(),
            nonce: "0x01".into(),
        };
        assert!(store.claim(base, a).is_ok());
        assert!(store.claim(solana, b).is_ok());
    }
}
