//! Token store
//!
//! Owner id -> that owner's tokens, in issuance order. Each owner's list has
//! its own lock so unrelated owners never contend. Every token stored under
//! key `K` has `owner_id == K` because [`TokenStore::insert`] keys by the
//! token's own owner.
//!
//! Inserts hold the outer map lock until the token is pushed, and
//! [`TokenStore::prune_empty`] only drops slots under the outer write lock,
//! so a token is never pushed into a slot that has left the map.

use pbm_types::{OwnerId, Token, TokenId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One owner's tokens behind their own lock
pub type OwnerTokens = Arc<RwLock<Vec<Token>>>;

/// The single source of truth for remaining balances
#[derive(Clone, Default)]
pub struct TokenStore {
    owners: Arc<RwLock<HashMap<OwnerId, OwnerTokens>>>,
}

impl TokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The owner's token list, if the owner has ever held a token
    pub async fn slot(&self, owner: &OwnerId) -> Option<OwnerTokens> {
        self.owners.read().await.get(owner).cloned()
    }

    /// Append a token under its owner
    pub async fn insert(&self, token: Token) {
        {
            let owners = self.owners.read().await;
            if let Some(slot) = owners.get(&token.owner_id) {
                slot.write().await.push(token);
                return;
            }
        }

        let mut owners = self.owners.write().await;
        let slot = owners.entry(token.owner_id.clone()).or_default().clone();
        slot.write().await.push(token);
    }

    /// Drop owners whose token list is empty. Slots currently locked by
    /// another task are left for a later pass. Returns how many were dropped.
    pub async fn prune_empty(&self) -> usize {
        let mut owners = self.owners.write().await;
        let before = owners.len();
        owners.retain(|_, slot| match slot.try_read() {
            Ok(tokens) => !tokens.is_empty(),
            Err(_) => true,
        });
        before - owners.len()
    }

    /// Snapshot of an owner's tokens
    pub async fn tokens_for(&self, owner: &OwnerId) -> Vec<Token> {
        match self.slot(owner).await {
            Some(slot) => slot.read().await.clone(),
            None => Vec::new(),
        }
    }

    pub async fn get(&self, owner: &OwnerId, token_id: &TokenId) -> Option<Token> {
        let slot = self.slot(owner).await?;
        let tokens = slot.read().await;
        tokens.iter().find(|t| &t.id == token_id).cloned()
    }

    /// Every owner with a slot; emptied slots linger until the next prune
    pub async fn owners(&self) -> Vec<OwnerId> {
        self.owners.read().await.keys().cloned().collect()
    }

    /// Number of tokens currently held across all owners
    pub async fn token_count(&self) -> usize {
        let slots: Vec<OwnerTokens> = self.owners.read().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            count += slot.read().await.len();
        }
        count
    }
}
