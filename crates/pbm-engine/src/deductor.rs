//! Balance deduction
//!
//! Called after the external debit succeeded. Decrements the token and
//! removes it once the balance reaches zero.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pbm_types::{Amount, OwnerId, PbmError, Result, Token, TokenId, TokenStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Clock, TokenStore};

/// Outcome of a successful deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub token_id: TokenId,
    pub owner_id: OwnerId,
    pub debited: Amount,
    pub remaining: Amount,
    /// `Depleted` when the token was removed
    pub status: TokenStatus,
}

impl Deduction {
    pub fn is_depleted(&self) -> bool {
        self.status == TokenStatus::Depleted
    }
}

/// Decrements token balances
pub struct BalanceDeductor {
    store: TokenStore,
    clock: Arc<dyn Clock>,
}

impl BalanceDeductor {
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Deduct `amount` from one of `owner`'s tokens.
    ///
    /// Fails without touching the token when it does not exist under `owner`
    /// or holds less than `amount`.
    pub async fn deduct(&self, owner: &OwnerId, token_id: &TokenId, amount: Amount) -> Result<Deduction> {
        let slot = self
            .store
            .slot(owner)
            .await
            .ok_or_else(|| PbmError::TokenNotFound {
                token_id: token_id.clone(),
                owner_id: owner.clone(),
            })?;
        let mut tokens = slot.write().await;
        apply_debit(&mut tokens, owner, token_id, amount, self.clock.now())
    }
}

/// Debit a token inside an already locked owner list.
pub(crate) fn apply_debit(
    tokens: &mut Vec<Token>,
    owner: &OwnerId,
    token_id: &TokenId,
    amount: Amount,
    now: DateTime<Utc>,
) -> Result<Deduction> {
    if amount.is_zero() {
        return Err(PbmError::invalid("deduction amount must be greater than zero"));
    }

    let index = tokens
        .iter()
        .position(|t| &t.id == token_id)
        .ok_or_else(|| PbmError::TokenNotFound {
            token_id: token_id.clone(),
            owner_id: owner.clone(),
        })?;

    let token = &mut tokens[index];
    let remaining = match token.amount.checked_sub(amount) {
        Some(remaining) => remaining,
        None => {
            warn!(
                token = %token_id,
                owner = %owner,
                requested = amount.value(),
                available = token.amount.value(),
                "deduction refused: insufficient balance"
            );
            return Err(PbmError::InsufficientBalance {
                token_id: token_id.clone(),
                requested: amount,
                available: token.amount,
            });
        }
    };

    token.amount = remaining;
    token.daily_usage.record(now.date_naive(), amount);

    let status = if remaining.is_zero() {
        tokens.remove(index);
        info!(token = %token_id, owner = %owner, "token depleted");
        TokenStatus::Depleted
    } else {
        TokenStatus::Active
    };

    Ok(Deduction {
        token_id: token_id.clone(),
        owner_id: owner.clone(),
        debited: amount,
        remaining,
        status,
    })
}
