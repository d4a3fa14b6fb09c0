//! Transaction requests and validation outcomes
//!
//! A denial is a business outcome, not an error: [`ValidationResult`] always
//! comes back as a value and the caller decides how to present it.

use crate::{Amount, CategoryCode, OwnerId, RegionCode, TokenId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A proposed transaction presented by the payment flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub owner_id: OwnerId,
    pub category: CategoryCode,
    pub region: Option<RegionCode>,
    pub amount: Amount,
    /// Spend from exactly this token instead of auto-selecting one
    pub token_id: Option<TokenId>,
}

impl TransactionRequest {
    pub fn new(owner_id: OwnerId, category: impl Into<CategoryCode>, amount: Amount) -> Self {
        Self {
            owner_id,
            category: category.into(),
            region: None,
            amount,
            token_id: None,
        }
    }

    pub fn in_region(mut self, region: impl Into<RegionCode>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn from_token(mut self, token_id: TokenId) -> Self {
        self.token_id = Some(token_id);
        self
    }
}

/// Why a transaction was denied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("no suitable token")]
    NoSuitableToken,

    #[error("token {token_id} not found")]
    TokenNotFound { token_id: TokenId },

    #[error("token expired")]
    TokenExpired,

    #[error("category blocked for this fund type")]
    CategoryBlocked,

    #[error("category not allowed for this fund type")]
    CategoryNotAllowed,

    #[error("region restricted")]
    RegionRestricted,

    #[error("exceeds single-transaction limit of {limit}")]
    TransactionCapExceeded { limit: Amount },

    #[error("exceeds daily limit of {limit} ({used} already spent today)")]
    DailyLimitExceeded { limit: Amount, used: Amount },

    #[error("insufficient token balance")]
    InsufficientBalance,
}

/// Outcome of validating a transaction against a token's restrictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub allowed: bool,
    pub reason: Option<RejectionReason>,
    /// Token the decision was made against, when one was selected
    pub token_id: Option<TokenId>,
    pub applied_bonus: Option<Amount>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create an allowing result
    pub fn allow(token_id: TokenId) -> Self {
        Self {
            allowed: true,
            reason: None,
            token_id: Some(token_id),
            applied_bonus: None,
            warnings: vec![],
        }
    }

    /// Create a denying result
    pub fn deny(reason: RejectionReason, token_id: Option<TokenId>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            token_id,
            applied_bonus: None,
            warnings: vec![],
        }
    }

    /// Human-readable denial message, if denied
    pub fn message(&self) -> Option<String> {
        self.reason.as_ref().map(ToString::to_string)
    }
}
