//! Error types for PBM
//!
//! Only precondition violations and failed mutations are errors. Validation
//! denials are values (see [`crate::ValidationResult`]) and only become an
//! error when an atomic spend is refused.

use crate::{Amount, OwnerId, RejectionReason, TokenId};
use thiserror::Error;

/// Result type for PBM operations
pub type Result<T> = std::result::Result<T, PbmError>;

/// PBM error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PbmError {
    /// Caller supplied an argument that can never succeed
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Token does not exist under this owner
    #[error("Token {token_id} not found for owner {owner_id}")]
    TokenNotFound { token_id: TokenId, owner_id: OwnerId },

    /// Debit larger than the remaining balance
    #[error("Insufficient balance on token {token_id}: requested {requested}, available {available}")]
    InsufficientBalance {
        token_id: TokenId,
        requested: Amount,
        available: Amount,
    },

    /// Atomic spend refused by validation
    #[error("Transaction rejected: {0}")]
    Rejected(RejectionReason),

    /// Amount overflow during arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,
}

impl PbmError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
