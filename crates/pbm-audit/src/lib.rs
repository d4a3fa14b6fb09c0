//! PBM Audit - Audit events and best-effort delivery
//!
//! Issuance and clawback each produce an [`AuditEvent`]. Events are handed to
//! an external [`AuditSink`] through the [`AuditEmitter`], which delivers them
//! in the background with a bounded timeout. A failed or slow delivery is
//! logged and dropped; it never rolls back the token mutation that caused it.

use chrono::{DateTime, Utc};
use pbm_types::{Amount, AuthorityId, BudgetCode, FundType, OwnerId, Token, TokenId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod emitter;
pub mod log;

pub use emitter::AuditEmitter;
pub use log::{AuditEntry, AuditLog, TracingAuditSink};

/// Errors raised by audit sinks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Audit sink unavailable: {message}")]
    Unavailable { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Types of auditable actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    /// A token was issued
    TokenIssued {
        issued_by: AuthorityId,
        expires_at: DateTime<Utc>,
    },
    /// An expired token's remaining balance was reclaimed
    TokenClawedBack { expired_at: DateTime<Utc> },
}

/// One auditable business event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub owner_id: OwnerId,
    pub token_id: TokenId,
    pub fund_type: FundType,
    pub budget_code: Option<BudgetCode>,
    /// Issued amount, or reclaimed amount for a clawback
    pub amount: Amount,
    pub action: AuditAction,
}

impl AuditEvent {
    pub fn issued(token: &Token) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: token.issued_at,
            owner_id: token.owner_id.clone(),
            token_id: token.id.clone(),
            fund_type: token.fund_type,
            budget_code: token.budget_code.clone(),
            amount: token.amount,
            action: AuditAction::TokenIssued {
                issued_by: token.issued_by.clone(),
                expires_at: token.expires_at(),
            },
        }
    }

    /// `token` is the token as it was just before removal.
    pub fn clawed_back(token: &Token, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: at,
            owner_id: token.owner_id.clone(),
            token_id: token.id.clone(),
            fund_type: token.fund_type,
            budget_code: token.budget_code.clone(),
            amount: token.amount,
            action: AuditAction::TokenClawedBack {
                expired_at: token.expires_at(),
            },
        }
    }
}

/// External audit collaborator
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an event
    async fn log(&self, event: AuditEvent) -> Result<()>;
}
