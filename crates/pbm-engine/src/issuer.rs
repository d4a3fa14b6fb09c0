//! Token issuance
//!
//! Resolves the fund type's template, merges overrides, stamps the expiry,
//! stores the token and emits an issuance audit event. The audit call is
//! best-effort and cannot fail issuance.

use std::sync::Arc;

use chrono::Duration;
use pbm_audit::{AuditEmitter, AuditEvent};
use pbm_policy::PolicyTemplateRegistry;
use pbm_types::{
    Amount, AuthorityId, BudgetCode, DailyUsage, FundType, OwnerId, PbmError,
    RestrictionOverrides, Result, Token, TokenId,
};
use tracing::info;

use crate::{Clock, TokenStore};

/// Request to issue a new token
#[derive(Debug, Clone)]
pub struct IssueIntent {
    pub owner_id: OwnerId,
    pub amount: Amount,
    pub fund_type: FundType,
    pub expires_in: Duration,
    pub issued_by: AuthorityId,
    pub budget_code: Option<BudgetCode>,
    pub overrides: RestrictionOverrides,
}

impl IssueIntent {
    pub fn new(
        owner_id: impl Into<OwnerId>,
        amount: Amount,
        fund_type: FundType,
        expires_in: Duration,
        issued_by: impl Into<AuthorityId>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            amount,
            fund_type,
            expires_in,
            issued_by: issued_by.into(),
            budget_code: None,
            overrides: RestrictionOverrides::default(),
        }
    }

    pub fn with_budget_code(mut self, code: impl Into<BudgetCode>) -> Self {
        self.budget_code = Some(code.into());
        self
    }

    pub fn with_overrides(mut self, overrides: RestrictionOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Creates tokens from policy templates
pub struct TokenIssuer {
    store: TokenStore,
    registry: Arc<PolicyTemplateRegistry>,
    clock: Arc<dyn Clock>,
    audit: AuditEmitter,
}

impl TokenIssuer {
    pub fn new(
        store: TokenStore,
        registry: Arc<PolicyTemplateRegistry>,
        clock: Arc<dyn Clock>,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            audit,
        }
    }

    /// Issue a token
    ///
    /// Fails fast with `InvalidArgument` when the amount or expiry duration
    /// is not positive, or when an override sets a bonus rate outside `[0, 1]`.
    pub async fn issue(&self, intent: IssueIntent) -> Result<Token> {
        if intent.amount.is_zero() {
            return Err(PbmError::invalid("amount must be greater than zero"));
        }
        if intent.expires_in <= Duration::zero() {
            return Err(PbmError::invalid("expiry duration must be positive"));
        }

        let template = self
            .registry
            .template_for(intent.fund_type)
            .merge(intent.overrides);
        template.check()?;

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(intent.expires_in)
            .ok_or_else(|| PbmError::invalid("expiry is out of range"))?;

        let token = Token {
            id: TokenId::new(),
            owner_id: intent.owner_id,
            amount: intent.amount,
            fund_type: intent.fund_type,
            restrictions: template.with_expiry(expires_at),
            issued_at: now,
            issued_by: intent.issued_by,
            budget_code: intent.budget_code,
            daily_usage: DailyUsage::default(),
        };

        self.store.insert(token.clone()).await;

        info!(
            token = %token.id,
            owner = %token.owner_id,
            fund_type = %token.fund_type,
            amount = token.amount.value(),
            expires_at = %expires_at,
            "token issued"
        );
        self.audit.emit(AuditEvent::issued(&token));

        Ok(token)
    }
}
