//! Transaction validation
//!
//! Picks the token a transaction would draw from and runs the restriction
//! checks in a fixed order. The first failing check decides the outcome:
//!
//! 1. no eligible token
//! 2. token expired
//! 3. category blocked (wins over the allow-list)
//! 4. category not on a non-empty allow-list
//! 5. region outside a non-empty region list
//! 6. single-transaction cap
//! 7. daily limit (only when enforcement is enabled)
//! 8. remaining balance
//!
//! Validation never mutates the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pbm_types::{RejectionReason, Token, TransactionRequest, ValidationResult};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::{Clock, EngineConfig, TokenSelection, TokenStore};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// The configurable parts of validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub selection: TokenSelection,
    pub expiry_warning: chrono::Duration,
    pub enforce_daily_limit: bool,
}

impl From<&EngineConfig> for ValidationRules {
    fn from(config: &EngineConfig) -> Self {
        Self {
            selection: config.selection,
            expiry_warning: config.expiry_warning(),
            enforce_daily_limit: config.enforce_daily_limit,
        }
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Read-only allow/deny decisions against the token store
pub struct TransactionValidator {
    store: TokenStore,
    clock: Arc<dyn Clock>,
    rules: ValidationRules,
}

impl TransactionValidator {
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>, rules: ValidationRules) -> Self {
        Self { store, clock, rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validate a proposed transaction
    pub async fn validate(&self, request: &TransactionRequest) -> ValidationResult {
        let result = match self.store.slot(&request.owner_id).await {
            Some(slot) => {
                let tokens = slot.read().await;
                evaluate(&tokens, request, self.clock.now(), &self.rules)
            }
            None => evaluate(&[], request, self.clock.now(), &self.rules),
        };

        debug!(
            owner = %request.owner_id,
            category = %request.category,
            amount = request.amount.value(),
            allowed = result.allowed,
            reason = ?result.reason,
            "transaction validated"
        );
        result
    }
}

/// Index of the token `request` would draw from.
pub(crate) fn select_token(
    tokens: &[Token],
    request: &TransactionRequest,
    now: DateTime<Utc>,
    selection: TokenSelection,
) -> Result<usize, RejectionReason> {
    if let Some(token_id) = &request.token_id {
        return tokens
            .iter()
            .position(|t| &t.id == token_id)
            .ok_or_else(|| RejectionReason::TokenNotFound {
                token_id: token_id.clone(),
            });
    }

    let mut eligible = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| request.amount <= t.amount && t.is_active_at(now));

    let picked = match selection {
        TokenSelection::InsertionOrder => eligible.next(),
        TokenSelection::EarliestExpiry => {
            eligible.min_by_key(|(i, t)| (t.expires_at(), t.issued_at, *i))
        }
    };

    picked.map(|(i, _)| i).ok_or(RejectionReason::NoSuitableToken)
}

/// Evaluate `request` against an owner's tokens at `now`.
pub fn evaluate(
    tokens: &[Token],
    request: &TransactionRequest,
    now: DateTime<Utc>,
    rules: &ValidationRules,
) -> ValidationResult {
    let index = match select_token(tokens, request, now, rules.selection) {
        Ok(index) => index,
        Err(reason) => return ValidationResult::deny(reason, None),
    };
    let token = &tokens[index];

    match check_restrictions(token, request, now, rules) {
        Err(reason) => ValidationResult::deny(reason, Some(token.id.clone())),
        Ok(()) => allow(token, request, now, rules),
    }
}

fn check_restrictions(
    token: &Token,
    request: &TransactionRequest,
    now: DateTime<Utc>,
    rules: &ValidationRules,
) -> Result<(), RejectionReason> {
    let restrictions = &token.restrictions;

    if restrictions.is_expired_at(now) {
        return Err(RejectionReason::TokenExpired);
    }
    if restrictions.is_blocked(&request.category) {
        return Err(RejectionReason::CategoryBlocked);
    }
    if !restrictions.is_allow_listed(&request.category) {
        return Err(RejectionReason::CategoryNotAllowed);
    }
    if !restrictions.permits_region(request.region.as_ref()) {
        return Err(RejectionReason::RegionRestricted);
    }
    if let Some(limit) = restrictions.exceeded_single_cap(request.amount) {
        return Err(RejectionReason::TransactionCapExceeded { limit });
    }
    if rules.enforce_daily_limit {
        if let Some(limit) = restrictions.daily_limit {
            let used = token.daily_usage.spent_on(now.date_naive());
            if used.saturating_add(request.amount) > limit {
                return Err(RejectionReason::DailyLimitExceeded { limit, used });
            }
        }
    }
    if request.amount > token.amount {
        return Err(RejectionReason::InsufficientBalance);
    }
    Ok(())
}

fn allow(
    token: &Token,
    request: &TransactionRequest,
    now: DateTime<Utc>,
    rules: &ValidationRules,
) -> ValidationResult {
    let mut result = ValidationResult::allow(token.id.clone());

    if let Some(rate) = token.restrictions.effective_bonus_rate() {
        let bonus = request.amount.apply_rate(rate);
        result.applied_bonus = Some(bonus);
        result.warnings.push(format!(
            "{}% bonus applied: {}",
            (rate * dec!(100)).normalize(),
            bonus
        ));
    }

    let remaining = token.expires_at() - now;
    if remaining < rules.expiry_warning {
        let ms = remaining.num_milliseconds().max(0);
        let days = (ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        result
            .warnings
            .push(format!("token expires in {days} day(s)"));
    }

    result
}
