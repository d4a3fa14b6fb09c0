//! The engine facade
//!
//! One [`PbmEngine`] owns one store, one clock and one audit emitter and
//! exposes the public surface consumed by the payment flow, wallet screens
//! and admin tooling.

use std::collections::BTreeMap;
use std::sync::Arc;

use pbm_audit::{AuditEmitter, AuditSink, TracingAuditSink};
use pbm_policy::PolicyTemplateRegistry;
use pbm_types::{
    Amount, FundType, OwnerId, PbmError, Result, Token, TokenId, TransactionRequest,
    ValidationResult,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deductor::apply_debit;
use crate::validator::evaluate;
use crate::{
    BalanceAggregator, BalanceDeductor, ClawbackScheduler, Clock, Deduction, EngineConfig,
    IssueIntent, SweepHandle, SweepReport, SystemClock, TokenIssuer, TokenStore,
    TransactionValidator, ValidationRules,
};

/// Outcome of an atomic validate-and-deduct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendReceipt {
    pub validation: ValidationResult,
    pub deduction: Deduction,
}

/// Builder for [`PbmEngine`]
#[derive(Default)]
pub struct PbmEngineBuilder {
    config: Option<EngineConfig>,
    clock: Option<Arc<dyn Clock>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    registry: Option<PolicyTemplateRegistry>,
    store: Option<TokenStore>,
}

impl PbmEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn registry(mut self, registry: PolicyTemplateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Fails when the configuration does not validate
    pub fn build(self) -> Result<PbmEngine> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|errors| PbmError::invalid(errors.join("; ")))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let sink = self
            .audit_sink
            .unwrap_or_else(|| Arc::new(TracingAuditSink));
        let registry = Arc::new(self.registry.unwrap_or_default());
        let store = self.store.unwrap_or_default();
        let audit = AuditEmitter::new(sink, config.audit_timeout());
        let rules = ValidationRules::from(&config);

        Ok(PbmEngine {
            issuer: TokenIssuer::new(store.clone(), registry.clone(), clock.clone(), audit.clone()),
            validator: TransactionValidator::new(store.clone(), clock.clone(), rules),
            deductor: BalanceDeductor::new(store.clone(), clock.clone()),
            clawback: Arc::new(ClawbackScheduler::new(store.clone(), clock.clone(), audit.clone())),
            aggregator: BalanceAggregator::new(store.clone(), clock.clone()),
            registry,
            store,
            clock,
            audit,
            rules,
            config,
        })
    }
}

/// Purpose-bound money engine
pub struct PbmEngine {
    config: EngineConfig,
    rules: ValidationRules,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    audit: AuditEmitter,
    registry: Arc<PolicyTemplateRegistry>,
    issuer: TokenIssuer,
    validator: TransactionValidator,
    deductor: BalanceDeductor,
    clawback: Arc<ClawbackScheduler>,
    aggregator: BalanceAggregator,
}

impl PbmEngine {
    pub fn builder() -> PbmEngineBuilder {
        PbmEngineBuilder::default()
    }

    /// Engine with the system clock, built-in templates and tracing audit sink
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn registry(&self) -> &PolicyTemplateRegistry {
        &self.registry
    }

    /// Issue a new token
    pub async fn issue(&self, intent: IssueIntent) -> Result<Token> {
        self.issuer.issue(intent).await
    }

    /// Check a proposed transaction without changing any balance
    pub async fn validate(&self, request: &TransactionRequest) -> ValidationResult {
        self.validator.validate(request).await
    }

    /// Deduct after the external debit has been confirmed
    pub async fn deduct(&self, owner: &OwnerId, token_id: &TokenId, amount: Amount) -> Result<Deduction> {
        self.deductor.deduct(owner, token_id, amount).await
    }

    /// Validate and deduct under one per-owner lock.
    ///
    /// A denial comes back as [`PbmError::Rejected`] and leaves every
    /// balance untouched.
    pub async fn spend(&self, request: &TransactionRequest) -> Result<SpendReceipt> {
        if request.amount.is_zero() {
            return Err(PbmError::invalid("spend amount must be greater than zero"));
        }

        let Some(slot) = self.store.slot(&request.owner_id).await else {
            let denied = evaluate(&[], request, self.clock.now(), &self.rules);
            return Err(rejection(denied));
        };

        let mut tokens = slot.write().await;
        let now = self.clock.now();
        let validation = evaluate(&tokens, request, now, &self.rules);
        let token_id = match (&validation.token_id, validation.allowed) {
            (Some(id), true) => id.clone(),
            _ => return Err(rejection(validation)),
        };

        let deduction = apply_debit(&mut tokens, &request.owner_id, &token_id, request.amount, now)?;
        info!(
            token = %token_id,
            owner = %request.owner_id,
            category = %request.category,
            amount = request.amount.value(),
            remaining = deduction.remaining.value(),
            "spend committed"
        );

        Ok(SpendReceipt {
            validation,
            deduction,
        })
    }

    /// Reclaim every expired balance once
    pub async fn run_sweep(&self) -> SweepReport {
        self.clawback.run_sweep().await
    }

    /// Start the periodic sweep at the configured interval
    pub fn spawn_sweeper(&self) -> SweepHandle {
        self.clawback.clone().spawn(self.config.sweep_interval())
    }

    /// The owner's tokens in issuance order
    pub async fn tokens_for(&self, owner: &OwnerId) -> Vec<Token> {
        self.store.tokens_for(owner).await
    }

    pub async fn balance_by_fund_type(&self, owner: &OwnerId) -> BTreeMap<FundType, Amount> {
        self.aggregator.balance_by_fund_type(owner).await
    }

    /// Wait for audit deliveries still in flight
    pub async fn flush_audit(&self) {
        self.audit.flush().await
    }
}

fn rejection(result: ValidationResult) -> PbmError {
    PbmError::Rejected(
        result
            .reason
            .unwrap_or(pbm_types::RejectionReason::NoSuitableToken),
    )
}
