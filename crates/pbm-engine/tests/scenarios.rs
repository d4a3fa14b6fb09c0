use std::sync::Arc;

use chrono::Duration;
use pbm_audit::{AuditAction, AuditError, AuditEvent, AuditLog, AuditSink};
use pbm_engine::{
    Amount, CategoryCode, EngineConfig, FundType, IssueIntent, ManualClock, OwnerId, PbmEngine, PbmError,
    RejectionReason, RestrictionOverrides, TransactionRequest,
};
use rust_decimal_macros::dec;

struct Harness {
    engine: PbmEngine,
    clock: Arc<ManualClock>,
    log: AuditLog,
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn harness_with(config: EngineConfig) -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let log = AuditLog::new();
    let engine = PbmEngine::builder()
        .config(config)
        .clock(clock.clone())
        .audit_sink(Arc::new(log.clone()))
        .build()
        .unwrap();
    Harness { engine, clock, log }
}

fn citizen() -> OwnerId {
    OwnerId::new("citizen-0001")
}

fn disaster_relief(amount: u64) -> IssueIntent {
    IssueIntent::new(
        citizen(),
        Amount::new(amount),
        FundType::DisasterRelief,
        Duration::days(90),
        "disaster-response-hq",
    )
    .with_budget_code("DR-2026-Q3")
}

fn purchase(category: &str, amount: u64) -> TransactionRequest {
    TransactionRequest::new(citizen(), category, Amount::new(amount))
}

#[tokio::test]
async fn relief_token_walkthrough() {
    let h = harness();
    let token = h.engine.issue(disaster_relief(100_000)).await.unwrap();

    // A: ordinary grocery purchase, no bonus on a zero-rate fund
    let a = h.engine.validate(&purchase("grocery", 50_000)).await;
    assert!(a.allowed);
    assert_eq!(a.token_id, Some(token.id.clone()));
    assert_eq!(a.applied_bonus, None);

    // B: blocked merchant category
    let b = h.engine.validate(&purchase("liquor-store", 50_000)).await;
    assert!(!b.allowed);
    assert_eq!(b.reason, Some(RejectionReason::CategoryBlocked));

    // C: above the single-transaction cap. An explicit token id skips the
    // balance-based auto selection so the cap check is what fires.
    let c = h
        .engine
        .validate(&purchase("grocery", 400_000).from_token(token.id.clone()))
        .await;
    assert_eq!(
        c.reason,
        Some(RejectionReason::TransactionCapExceeded {
            limit: Amount::new(300_000)
        })
    );
    assert!(c.message().unwrap().contains("300,000"));

    // D: deduct half, then refuse an overdraw
    let d = h.engine.deduct(&citizen(), &token.id, Amount::new(50_000)).await.unwrap();
    assert_eq!(d.remaining, Amount::new(50_000));
    let overdraw = h.engine.deduct(&citizen(), &token.id, Amount::new(60_000)).await;
    assert!(matches!(overdraw, Err(PbmError::InsufficientBalance { .. })));
    assert_eq!(h.engine.tokens_for(&citizen()).await[0].amount, Amount::new(50_000));

    // E: past expiry the sweep reclaims the rest
    h.clock.advance(Duration::days(91));
    let report = h.engine.run_sweep().await;
    assert_eq!(report.processed_count, 1);
    assert_eq!(report.total_reclaimed, Amount::new(50_000));
    assert!(h.engine.tokens_for(&citizen()).await.is_empty());

    h.engine.flush_audit().await;
    let trail = h.log.entries_for_token(&token.id).await;
    assert_eq!(trail.len(), 2);
    assert!(trail
        .iter()
        .any(|e| matches!(e.event.action, AuditAction::TokenIssued { .. })
            && e.event.amount == Amount::new(100_000)));
    assert!(trail
        .iter()
        .any(|e| matches!(e.event.action, AuditAction::TokenClawedBack { .. })
            && e.event.amount == Amount::new(50_000)));
    assert!(h.log.verify_chain().await);
}

#[tokio::test]
async fn oversized_purchase_without_token_id_finds_no_token() {
    let h = harness();
    h.engine.issue(disaster_relief(100_000)).await.unwrap();

    let result = h.engine.validate(&purchase("grocery", 400_000)).await;
    assert_eq!(result.reason, Some(RejectionReason::NoSuitableToken));
}

#[tokio::test]
async fn issue_validate_deduct_round_trip() {
    let h = harness();
    let token = h.engine.issue(disaster_relief(80_000)).await.unwrap();

    let result = h
        .engine
        .validate(&purchase("pharmacy", 80_000).from_token(token.id.clone()))
        .await;
    assert!(result.allowed);

    let deduction = h.engine.deduct(&citizen(), &token.id, Amount::new(80_000)).await.unwrap();
    assert!(deduction.is_depleted());
    assert!(h.engine.tokens_for(&citizen()).await.is_empty());
}

#[tokio::test]
async fn validation_never_mutates() {
    let h = harness();
    h.engine.issue(disaster_relief(10_000)).await.unwrap();
    let before = h.engine.tokens_for(&citizen()).await;

    for amount in [1, 10_000, 20_000] {
        h.engine.validate(&purchase("grocery", amount)).await;
        h.engine.validate(&purchase("gambling", amount)).await;
    }

    assert_eq!(h.engine.tokens_for(&citizen()).await, before);
}

#[tokio::test]
async fn blocked_category_is_never_allowed() {
    let h = harness();
    let overrides = RestrictionOverrides {
        allowed_categories: Some(
            [CategoryCode::from("gambling"), CategoryCode::from("grocery")]
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    };
    let token = h
        .engine
        .issue(disaster_relief(1_000_000).with_overrides(overrides))
        .await
        .unwrap();

    for amount in [1, 1_000, 300_000] {
        for region in [None, Some("seoul")] {
            let mut request = purchase("gambling", amount);
            if let Some(region) = region {
                request = request.in_region(region);
            }
            assert!(!h.engine.validate(&request).await.allowed);
            assert!(!h.engine.validate(&request.from_token(token.id.clone())).await.allowed);
        }
    }

    h.clock.advance(Duration::days(200));
    let expired = purchase("gambling", 1).from_token(token.id.clone());
    assert!(!h.engine.validate(&expired).await.allowed);
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let h = harness();
    h.engine.issue(disaster_relief(5_000)).await.unwrap();
    h.engine.issue(disaster_relief(7_000)).await.unwrap();
    h.clock.advance(Duration::days(90));

    let first = h.engine.run_sweep().await;
    assert_eq!(first.processed_count, 2);
    assert_eq!(first.total_reclaimed, Amount::new(12_000));

    let second = h.engine.run_sweep().await;
    assert_eq!(second.processed_count, 0);
    assert_eq!(second.total_reclaimed, Amount::ZERO);
}

#[tokio::test]
async fn bonus_is_floor_of_amount_times_rate() {
    let h = harness();
    let intent = IssueIntent::new(
        citizen(),
        Amount::new(1_000_000),
        FundType::TraditionalMarketBonus,
        Duration::days(30),
        "market-association",
    );
    h.engine.issue(intent).await.unwrap();

    for amount in [1u64, 9, 10, 99, 12_345, 499_999] {
        let result = h.engine.validate(&purchase("traditional-market", amount)).await;
        assert!(result.allowed, "amount {amount}");
        assert_eq!(result.applied_bonus, Some(Amount::new(amount / 10)), "amount {amount}");
    }

    let custom = IssueIntent::new(
        citizen(),
        Amount::new(1_000_000),
        FundType::General,
        Duration::days(30),
        "gov",
    )
    .with_overrides(RestrictionOverrides {
        bonus_rate: Some(dec!(0.07)),
        ..Default::default()
    });
    let token = h.engine.issue(custom).await.unwrap();
    let result = h
        .engine
        .validate(&purchase("anything", 1_000).from_token(token.id))
        .await;
    assert_eq!(result.applied_bonus, Some(Amount::new(70)));
}

#[tokio::test]
async fn soon_expiring_tokens_are_spent_first_and_warned_about() {
    let h = harness();
    let later = h.engine.issue(disaster_relief(10_000)).await.unwrap();
    let sooner = IssueIntent::new(
        citizen(),
        Amount::new(10_000),
        FundType::DisasterRelief,
        Duration::days(3),
        "disaster-response-hq",
    );
    let sooner = h.engine.issue(sooner).await.unwrap();

    let result = h.engine.validate(&purchase("grocery", 1_000)).await;
    assert_eq!(result.token_id, Some(sooner.id));
    assert_eq!(result.warnings, vec!["token expires in 3 day(s)".to_string()]);
    assert_ne!(result.token_id, Some(later.id));
}

#[tokio::test]
async fn balances_are_grouped_by_fund_type() {
    let h = harness();
    h.engine.issue(disaster_relief(100_000)).await.unwrap();
    h.engine
        .issue(IssueIntent::new(
            citizen(),
            Amount::new(20_000),
            FundType::ChildMeal,
            Duration::days(10),
            "education-office",
        ))
        .await
        .unwrap();

    let balances = h.engine.balance_by_fund_type(&citizen()).await;
    assert_eq!(balances[&FundType::DisasterRelief], Amount::new(100_000));
    assert_eq!(balances[&FundType::ChildMeal], Amount::new(20_000));
    assert_eq!(balances[&FundType::General], Amount::ZERO);

    h.clock.advance(Duration::days(10));
    let balances = h.engine.balance_by_fund_type(&citizen()).await;
    assert_eq!(balances[&FundType::ChildMeal], Amount::ZERO);
}

#[tokio::test]
async fn daily_limit_enforcement_is_opt_in() {
    let h = harness_with(EngineConfig {
        enforce_daily_limit: true,
        ..Default::default()
    });
    let intent = IssueIntent::new(
        citizen(),
        Amount::new(100_000),
        FundType::ChildMeal,
        Duration::days(30),
        "education-office",
    );
    h.engine.issue(intent).await.unwrap();

    h.engine.spend(&purchase("grocery", 15_000)).await.unwrap();
    h.engine.spend(&purchase("grocery", 15_000)).await.unwrap();
    let err = h.engine.spend(&purchase("grocery", 1)).await.unwrap_err();
    assert!(matches!(
        err,
        PbmError::Rejected(RejectionReason::DailyLimitExceeded { .. })
    ));

    h.clock.advance(Duration::days(1));
    assert!(h.engine.spend(&purchase("grocery", 1)).await.is_ok());
}

struct BrokenAudit;

#[async_trait::async_trait]
impl AuditSink for BrokenAudit {
    async fn log(&self, _event: AuditEvent) -> pbm_audit::Result<()> {
        Err(AuditError::Unavailable {
            message: "ledger offline".to_string(),
        })
    }
}

#[tokio::test]
async fn audit_outage_does_not_block_issuance_or_clawback() {
    let clock = Arc::new(ManualClock::starting_now());
    let engine = PbmEngine::builder()
        .clock(clock.clone())
        .audit_sink(Arc::new(BrokenAudit))
        .build()
        .unwrap();

    let token = engine.issue(disaster_relief(1_000)).await.unwrap();
    assert_eq!(engine.tokens_for(&citizen()).await, vec![token]);

    clock.advance(Duration::days(120));
    assert_eq!(engine.run_sweep().await.total_reclaimed, Amount::new(1_000));
    engine.flush_audit().await;
}

#[tokio::test]
async fn issuance_preconditions_fail_fast() {
    let h = harness();
    let err = h.engine.issue(disaster_relief(0)).await.unwrap_err();
    assert!(matches!(err, PbmError::InvalidArgument { .. }));
    assert!(h.engine.tokens_for(&citizen()).await.is_empty());
}
