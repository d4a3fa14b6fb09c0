//! Scripted walkthrough on a manual clock

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use pbm_engine::{
    Amount, EngineConfig, FundType, IssueIntent, ManualClock, OwnerId, PbmEngine,
    TransactionRequest, ValidationResult,
};

fn show(step: &str, result: &ValidationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "step": step, "result": result }));
        return Ok(());
    }
    match (&result.reason, result.allowed) {
        (_, true) => println!("{step}: allowed {:?}", result.warnings),
        (Some(reason), false) => println!("{step}: denied ({reason})"),
        (None, false) => println!("{step}: denied"),
    }
    Ok(())
}

pub async fn run(config: EngineConfig, json: bool) -> Result<()> {
    let clock = Arc::new(ManualClock::starting_now());
    let log = pbm_audit::AuditLog::new();
    let engine = PbmEngine::builder()
        .config(config)
        .clock(clock.clone())
        .audit_sink(Arc::new(log.clone()))
        .build()?;

    let owner = OwnerId::new("citizen-0001");
    let token = engine
        .issue(
            IssueIntent::new(
                owner.clone(),
                Amount::new(100_000),
                FundType::DisasterRelief,
                Duration::days(90),
                "disaster-response-hq",
            )
            .with_budget_code("DR-2026-Q3"),
        )
        .await?;
    if !json {
        println!("issued {} ({}) worth {}", token.id, token.fund_type, token.amount);
    }

    let grocery = TransactionRequest::new(owner.clone(), "grocery", Amount::new(50_000));
    show("grocery 50,000", &engine.validate(&grocery).await, json)?;

    let liquor = TransactionRequest::new(owner.clone(), "liquor-store", Amount::new(50_000));
    show("liquor-store 50,000", &engine.validate(&liquor).await, json)?;

    let large = TransactionRequest::new(owner.clone(), "grocery", Amount::new(400_000))
        .from_token(token.id.clone());
    show("grocery 400,000", &engine.validate(&large).await, json)?;

    let first = engine.deduct(&owner, &token.id, Amount::new(50_000)).await?;
    let second = engine.deduct(&owner, &token.id, Amount::new(60_000)).await;
    if !json {
        println!("deducted 50,000, remaining {}", first.remaining);
        match second {
            Ok(d) => println!("deducted 60,000, remaining {}", d.remaining),
            Err(e) => println!("second deduction refused: {e}"),
        }
    }

    clock.advance(Duration::days(91));
    let report = engine.run_sweep().await;
    engine.flush_audit().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "sweep reclaimed {} from {} token(s); {} audit entries, chain intact: {}",
            report.total_reclaimed,
            report.processed_count,
            log.len().await,
            log.verify_chain().await
        );
        println!("tokens left: {}", engine.tokens_for(&owner).await.len());
    }
    Ok(())
}
