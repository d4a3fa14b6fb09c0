//! Periodic clawback against the wall clock

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use pbm_audit::AuditLog;
use pbm_engine::{Amount, EngineConfig, FundType, IssueIntent, OwnerId, PbmEngine};
use tracing::info;

pub async fn run(
    config: EngineConfig,
    tokens: u32,
    run_secs: u64,
    json: bool,
) -> Result<()> {
    let log = Arc::new(AuditLog::new());
    let engine = PbmEngine::builder()
        .config(config)
        .audit_sink(log.clone())
        .build()?;

    for i in 0..tokens {
        let owner = OwnerId::new(format!("holder-{}", i % 3));
        engine
            .issue(IssueIntent::new(
                owner,
                Amount::new(1_000 * u64::from(i + 1)),
                FundType::General,
                Duration::seconds(i64::from(i % 3) + 1),
                "sweep-demo",
            ))
            .await?;
    }
    info!(tokens, "issued short-lived tokens");

    let handle = engine.spawn_sweeper();
    tokio::time::sleep(std::time::Duration::from_secs(run_secs)).await;
    let totals = handle.stop().await;
    engine.flush_audit().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        println!(
            "{} sweep(s) reclaimed {} from {} token(s); {} audit entries",
            totals.sweeps,
            totals.total_reclaimed,
            totals.processed_count,
            log.len().await
        );
    }
    Ok(())
}
