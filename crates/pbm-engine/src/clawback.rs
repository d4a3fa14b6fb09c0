//! Clawback of expired balances
//!
//! A sweep scans every owner's tokens and removes each token with
//! `expires_at <= now` and a non-zero balance, reclaiming that balance and
//! emitting one audit event per token. Removed tokens cannot be swept twice,
//! so back-to-back sweeps with no new expiries reclaim nothing. Owners left
//! with no tokens are dropped from the store at the end of each sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pbm_audit::{AuditEmitter, AuditEvent};
use pbm_types::{Amount, BudgetCode, FundType, OwnerId, TokenId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{Clock, TokenStore};

/// One reclaimed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackRecord {
    pub owner_id: OwnerId,
    pub token_id: TokenId,
    pub fund_type: FundType,
    pub budget_code: Option<BudgetCode>,
    pub reclaimed: Amount,
    pub expired_at: DateTime<Utc>,
}

/// Result of one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub processed_count: usize,
    pub total_reclaimed: Amount,
    pub records: Vec<ClawbackRecord>,
}

/// Reclaims balance from expired tokens
pub struct ClawbackScheduler {
    store: TokenStore,
    clock: Arc<dyn Clock>,
    audit: AuditEmitter,
}

impl ClawbackScheduler {
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>, audit: AuditEmitter) -> Self {
        Self { store, clock, audit }
    }

    /// Run one sweep over every owner
    pub async fn run_sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut records = Vec::new();

        for owner in self.store.owners().await {
            let Some(slot) = self.store.slot(&owner).await else {
                continue;
            };
            let mut tokens = slot.write().await;
            if !tokens.iter().any(|t| t.is_reclaimable_at(now)) {
                continue;
            }

            let mut kept = Vec::with_capacity(tokens.len());
            for token in tokens.drain(..) {
                if !token.is_reclaimable_at(now) {
                    kept.push(token);
                    continue;
                }

                info!(
                    token = %token.id,
                    owner = %token.owner_id,
                    fund_type = %token.fund_type,
                    reclaimed = token.amount.value(),
                    "token clawed back"
                );
                self.audit.emit(AuditEvent::clawed_back(&token, now));
                records.push(ClawbackRecord {
                    owner_id: token.owner_id,
                    token_id: token.id,
                    fund_type: token.fund_type,
                    budget_code: token.budget_code,
                    reclaimed: token.amount,
                    expired_at: token.restrictions.expires_at,
                });
            }
            *tokens = kept;
        }

        let pruned = self.store.prune_empty().await;

        let total_reclaimed = records
            .iter()
            .fold(Amount::ZERO, |acc, r| acc.saturating_add(r.reclaimed));

        debug!(
            processed = records.len(),
            total_reclaimed = total_reclaimed.value(),
            pruned,
            "clawback sweep finished"
        );

        SweepReport {
            swept_at: now,
            processed_count: records.len(),
            total_reclaimed,
            records,
        }
    }

    /// Run a sweep every `every` until the returned handle is stopped.
    ///
    /// The first sweep runs immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> SweepHandle {
        let (shutdown, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut totals = SweepTotals::default();
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = self.run_sweep().await;
                        totals.sweeps += 1;
                        totals.processed_count += report.processed_count;
                        totals.total_reclaimed =
                            totals.total_reclaimed.saturating_add(report.total_reclaimed);
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }

            info!(
                sweeps = totals.sweeps,
                processed = totals.processed_count,
                total_reclaimed = totals.total_reclaimed.value(),
                "clawback scheduler stopped"
            );
            totals
        });

        SweepHandle { shutdown, task }
    }
}

/// Running totals of a periodic sweeper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepTotals {
    pub sweeps: u64,
    pub processed_count: usize,
    pub total_reclaimed: Amount,
}

/// Handle to a periodic sweeper started with [`ClawbackScheduler::spawn`]
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<SweepTotals>,
}

impl SweepHandle {
    /// Stop the sweeper and return what it did
    pub async fn stop(self) -> SweepTotals {
        let _ = self.shutdown.send(true);
        self.task.await.unwrap_or_default()
    }
}
