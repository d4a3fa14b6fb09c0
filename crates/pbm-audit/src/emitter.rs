//! Fire-and-forget audit delivery

use crate::{AuditEvent, AuditSink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delivers audit events in the background with a bounded timeout
///
/// Delivery failures and timeouts are logged and never reported to the
/// caller. [`AuditEmitter::flush`] waits for deliveries still in flight.
#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
    timeout: Duration,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AuditEmitter {
    pub fn new(sink: Arc<dyn AuditSink>, timeout: Duration) -> Self {
        Self {
            sink,
            timeout,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Hand `event` to the sink without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn emit(&self, event: AuditEvent) {
        let sink = self.sink.clone();
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            let event_id = event.id;
            let token = event.token_id.clone();
            match tokio::time::timeout(timeout, sink.log(event)).await {
                Ok(Ok(())) => debug!(%event_id, %token, "audit event delivered"),
                Ok(Err(e)) => warn!(%event_id, %token, error = %e, "audit delivery failed"),
                Err(_) => warn!(
                    %event_id,
                    %token,
                    timeout_ms = timeout.as_millis() as u64,
                    "audit delivery timed out"
                ),
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Wait until every event emitted so far has been delivered or dropped.
    pub async fn flush(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.in_flight.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "audit delivery task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuditAction, AuditError, AuditLog, Result};
    use chrono::Utc;
    use pbm_types::{Amount, FundType, OwnerId, TokenId};
    use uuid::Uuid;

    fn event() -> AuditEvent {
        AuditEvent {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            owner_id: OwnerId::new("owner"),
            token_id: TokenId::new(),
            fund_type: FundType::DisasterRelief,
            budget_code: None,
            amount: Amount::new(5),
            action: AuditAction::TokenClawedBack {
                expired_at: Utc::now(),
            },
        }
    }

    struct FailingSink;

    #[async_trait::async_trait]
    impl AuditSink for FailingSink {
        async fn log(&self, _event: AuditEvent) -> Result<()> {
            Err(AuditError::Unavailable {
                message: "down".to_string(),
            })
        }
    }

    struct StalledSink;

    #[async_trait::async_trait]
    impl AuditSink for StalledSink {
        async fn log(&self, _event: AuditEvent) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_to_sink() {
        let log = AuditLog::new();
        let emitter = AuditEmitter::new(Arc::new(log.clone()), Duration::from_secs(1));

        emitter.emit(event());
        emitter.emit(event());
        emitter.flush().await;

        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let emitter = AuditEmitter::new(Arc::new(FailingSink), Duration::from_secs(1));
        emitter.emit(event());
        emitter.flush().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_sink_is_cut_off() {
        let emitter = AuditEmitter::new(Arc::new(StalledSink), Duration::from_millis(50));
        emitter.emit(event());
        tokio::time::timeout(Duration::from_secs(1), emitter.flush())
            .await
            .expect("flush should finish once the delivery times out");
    }
}
