//! In-process audit sinks
//!
//! [`AuditLog`] is append-only and hash-chained: each entry commits to the
//! previous entry's hash, so any rewrite of history breaks `verify_chain`.

use crate::{AuditError, AuditEvent, AuditSink, Result};
use pbm_types::{OwnerId, TokenId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;

const GENESIS_HASH: &str = "genesis";

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub previous_hash: String,
    pub hash: String,
    pub event: AuditEvent,
}

impl AuditEntry {
    /// Compute hash of this entry
    pub fn compute_hash(&self) -> Result<String> {
        let body = serde_json::to_string(&self.event).map_err(|e| AuditError::Serialization {
            message: e.to_string(),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(body.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Verify the entry hash
    pub fn verify(&self) -> bool {
        matches!(self.compute_hash(), Ok(hash) if hash == self.hash)
    }
}

/// Append-only, hash-chained in-memory audit log
#[derive(Clone, Default)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, event: AuditEvent) -> Result<AuditEntry> {
        let mut entries = self.entries.write().await;
        let previous_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut entry = AuditEntry {
            sequence: entries.len() as u64,
            previous_hash,
            hash: String::new(),
            event,
        };
        entry.hash = entry.compute_hash()?;
        entries.push(entry.clone());
        Ok(entry)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for_owner(&self, owner: &OwnerId) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.event.owner_id == owner)
            .cloned()
            .collect()
    }

    pub async fn entries_for_token(&self, token: &TokenId) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.event.token_id == token)
            .cloned()
            .collect()
    }

    /// Verify every hash and every back-link
    pub async fn verify_chain(&self) -> bool {
        let entries = self.entries.read().await;
        let mut previous = GENESIS_HASH.to_string();
        for entry in entries.iter() {
            if entry.previous_hash != previous || !entry.verify() {
                return false;
            }
            previous = entry.hash.clone();
        }
        true
    }
}

#[async_trait::async_trait]
impl AuditSink for AuditLog {
    async fn log(&self, event: AuditEvent) -> Result<()> {
        self.append(event).await.map(|_| ())
    }
}

/// Writes audit events to `tracing` and nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait::async_trait]
impl AuditSink for TracingAuditSink {
    async fn log(&self, event: AuditEvent) -> Result<()> {
        tracing::info!(
            target: "pbm::audit",
            owner = %event.owner_id,
            token = %event.token_id,
            fund_type = %event.fund_type,
            budget_code = ?event.budget_code,
            amount = event.amount.value(),
            action = ?event.action,
            "audit event"
        );
        Ok(())
    }
}
