//! Engine configuration

use pbm_types::{PbmError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Longest expiry warning window accepted, about a century
pub const MAX_EXPIRY_WARNING_DAYS: i64 = 36_500;

/// How a token is picked when the caller does not name one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenSelection {
    /// Soonest-expiring eligible token first (ties: earliest issued, then
    /// insertion order), so balances closest to clawback are spent first
    #[default]
    EarliestExpiry,
    /// First eligible token in insertion order
    InsertionOrder,
}

impl FromStr for TokenSelection {
    type Err = PbmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "earliest-expiry" => Ok(Self::EarliestExpiry),
            "insertion-order" => Ok(Self::InsertionOrder),
            other => Err(PbmError::invalid(format!("unknown token selection: {other}"))),
        }
    }
}

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on a single audit delivery
    pub audit_timeout_secs: u64,
    /// Allowed transactions on tokens expiring sooner than this get a warning
    pub expiry_warning_days: i64,
    /// Period of the background clawback sweep
    pub sweep_interval_secs: u64,
    pub selection: TokenSelection,
    /// Check each token's daily limit against what it spent today
    pub enforce_daily_limit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_timeout_secs: 3,
            expiry_warning_days: 7,
            sweep_interval_secs: 60 * 60,
            selection: TokenSelection::EarliestExpiry,
            enforce_daily_limit: false,
        }
    }
}

impl EngineConfig {
    /// Load overrides from `PBM_*` environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<u64>("PBM_AUDIT_TIMEOUT_SECS")? {
            config.audit_timeout_secs = v;
        }
        if let Some(v) = env_parse::<i64>("PBM_EXPIRY_WARNING_DAYS")? {
            config.expiry_warning_days = v;
        }
        if let Some(v) = env_parse::<u64>("PBM_SWEEP_INTERVAL_SECS")? {
            config.sweep_interval_secs = v;
        }
        if let Ok(v) = std::env::var("PBM_TOKEN_SELECTION") {
            config.selection = v.parse()?;
        }
        if let Some(v) = env_parse::<bool>("PBM_ENFORCE_DAILY_LIMIT")? {
            config.enforce_daily_limit = v;
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.audit_timeout_secs == 0 {
            errors.push("audit timeout must be at least one second".to_string());
        }
        if self.expiry_warning_days < 0 {
            errors.push("expiry warning window cannot be negative".to_string());
        } else if self.expiry_warning_days > MAX_EXPIRY_WARNING_DAYS {
            errors.push(format!(
                "expiry warning window cannot exceed {MAX_EXPIRY_WARNING_DAYS} days"
            ));
        }
        if self.sweep_interval_secs == 0 {
            errors.push("sweep interval must be at least one second".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Warning window, clamped to the accepted range
    pub fn expiry_warning(&self) -> chrono::Duration {
        let days = self.expiry_warning_days.clamp(0, MAX_EXPIRY_WARNING_DAYS);
        chrono::Duration::try_days(days).unwrap_or_else(chrono::Duration::zero)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PbmError::invalid(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}
