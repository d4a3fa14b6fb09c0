//! Spending restrictions carried by each token
//!
//! A [`RestrictionTemplate`] is the fund-type default (no expiry). Issuance
//! merges caller overrides on top and stamps an absolute expiry, producing
//! the token's [`RestrictionSet`], which never changes afterwards.

use crate::{Amount, CategoryCode, PbmError, RegionCode, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default restrictions for a fund type, without an expiry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestrictionTemplate {
    /// Empty means "no allow-list filter"
    pub allowed_categories: BTreeSet<CategoryCode>,
    /// Always checked first
    pub blocked_categories: BTreeSet<CategoryCode>,
    pub allowed_regions: Option<BTreeSet<RegionCode>>,
    pub max_single_transaction: Option<Amount>,
    pub daily_limit: Option<Amount>,
    /// Cashback fraction in `[0, 1]`
    pub bonus_rate: Option<Decimal>,
}

/// Field-by-field administrative overrides applied at issuance
///
/// `None` keeps the template value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestrictionOverrides {
    pub allowed_categories: Option<BTreeSet<CategoryCode>>,
    pub blocked_categories: Option<BTreeSet<CategoryCode>>,
    pub allowed_regions: Option<BTreeSet<RegionCode>>,
    pub max_single_transaction: Option<Amount>,
    pub daily_limit: Option<Amount>,
    pub bonus_rate: Option<Decimal>,
}

impl RestrictionOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl RestrictionTemplate {
    /// Shallow merge: every `Some` override replaces the template field.
    pub fn merge(mut self, overrides: RestrictionOverrides) -> Self {
        if let Some(v) = overrides.allowed_categories {
            self.allowed_categories = v;
        }
        if let Some(v) = overrides.blocked_categories {
            self.blocked_categories = v;
        }
        if let Some(v) = overrides.allowed_regions {
            self.allowed_regions = Some(v);
        }
        if let Some(v) = overrides.max_single_transaction {
            self.max_single_transaction = Some(v);
        }
        if let Some(v) = overrides.daily_limit {
            self.daily_limit = Some(v);
        }
        if let Some(v) = overrides.bonus_rate {
            self.bonus_rate = Some(v);
        }
        self
    }

    /// Reject a bonus rate outside `[0, 1]`.
    pub fn check(&self) -> Result<()> {
        if let Some(rate) = self.bonus_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(PbmError::InvalidArgument {
                    message: format!("bonus rate {rate} is outside [0, 1]"),
                });
            }
        }
        Ok(())
    }

    /// Stamp an absolute expiry, producing a token's restriction set.
    pub fn with_expiry(self, expires_at: DateTime<Utc>) -> RestrictionSet {
        RestrictionSet {
            allowed_categories: self.allowed_categories,
            blocked_categories: self.blocked_categories,
            allowed_regions: self.allowed_regions,
            max_single_transaction: self.max_single_transaction,
            daily_limit: self.daily_limit,
            expires_at,
            bonus_rate: self.bonus_rate,
        }
    }
}

/// The restrictions owned by one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionSet {
    pub allowed_categories: BTreeSet<CategoryCode>,
    pub blocked_categories: BTreeSet<CategoryCode>,
    pub allowed_regions: Option<BTreeSet<RegionCode>>,
    pub max_single_transaction: Option<Amount>,
    pub daily_limit: Option<Amount>,
    pub expires_at: DateTime<Utc>,
    pub bonus_rate: Option<Decimal>,
}

impl RestrictionSet {
    pub fn is_blocked(&self, category: &CategoryCode) -> bool {
        self.blocked_categories.contains(category)
    }

    /// True when the allow-list is empty or contains `category`.
    pub fn is_allow_listed(&self, category: &CategoryCode) -> bool {
        self.allowed_categories.is_empty() || self.allowed_categories.contains(category)
    }

    /// A region filter applies only when the list is non-empty and the
    /// transaction names a region.
    pub fn permits_region(&self, region: Option<&RegionCode>) -> bool {
        match (&self.allowed_regions, region) {
            (Some(allowed), Some(region)) if !allowed.is_empty() => allowed.contains(region),
            _ => true,
        }
    }

    /// The single-transaction cap, if `amount` exceeds it.
    pub fn exceeded_single_cap(&self, amount: Amount) -> Option<Amount> {
        self.max_single_transaction.filter(|cap| amount > *cap)
    }

    /// The bonus rate when it is strictly positive.
    pub fn effective_bonus_rate(&self) -> Option<Decimal> {
        self.bonus_rate.filter(|rate| *rate > Decimal::ZERO)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
