//! Purpose-bound tokens
//!
//! A token is a remaining balance plus the restrictions that govern how it may
//! be spent. Lifecycle:
//!
//! ```text
//! Issued (Active) ──deduct to zero──▶ Depleted  (removed)
//!        └──────────expiry sweep────▶ Expired   (removed, balance reclaimed)
//! ```

use crate::{Amount, AuthorityId, BudgetCode, FundType, OwnerId, RestrictionSet, TokenId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Spendable
    Active,
    /// Past expiry with balance still on it, awaiting clawback
    Expired,
    /// Balance reached zero
    Depleted,
}

/// Amount spent from a token on a single UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyUsage {
    pub day: Option<NaiveDate>,
    pub spent: Amount,
}

impl DailyUsage {
    /// Spent on `day`; any other day counts as nothing spent.
    pub fn spent_on(&self, day: NaiveDate) -> Amount {
        if self.day == Some(day) {
            self.spent
        } else {
            Amount::ZERO
        }
    }

    pub fn record(&mut self, day: NaiveDate, amount: Amount) {
        if self.day != Some(day) {
            self.day = Some(day);
            self.spent = Amount::ZERO;
        }
        self.spent = self.spent.saturating_add(amount);
    }
}

/// An issued purpose-bound token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub owner_id: OwnerId,
    /// Remaining balance
    pub amount: Amount,
    pub fund_type: FundType,
    pub restrictions: RestrictionSet,
    pub issued_at: DateTime<Utc>,
    pub issued_by: AuthorityId,
    pub budget_code: Option<BudgetCode>,
    #[serde(default)]
    pub daily_usage: DailyUsage,
}

impl Token {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.restrictions.expires_at
    }

    /// Active means `expires_at > now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.restrictions.expires_at > now
    }

    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        if self.amount.is_zero() {
            TokenStatus::Depleted
        } else if self.is_active_at(now) {
            TokenStatus::Active
        } else {
            TokenStatus::Expired
        }
    }

    /// Eligible for clawback: `expires_at <= now` with a non-zero balance.
    pub fn is_reclaimable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_active_at(now) && !self.amount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestrictionTemplate;
    use chrono::Duration;

    fn token(amount: u64, expires_at: DateTime<Utc>) -> Token {
        Token {
            id: TokenId::new(),
            owner_id: OwnerId::new("owner"),
            amount: Amount::new(amount),
            fund_type: FundType::General,
            restrictions: RestrictionTemplate::default().with_expiry(expires_at),
            issued_at: Utc::now(),
            issued_by: AuthorityId::new("ministry"),
            budget_code: None,
            daily_usage: DailyUsage::default(),
        }
    }

    #[test]
    fn status_follows_balance_then_expiry() {
        let now = Utc::now();
        assert_eq!(token(10, now + Duration::days(1)).status(now), TokenStatus::Active);
        assert_eq!(token(10, now).status(now), TokenStatus::Expired);
        assert_eq!(token(0, now - Duration::days(1)).status(now), TokenStatus::Depleted);
    }

    #[test]
    fn expiry_boundary_is_reclaimable() {
        let now = Utc::now();
        let t = token(10, now);
        assert!(!t.is_active_at(now));
        assert!(t.is_reclaimable_at(now));
        assert!(!token(0, now).is_reclaimable_at(now));
    }

    #[test]
    fn daily_usage_resets_on_a_new_day() {
        let day1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut usage = DailyUsage::default();

        usage.record(day1, Amount::new(100));
        usage.record(day1, Amount::new(50));
        assert_eq!(usage.spent_on(day1), Amount::new(150));
        assert_eq!(usage.spent_on(day2), Amount::ZERO);

        usage.record(day2, Amount::new(10));
        assert_eq!(usage.spent_on(day2), Amount::new(10));
        assert_eq!(usage.spent_on(day1), Amount::ZERO);
    }
}
