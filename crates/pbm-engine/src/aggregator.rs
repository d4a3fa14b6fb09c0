//! Balance summaries for wallet screens

use std::collections::BTreeMap;
use std::sync::Arc;

use pbm_types::{Amount, FundType, OwnerId};

use crate::{Clock, TokenStore};

/// Read-only per-fund-type balance reporting
pub struct BalanceAggregator {
    store: TokenStore,
    clock: Arc<dyn Clock>,
}

impl BalanceAggregator {
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Active balance per fund type; every fund type is present, possibly zero.
    ///
    /// Tokens with `expires_at <= now` are excluded even before the sweep
    /// removes them.
    pub async fn balance_by_fund_type(&self, owner: &OwnerId) -> BTreeMap<FundType, Amount> {
        let mut balances: BTreeMap<FundType, Amount> =
            FundType::ALL.into_iter().map(|f| (f, Amount::ZERO)).collect();

        let Some(slot) = self.store.slot(owner).await else {
            return balances;
        };
        let now = self.clock.now();
        let tokens = slot.read().await;
        for token in tokens.iter().filter(|t| t.is_active_at(now)) {
            let entry = balances.entry(token.fund_type).or_default();
            *entry = entry.saturating_add(token.amount);
        }
        balances
    }

    /// Sum of all active balances
    pub async fn total_active(&self, owner: &OwnerId) -> Amount {
        self.balance_by_fund_type(owner)
            .await
            .values()
            .fold(Amount::ZERO, |acc, v| acc.saturating_add(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use chrono::{DateTime, Duration, Utc};
    use pbm_types::{AuthorityId, DailyUsage, RestrictionTemplate, Token, TokenId};

    fn token(fund_type: FundType, amount: u64, expires_at: DateTime<Utc>) -> Token {
        Token {
            id: TokenId::new(),
            owner_id: OwnerId::new("dana"),
            amount: Amount::new(amount),
            fund_type,
            restrictions: RestrictionTemplate::default().with_expiry(expires_at),
            issued_at: Utc::now(),
            issued_by: AuthorityId::new("gov"),
            budget_code: None,
            daily_usage: DailyUsage::default(),
        }
    }

    #[tokio::test]
    async fn groups_active_balances_by_fund_type() {
        let store = TokenStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let now = clock.now();

        store.insert(token(FundType::ChildMeal, 10_000, now + Duration::days(5))).await;
        store.insert(token(FundType::ChildMeal, 5_000, now + Duration::days(50))).await;
        store.insert(token(FundType::FarmerSupport, 70_000, now + Duration::days(5))).await;
        store.insert(token(FundType::General, 99_999, now)).await;

        let aggregator = BalanceAggregator::new(store, clock);
        let owner = OwnerId::new("dana");
        let balances = aggregator.balance_by_fund_type(&owner).await;

        assert_eq!(balances.len(), FundType::ALL.len());
        assert_eq!(balances[&FundType::ChildMeal], Amount::new(15_000));
        assert_eq!(balances[&FundType::FarmerSupport], Amount::new(70_000));
        assert_eq!(balances[&FundType::General], Amount::ZERO);
        assert_eq!(balances[&FundType::DisasterRelief], Amount::ZERO);
        assert_eq!(aggregator.total_active(&owner).await, Amount::new(85_000));
    }

    #[tokio::test]
    async fn unknown_owner_reports_zeroes() {
        let aggregator =
            BalanceAggregator::new(TokenStore::new(), Arc::new(ManualClock::starting_now()));
        let balances = aggregator.balance_by_fund_type(&OwnerId::new("ghost")).await;
        assert!(balances.values().all(Amount::is_zero));
    }
}
