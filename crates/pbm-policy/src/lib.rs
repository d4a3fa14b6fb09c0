//! PBM Policy - Fund-type restriction templates
//!
//! Every fund type maps to a default [`RestrictionTemplate`]. The registry is
//! built once and never mutated; issuance reads a template, merges any
//! administrative overrides on top and stamps the expiry.

use std::collections::{BTreeSet, HashMap};

use pbm_types::{Amount, CategoryCode, FundType, RestrictionTemplate};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub mod categories;

/// A fund type together with its default restrictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTemplate {
    pub fund_type: FundType,
    pub restrictions: RestrictionTemplate,
}

/// Immutable lookup table: fund type -> default restriction template
#[derive(Debug, Clone)]
pub struct PolicyTemplateRegistry {
    templates: HashMap<FundType, RestrictionTemplate>,
}

impl PolicyTemplateRegistry {
    /// The built-in templates for every fund type
    pub fn builtin() -> Self {
        let templates = FundType::ALL
            .into_iter()
            .map(|fund| (fund, builtin_template(fund)))
            .collect();
        Self { templates }
    }

    /// Replace one fund type's template, consuming the registry
    pub fn with_template(mut self, fund_type: FundType, template: RestrictionTemplate) -> Self {
        self.templates.insert(fund_type, template);
        self
    }

    /// Default restrictions for `fund_type`
    pub fn template_for(&self, fund_type: FundType) -> RestrictionTemplate {
        self.templates
            .get(&fund_type)
            .cloned()
            .unwrap_or_else(|| builtin_template(fund_type))
    }

    /// All templates in fund-type declaration order
    pub fn all(&self) -> Vec<PolicyTemplate> {
        FundType::ALL
            .into_iter()
            .map(|fund_type| PolicyTemplate {
                fund_type,
                restrictions: self.template_for(fund_type),
            })
            .collect()
    }
}

impl Default for PolicyTemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn codes(list: &[&str]) -> BTreeSet<CategoryCode> {
    list.iter().map(|c| CategoryCode::from(*c)).collect()
}

fn builtin_template(fund_type: FundType) -> RestrictionTemplate {
    use categories::*;

    match fund_type {
        FundType::DisasterRelief => RestrictionTemplate {
            allowed_categories: BTreeSet::new(),
            blocked_categories: codes(&[LIQUOR_STORE, GAMBLING, ENTERTAINMENT, LUXURY]),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(300_000)),
            daily_limit: Some(Amount::new(1_000_000)),
            bonus_rate: Some(dec!(0)),
        },
        FundType::ChildMeal => RestrictionTemplate {
            allowed_categories: codes(&[GROCERY, RESTAURANT, CONVENIENCE_STORE, BAKERY]),
            blocked_categories: codes(&[LIQUOR_STORE, TOBACCO, GAMBLING]),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(15_000)),
            daily_limit: Some(Amount::new(30_000)),
            bonus_rate: None,
        },
        FundType::YouthAllowance => RestrictionTemplate {
            allowed_categories: codes(&[BOOKSTORE, EDUCATION, CULTURE, SPORTS]),
            blocked_categories: codes(&[LIQUOR_STORE, TOBACCO, GAMBLING]),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(100_000)),
            daily_limit: None,
            bonus_rate: Some(dec!(0.05)),
        },
        FundType::SeniorWelfare => RestrictionTemplate {
            allowed_categories: codes(&[GROCERY, PHARMACY, HOSPITAL, TRADITIONAL_MARKET]),
            blocked_categories: codes(&[GAMBLING]),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(200_000)),
            daily_limit: Some(Amount::new(500_000)),
            bonus_rate: None,
        },
        FundType::FarmerSupport => RestrictionTemplate {
            allowed_categories: codes(&[FARM_SUPPLY, AGRICULTURAL_EQUIPMENT, SEED, FERTILIZER]),
            blocked_categories: codes(&[LIQUOR_STORE, GAMBLING]),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(5_000_000)),
            daily_limit: None,
            bonus_rate: None,
        },
        FundType::TraditionalMarketBonus => RestrictionTemplate {
            allowed_categories: codes(&[TRADITIONAL_MARKET]),
            blocked_categories: BTreeSet::new(),
            allowed_regions: None,
            max_single_transaction: Some(Amount::new(500_000)),
            daily_limit: None,
            bonus_rate: Some(dec!(0.10)),
        },
        FundType::General => RestrictionTemplate::default(),
    }
}
