//! Fund types and merchant category codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy category under which a token is issued
///
/// The fund type selects the default restriction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundType {
    /// Emergency support after a declared disaster
    DisasterRelief,
    /// Meal cards for children
    ChildMeal,
    /// Culture and education allowance for young people
    YouthAllowance,
    /// Daily-living support for seniors
    SeniorWelfare,
    /// Input subsidies for farmers
    FarmerSupport,
    /// Cashback-bearing vouchers for traditional markets
    TraditionalMarketBonus,
    /// Unrestricted general-purpose funds
    General,
}

impl FundType {
    /// Every fund type, in declaration order
    pub const ALL: [FundType; 7] = [
        FundType::DisasterRelief,
        FundType::ChildMeal,
        FundType::YouthAllowance,
        FundType::SeniorWelfare,
        FundType::FarmerSupport,
        FundType::TraditionalMarketBonus,
        FundType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FundType::DisasterRelief => "disaster-relief",
            FundType::ChildMeal => "child-meal",
            FundType::YouthAllowance => "youth-allowance",
            FundType::SeniorWelfare => "senior-welfare",
            FundType::FarmerSupport => "farmer-support",
            FundType::TraditionalMarketBonus => "traditional-market-bonus",
            FundType::General => "general",
        }
    }
}

impl fmt::Display for FundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundType {
    type Err = crate::PbmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FundType::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| crate::PbmError::InvalidArgument {
                message: format!("unknown fund type: {s}"),
            })
    }
}

/// Merchant category code used to allow or block spending
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCode(pub String);

impl CategoryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Region code a merchant is located in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(pub String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
