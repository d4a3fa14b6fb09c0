//! Amount type for PBM
//!
//! Balances and transaction amounts are whole minor currency units. There is
//! no fractional part and no currency tag: every token in one engine is
//! denominated in the same currency.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative quantity of minor currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `floor(self * rate)`, computed exactly.
    ///
    /// Negative or non-representable results collapse to zero.
    pub fn apply_rate(self, rate: Decimal) -> Amount {
        Decimal::from(self.0)
            .checked_mul(rate)
            .map(|v| v.floor())
            .and_then(|v| v.to_u64())
            .map(Amount)
            .unwrap_or(Amount::ZERO)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Group thousands for readability: 300000 -> 300,000
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        f.write_str(&out)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Amount::new(0).to_string(), "0");
        assert_eq!(Amount::new(999).to_string(), "999");
        assert_eq!(Amount::new(300_000).to_string(), "300,000");
        assert_eq!(Amount::new(1_234_567).to_string(), "1,234,567");
    }

    #[test]
    fn apply_rate_floors() {
        assert_eq!(Amount::new(10_001).apply_rate(dec!(0.1)), Amount::new(1_000));
        assert_eq!(Amount::new(100).apply_rate(dec!(0.29)), Amount::new(29));
        assert_eq!(Amount::new(9).apply_rate(dec!(0.05)), Amount::new(0));
        assert_eq!(Amount::new(50_000).apply_rate(Decimal::ZERO), Amount::ZERO);
    }

    #[test]
    fn checked_sub_refuses_to_go_negative() {
        assert!(Amount::new(5).checked_sub(Amount::new(6)).is_none());
        assert_eq!(Amount::new(6).checked_sub(Amount::new(6)), Some(Amount::ZERO));
    }
}
