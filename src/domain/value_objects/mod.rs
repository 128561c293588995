//! Value objects shared across aggregates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(SkuError::Empty);
        }
        if value.len() > 50 {
            return Err(SkuError::TooLong);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum SkuError {
    Empty,
    TooLong,
}
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "SKU empty"),
            Self::TooLong => write!(f, "SKU too long"),
        }
    }
}

/// Money value object. Amounts are kept at two decimal places.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount: amount.round_dp(2),
            currency: currency.to_string(),
        }
    }
    pub fn inr(amount: Decimal) -> Self {
        Self::new(amount, "INR")
    }
    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn currency(&self) -> &str {
        &self.currency
    }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }
    /// `percentage` is 0..=100.
    pub fn percent(&self, percentage: Decimal) -> Money {
        Money::new(self.amount * percentage / Decimal::from(100), &self.currency)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero("INR")
    }
}

#[derive(Debug, Clone)]
pub enum MoneyError {
    CurrencyMismatch,
}
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sku_normalized() {
        let sku = Sku::new("rice-5kg").unwrap();
        assert_eq!(sku.as_str(), "RICE-5KG");
    }

    #[test]
    fn test_money_add() {
        let a = Money::inr(dec!(100));
        let b = Money::inr(dec!(50));
        assert_eq!(a.add(&b).unwrap().amount(), dec!(150));
    }

    #[test]
    fn test_money_percent() {
        let total = Money::inr(dec!(1000));
        assert_eq!(total.percent(dec!(10)).amount(), dec!(100.00));
        assert_eq!(total.percent(dec!(5)).amount(), dec!(50.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let a = Money::inr(dec!(10));
        let b = Money::new(dec!(10), "USD");
        assert!(a.add(&b).is_err());
    }
}
