use crate::error::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Decimal places kept for balances and journal amounts once persisted.
pub const MONEY_SCALE: u32 = 2;
/// Decimal places kept for exchange rates once persisted.
pub const RATE_SCALE: u32 = 5;

fn round_half_away(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// An account balance.
///
/// Arithmetic is exact; the value is only rounded to [`MONEY_SCALE`] by
/// [`Balance::for_storage`], right before it is handed to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn for_storage(self) -> Self {
        Self(round_half_away(self.0, MONEY_SCALE))
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A non-negative monetary amount carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value.is_sign_negative() && !value.is_zero() {
            Err(LedgerError::InvalidInput(
                "amount must not be negative".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn for_storage(self) -> Self {
        Self(round_half_away(self.0, MONEY_SCALE))
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Multiplier converting an amount in one currency into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    pub const ONE: Self = Self(Decimal::ONE);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn for_storage(self) -> Self {
        Self(round_half_away(self.0, RATE_SCALE))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Conversion keeps full precision; rounding happens at persistence.
impl Mul<Rate> for Amount {
    type Output = Amount;
    fn mul(self, rate: Rate) -> Self::Output {
        Amount(self.0 * rate.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1 + b2, Balance::new(dec!(15.0)));
        assert_eq!(b1 - b2, Balance::new(dec!(5.0)));
        assert!((b2 - b1).is_negative());
        assert!(!(b1 - b1).is_negative());
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-0.01)),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_conversion_is_not_rounded_until_storage() {
        let amount = Amount::new(dec!(10.01)).unwrap();
        let converted = amount * Rate::new(dec!(0.91234));
        assert_eq!(converted.value(), dec!(9.1325234));
        assert_eq!(converted.for_storage().value(), dec!(9.13));
    }

    #[test]
    fn test_storage_rounding_is_half_away_from_zero() {
        assert_eq!(Balance::new(dec!(1.005)).for_storage(), Balance::new(dec!(1.01)));
        assert_eq!(Rate::new(dec!(1.123455)).for_storage().value(), dec!(1.12346));
    }

    #[test]
    fn test_balance_display_uses_two_places() {
        assert_eq!(Balance::new(dec!(7)).to_string(), "7.00");
    }
}
