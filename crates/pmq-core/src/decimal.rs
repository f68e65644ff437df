//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors critical in financial calculations.
//! Prices on binary outcome markets live in (0, 1).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with sizes in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Check that the price is a valid outcome-token price: strictly
    /// between 0 and 1.
    #[inline]
    pub fn is_valid_probability(&self) -> bool {
        self.0 > Decimal::ZERO && self.0 < Decimal::ONE
    }

    /// Snap down to the tick grid.
    #[inline]
    pub fn round_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).floor() * tick_size.0)
    }

    /// Distance to another price expressed in whole ticks, rounded to
    /// the nearest integer. Returns 0 when the tick size is zero.
    #[inline]
    pub fn ticks_from(&self, other: Price, tick_size: Price) -> i64 {
        if tick_size.is_zero() {
            return 0;
        }
        ((self.0 - other.0) / tick_size.0)
            .round()
            .to_i64()
            .unwrap_or(0)
    }

    /// Price of the complementary outcome: `1 - p`.
    #[inline]
    pub fn complement(&self) -> Self {
        Self(Decimal::ONE - self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Size/quantity in outcome shares with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Notional value in USDC: size * price.
    ///
    /// On a binary market this is also the worst-case loss of a long
    /// position if the token settles to zero.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Size {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_ticks_from() {
        let p1 = Price::new(dec!(0.51));
        let p2 = Price::new(dec!(0.49));
        let tick = Price::new(dec!(0.01));

        assert_eq!(p1.ticks_from(p2, tick), 2);
        assert_eq!(p2.ticks_from(p1, tick), -2);
    }

    #[test]
    fn test_price_round_to_tick() {
        let price = Price::new(dec!(0.4567));
        let tick = Price::new(dec!(0.01));

        let rounded = price.round_to_tick(tick);
        assert_eq!(rounded.0, dec!(0.45));
    }

    #[test]
    fn test_price_complement() {
        let price = Price::new(dec!(0.35));
        assert_eq!(price.complement().inner(), dec!(0.65));
    }

    #[test]
    fn test_valid_probability_bounds() {
        assert!(Price::new(dec!(0.5)).is_valid_probability());
        assert!(!Price::ZERO.is_valid_probability());
        assert!(!Price::ONE.is_valid_probability());
        assert!(!Price::new(dec!(1.2)).is_valid_probability());
    }

    #[test]
    fn test_notional_calculation() {
        let size = Size::new(dec!(100));
        let price = Price::new(dec!(0.42));

        assert_eq!(size.notional(price), dec!(42));
    }
}
