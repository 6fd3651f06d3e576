//! # Money Module
//!
//! Provides the `Money` and `Percentage` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 12.5% discount on 9,999.99 computed in f64 drifts by fractions of   │
//! │  a cent, and summed over an order the drift shows up on the receipt.   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis Points                            │
//! │    amounts are i64 cents, percentages are u32 basis points,            │
//! │    products go through i128 and are rounded exactly once               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{Money, Percentage};
//!
//! let price = Money::from_cents(1_000_000); // 10,000.00
//! let line = price * 3;
//! assert_eq!(line.cents(), 3_000_000);
//!
//! let discounted = line.apply_percentage_discount(Percentage::from_bps(1000)); // 10% off
//! assert_eq!(discounted.cents(), 2_700_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

/// Number of cents in one whole currency unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// Basis points in 100%.
pub const FULL_BPS: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative when an order sells below cost
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Newtype**: serde writes it as a plain integer
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──┬──► price_line_item ──► TransactionItem.line_total   │
/// │  BundleTier.price┘                                │                    │
/// │                                                   ▼                    │
/// │  Product.cost ──► COGS ──┐            Σ line totals − order discount  │
/// │                          │                        │                    │
/// │                          └──────► profit ◄── Transaction.total_amount  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(90_000).cents(), 9_000_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * CENTS_PER_UNIT)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / CENTS_PER_UNIT
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % CENTS_PER_UNIT).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` if the result leaves the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
    /// ```
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `percentage` of this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides the rounding (5000/10000 = 0.5).
    pub fn percentage_of(&self, percentage: Percentage) -> Money {
        let cents = (self.0 as i128 * percentage.bps() as i128 + 5000) / FULL_BPS as i128;
        Money::from_cents(cents as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, Percentage};
    ///
    /// let subtotal = Money::from_cents(10000);
    /// let discounted = subtotal.apply_percentage_discount(Percentage::from_bps(1000));
    /// assert_eq!(discounted.cents(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, percentage: Percentage) -> Money {
        *self - self.percentage_of(percentage)
    }

    /// Rounds to a whole number of currency units using `rule`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, RoundingRule};
    ///
    /// assert_eq!(Money::from_cents(250).round_to_units(RoundingRule::HalfUp).cents(), 300);
    /// assert_eq!(Money::from_cents(250).round_to_units(RoundingRule::HalfEven).cents(), 200);
    /// ```
    pub fn round_to_units(&self, rule: RoundingRule) -> Money {
        let whole = self.0 / CENTS_PER_UNIT;
        let rest = self.0 % CENTS_PER_UNIT;
        let twice = rest.abs() * 2;
        let away = match twice.cmp(&CENTS_PER_UNIT) {
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => match rule {
                RoundingRule::HalfUp => true,
                RoundingRule::HalfEven => whole % 2 != 0,
            },
        };
        let rounded = if away { whole + self.0.signum() } else { whole };
        Money::from_units(rounded)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display: `-1234.50`. Clients format for their locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in basis points (bps).
///
/// 1 basis point = 0.01%, so 1250 bps = 12.5%. Valid range is 0..=10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Converts a human percentage (e.g. `12.5`) to basis points.
    ///
    /// Returns `None` when the value is not finite or falls outside 0..=100.
    pub fn from_percent(pct: f64) -> Option<Self> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return None;
        }
        Some(Percentage((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage number (for display only).
    #[inline]
    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Rounding Rule
// =============================================================================

/// How a value exactly halfway between two whole units is rounded.
///
/// Only ties are affected; everything else rounds to the nearest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoundingRule {
    /// Ties round away from zero (2.5 → 3, -2.5 → -3).
    #[default]
    HalfUp,
    /// Bankers rounding: ties round to the even neighbour (2.5 → 2, 3.5 → 4).
    HalfEven,
}

impl FromStr for RoundingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half_up" => Ok(RoundingRule::HalfUp),
            "half_even" => Ok(RoundingRule::HalfEven),
            other => Err(format!("unknown rounding rule '{}'", other)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_units() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
        assert_eq!(Money::from_units(7).cents(), 700);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(700)),
            Some(Money::from_cents(-200))
        );
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
    }

    #[test]
    fn test_percentage_discount_rounds_to_cent() {
        // 12.5% of 0.99 = 0.12375 -> 0.12
        let amount = Money::from_cents(99);
        let pct = Percentage::from_bps(1250);
        assert_eq!(amount.percentage_of(pct).cents(), 12);
        assert_eq!(amount.apply_percentage_discount(pct).cents(), 87);
    }

    #[test]
    fn test_full_and_zero_discount() {
        let amount = Money::from_cents(12345);
        assert!(amount
            .apply_percentage_discount(Percentage::from_bps(FULL_BPS))
            .is_zero());
        assert_eq!(
            amount.apply_percentage_discount(Percentage::from_bps(0)),
            amount
        );
    }

    #[test]
    fn test_percentage_from_percent() {
        assert_eq!(Percentage::from_percent(12.5).map(|p| p.bps()), Some(1250));
        assert_eq!(Percentage::from_percent(100.0).map(|p| p.bps()), Some(10_000));
        assert!(Percentage::from_percent(100.01).is_none());
        assert!(Percentage::from_percent(-1.0).is_none());
        assert!(Percentage::from_percent(f64::NAN).is_none());
    }

    #[test]
    fn test_round_half_up() {
        let rule = RoundingRule::HalfUp;
        assert_eq!(Money::from_cents(249).round_to_units(rule).cents(), 200);
        assert_eq!(Money::from_cents(250).round_to_units(rule).cents(), 300);
        assert_eq!(Money::from_cents(-250).round_to_units(rule).cents(), -300);
        assert_eq!(Money::from_cents(-249).round_to_units(rule).cents(), -200);
        assert_eq!(Money::from_cents(400).round_to_units(rule).cents(), 400);
    }

    #[test]
    fn test_round_half_even() {
        let rule = RoundingRule::HalfEven;
        assert_eq!(Money::from_cents(250).round_to_units(rule).cents(), 200);
        assert_eq!(Money::from_cents(350).round_to_units(rule).cents(), 400);
        assert_eq!(Money::from_cents(-250).round_to_units(rule).cents(), -200);
        assert_eq!(Money::from_cents(251).round_to_units(rule).cents(), 300);
    }

    #[test]
    fn test_rounding_rule_from_str() {
        assert_eq!("half_up".parse::<RoundingRule>(), Ok(RoundingRule::HalfUp));
        assert_eq!(" HALF_EVEN ".parse::<RoundingRule>(), Ok(RoundingRule::HalfEven));
        assert!("ceil".parse::<RoundingRule>().is_err());
    }

    #[test]
    fn test_money_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(1500)).unwrap();
        assert_eq!(json, "1500");
    }
}
