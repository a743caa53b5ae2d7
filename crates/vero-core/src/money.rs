//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Cents
//! ```text
//! Every amount in the engine is an i64 number of cents. Decimal input is
//! converted exactly once, at the parse boundary, with half-up rounding to
//! two places. Settlement comparisons therefore never see float drift:
//! "already fully paid" and "overpaid" checks are exact integer compares.
//! ```
//!
//! ## Usage
//! ```rust
//! use vero_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // 10.99
//!
//! // Parse decimal input at the boundary
//! let paid = Money::parse("10.99").unwrap();
//! assert_eq!(paid, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::error::{ValidationError, ValidationResult};
use crate::types::FeeRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// - **i64 (signed)**: ledger math subtracts before clamping, so the
///   intermediate may dip below zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde transparent**: serializes as the raw cent count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal string into Money, rounding half-up at two places.
    ///
    /// This is the single point where free-form amounts enter the engine.
    ///
    /// ## Rules
    /// - optional leading `-`, then digits, then optional `.` and digits
    /// - fewer than two decimals are padded (`"12.3"` is 12.30)
    /// - more than two decimals round half-up (`"12.345"` is 12.35)
    /// - blank input and stray characters are rejected
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    ///
    /// assert_eq!(Money::parse("30").unwrap().cents(), 3000);
    /// assert_eq!(Money::parse("12.3").unwrap().cents(), 1230);
    /// assert_eq!(Money::parse("12.345").unwrap().cents(), 1235);
    /// assert!(Money::parse("").is_err());
    /// assert!(Money::parse("12,30").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Money> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "expected a decimal amount like 12.34".to_string(),
        };

        let (negative, body) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (body, None),
        };

        if whole.is_empty() && frac.map_or(true, str::is_empty) {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut cents = major.checked_mul(100).ok_or_else(invalid)?;

        if let Some(frac) = frac {
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            // Half-up at the cent: look at tenths of a cent.
            let mut mills = 0i64;
            for digit in frac.chars().take(3) {
                mills = mills * 10 + (digit as u8 - b'0') as i64;
            }
            for _ in frac.len()..3 {
                mills *= 10;
            }
            let minor = mills / 10 + if mills % 10 >= 5 { 1 } else { 0 };
            cents = cents.checked_add(minor).ok_or_else(invalid)?;
        }

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Parses an optional amount, treating absent or blank input as zero.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    ///
    /// assert_eq!(Money::parse_or_zero(None).unwrap(), Money::zero());
    /// assert_eq!(Money::parse_or_zero(Some("  ")).unwrap(), Money::zero());
    /// assert_eq!(Money::parse_or_zero(Some("5")).unwrap().cents(), 500);
    /// ```
    pub fn parse_or_zero(input: Option<&str>) -> ValidationResult<Money> {
        match input {
            Some(raw) if !raw.trim().is_empty() => Money::parse(raw),
            _ => Ok(Money::zero()),
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the smaller of two amounts.
    ///
    /// Used by the distribution loop: each installment receives
    /// `min(leftover, remaining)`.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// Clamps negative values to zero.
    ///
    /// Settlement arithmetic computes `remaining - (paid + discount)` and
    /// floors the result; an installment can never owe less than nothing.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    ///
    /// let short = Money::from_cents(500) - Money::from_cents(700);
    /// assert_eq!(short.clamp_non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Computes an acquirer fee at the given rate, half-up at the cent.
    ///
    /// ## Implementation
    /// Integer math: `(cents * bps + 5000) / 10000`. The +5000 term rounds
    /// the half cent up. i128 intermediate prevents overflow.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    /// use vero_core::types::FeeRate;
    ///
    /// let gross = Money::from_cents(10000);       // 100.00
    /// let fee = gross.fee(FeeRate::from_percent(3)); // 3%
    /// assert_eq!(fee.cents(), 300);               // 3.00
    /// ```
    pub fn fee(&self, rate: FeeRate) -> Money {
        let fee_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(fee_cents as i64)
    }

    /// Returns this amount less the fee at the given rate.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::money::Money;
    /// use vero_core::types::FeeRate;
    ///
    /// let gross = Money::from_cents(10000);
    /// let net = gross.less_fee(FeeRate::from_percent(5));
    /// assert_eq!(net.cents(), 9500); // 95.00
    /// ```
    pub fn less_fee(&self, rate: FeeRate) -> Money {
        *self - self.fee(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable decimal rendering, e.g. `12.34` / `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_parse_plain_and_decimal() {
        assert_eq!(Money::parse("30").unwrap().cents(), 3000);
        assert_eq!(Money::parse("70").unwrap().cents(), 7000);
        assert_eq!(Money::parse("12.3").unwrap().cents(), 1230);
        assert_eq!(Money::parse("12.34").unwrap().cents(), 1234);
        assert_eq!(Money::parse(".50").unwrap().cents(), 50);
        assert_eq!(Money::parse(" 5 ").unwrap().cents(), 500);
        assert_eq!(Money::parse("-2.50").unwrap().cents(), -250);
    }

    #[test]
    fn test_parse_rounds_half_up_at_two_places() {
        assert_eq!(Money::parse("12.345").unwrap().cents(), 1235);
        assert_eq!(Money::parse("12.344").unwrap().cents(), 1234);
        assert_eq!(Money::parse("0.005").unwrap().cents(), 1);
        assert_eq!(Money::parse("0.0049").unwrap().cents(), 0);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("   ").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("-").is_err());
        assert!(Money::parse("12.").is_err());
        assert!(Money::parse("12,30").is_err());
        assert!(Money::parse("1e3").is_err());
        assert!(Money::parse("12.3.4").is_err());
    }

    #[test]
    fn test_parse_or_zero_treats_absent_as_zero() {
        assert_eq!(Money::parse_or_zero(None).unwrap(), Money::zero());
        assert_eq!(Money::parse_or_zero(Some("")).unwrap(), Money::zero());
        assert_eq!(Money::parse_or_zero(Some("1.25")).unwrap().cents(), 125);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let sum: Money = [a, b, b].into_iter().sum();
        assert_eq!(sum.cents(), 2000);
    }

    #[test]
    fn test_clamp_non_negative() {
        let short = Money::from_cents(500) - Money::from_cents(700);
        assert_eq!(short.clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(42).clamp_non_negative().cents(), 42);
    }

    #[test]
    fn test_min() {
        let a = Money::from_cents(6000);
        let b = Money::from_cents(5000);
        assert_eq!(a.min(b).cents(), 5000);
        assert_eq!(b.min(a).cents(), 5000);
    }

    /// Acquirer arithmetic: 100.00 at 3% fee and 5% anticipation.
    #[test]
    fn test_fee_vectors() {
        let gross = Money::from_cents(10000);

        let fee = gross.fee(FeeRate::from_percent(3));
        assert_eq!(fee.cents(), 300);
        assert_eq!(gross.less_fee(FeeRate::from_percent(3)).cents(), 9700);
        assert_eq!(gross.less_fee(FeeRate::from_percent(5)).cents(), 9500);
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 0.25 at 3% = 0.0075 -> 0.01
        assert_eq!(Money::from_cents(25).fee(FeeRate::from_percent(3)).cents(), 1);
        // 0.10 at 3% = 0.003 -> 0.00
        assert_eq!(Money::from_cents(10).fee(FeeRate::from_percent(3)).cents(), 0);
        // fractional rate: 2.5% of 10.00 = 0.25 exactly
        assert_eq!(Money::from_cents(1000).fee(FeeRate::from_bps(250)).cents(), 25);
    }
}
