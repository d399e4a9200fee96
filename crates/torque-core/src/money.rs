//! # Money
//!
//! Amounts are whole cents in an `i64`; percentages are basis points
//! (`1000` = 10%). Nothing in the pricing path touches floating point, so the
//! checkout example below comes out exact:
//!
//! ```text
//! order total 8200¢, 10% off, 500¢ surcharge
//!   discount = (8200 × 1000 + 5000) / 10000 = 820¢
//!   final    = 8200 − 820 + 500            = 7880¢   ($78.80)
//! ```
//!
//! ```rust
//! use torque_core::money::Money;
//!
//! let wax = Money::from_cents(2000);
//! let promo = wax.apply_percentage_discount(2000);
//! assert_eq!(promo.cents(), 1600);
//! assert_eq!((promo * 2).to_string(), "$32.00");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 100% in basis points.
pub const FULL_PERCENT_BPS: u32 = 10_000;

/// Half of one basis-point denominator; added before dividing to round half up.
const HALF_UP: i128 = FULL_PERCENT_BPS as i128 / 2;

/// A signed amount in cents.
///
/// Line totals, service prices, order totals and payment records all carry
/// this type; the raw `*_cents: i64` fields on stored records convert through
/// [`Money::from_cents`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Price of `qty` units at this unit price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `bps` basis points of this amount, rounded half up.
    ///
    /// Computed in `i128`; out-of-range results saturate at the `i64` bounds
    /// rather than wrap.
    ///
    /// ```rust
    /// use torque_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(8200).percentage(1000).cents(), 820);
    /// assert_eq!(Money::from_cents(10).percentage(1500).cents(), 2); // 1.5¢
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let scaled = (self.0 as i128 * bps as i128 + HALF_UP) / FULL_PERCENT_BPS as i128;
        Money(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// This amount with `discount_bps` taken off.
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage(discount_bps)
    }

    /// `self + rhs`, pinned at the `i64` bounds.
    #[inline]
    pub const fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    /// `self - rhs`, pinned at the `i64` bounds.
    #[inline]
    pub const fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    /// Zero if negative, otherwise unchanged.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        Money(self.0.max(0))
    }
}

/// `$78.80`, `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

/// Unit price times quantity.
impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, qty: i64) -> Money {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(7880).to_string(), "$78.80");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let service = Money::from_cents(5000);
        let products = Money::from_cents(3200);

        assert_eq!(service + products, Money::from_cents(8200));
        assert_eq!(service - products, Money::from_cents(1800));
        assert_eq!(products * 3, Money::from_cents(9600));

        let mut running = Money::zero();
        running += service;
        running -= products;
        assert_eq!(running.cents(), 1800);

        let total: Money = [service, products].iter().sum();
        assert_eq!(total.cents(), 8200);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_cents(2000).percentage(2000).cents(), 400);
        assert_eq!(Money::from_cents(10).percentage(1500).cents(), 2);
        assert_eq!(Money::from_cents(10).percentage(1400).cents(), 1);
        assert_eq!(Money::from_cents(999).percentage(0).cents(), 0);
        assert_eq!(Money::from_cents(999).percentage(FULL_PERCENT_BPS).cents(), 999);
    }

    #[test]
    fn test_percentage_discount() {
        let wax = Money::from_cents(2000);
        assert_eq!(wax.apply_percentage_discount(2000).cents(), 1600);
        assert!(wax.apply_percentage_discount(FULL_PERCENT_BPS).is_zero());
    }

    #[test]
    fn test_saturating_ops_pin_at_bounds() {
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);

        assert_eq!(max.saturating_add(Money::from_cents(1)), max);
        assert_eq!(Money::from_cents(1).saturating_sub(min), max);
        assert_eq!(min.saturating_sub(Money::from_cents(1)), min);
        assert_eq!(max.percentage(u32::MAX), max);
        assert_eq!(min.percentage(u32::MAX), min);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(42).clamp_non_negative().cents(), 42);
    }
}
