//! Whole-unit price representation.
//!
//! The backend prices everything in whole currency units (`"cost": 100`), and
//! wallet balances use the same unit. Arithmetic saturates instead of wrapping
//! so a pathological cart can never display a small total.

use core::fmt;
use core::iter::Sum;

use serde::{Deserialize, Serialize};

/// An amount of money in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the amount in whole units.
    #[must_use]
    pub const fn amount(self) -> u64 {
        self.0
    }

    /// Price of `qty` units at this unit price.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(qty)))
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract, returning `None` if `other` is larger.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(amount) => Some(Self(amount)),
            None => None,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<u64> for Price {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Price::new(260).to_string(), "$260");
        assert_eq!(Price::ZERO.to_string(), "$0");
    }

    #[test]
    fn test_times_saturates() {
        assert_eq!(Price::new(100).times(3), Price::new(300));
        assert_eq!(Price::new(u64::MAX).times(2), Price::new(u64::MAX));
    }

    #[test]
    fn test_sum_saturates() {
        let total: Price = [Price::new(u64::MAX), Price::new(1)].into_iter().sum();
        assert_eq!(total, Price::new(u64::MAX));
    }

    #[test]
    fn test_checked_sub() {
        assert_eq!(
            Price::new(5000).checked_sub(Price::new(260)),
            Some(Price::new(4740))
        );
        assert_eq!(Price::new(10).checked_sub(Price::new(11)), None);
    }
}
