//! Monetary amounts in integer minor units.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Amount of money in minor units (cents).
///
/// On the wire this is a plain JSON number in major units (`12.5` is 1250
/// cents). Arithmetic stays in integers so summaries never drift.
///
/// A `Money` may be zero or negative (e.g. remaining budget after
/// overspending); use [`Money::positive`] at entry points where only
/// positive amounts are acceptable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount a single budget or expense entry may carry
    /// (one billion in major units).
    pub const MAX_ENTRY: Money = Money(100_000_000_000);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Convert a major-unit float, rounding half away from zero to cents.
    pub fn from_major(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_amount("amount must be a finite number"));
        }
        let cents = (value * 100.0).round();
        if cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return Err(DomainError::invalid_amount("amount is out of range"));
        }
        Ok(Self(cents as i64))
    }

    /// Parse an entry amount: must be finite, strictly positive after
    /// rounding to cents, and no larger than [`Money::MAX_ENTRY`].
    pub fn positive(value: f64) -> DomainResult<Self> {
        let money = Self::from_major(value)?;
        if money.0 <= 0 {
            return Err(DomainError::invalid_amount("amount must be greater than zero"));
        }
        if money > Self::MAX_ENTRY {
            return Err(DomainError::invalid_amount(format!(
                "amount must be at most {}",
                Self::MAX_ENTRY
            )));
        }
        Ok(money)
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major(value).map_err(serde::de::Error::custom)
    }
}
