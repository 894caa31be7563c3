//! Per-date budget buckets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dailyspend_core::{Money, ValueObject};

/// Budget amounts keyed by calendar date. Adding to a date accumulates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetBook(BTreeMap<NaiveDate, Money>);

impl ValueObject for BudgetBook {}

impl BudgetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Migrate a single flat budget onto the per-date model, dated `on`.
    pub fn from_legacy_scalar(amount: Money, on: NaiveDate) -> Self {
        let mut book = Self::new();
        if amount.cents() > 0 {
            book.0.insert(on, amount);
        }
        book
    }

    /// Add `amount` to the bucket for `date`, returning the new bucket total.
    pub fn add(&mut self, date: NaiveDate, amount: Money) -> Money {
        let slot = self.0.entry(date).or_insert(Money::ZERO);
        *slot += amount;
        *slot
    }

    /// Overwrite a bucket (used when loading from storage).
    pub fn set(&mut self, date: NaiveDate, amount: Money) {
        self.0.insert(date, amount);
    }

    /// Budget for `date`, zero when none was set.
    pub fn get(&self, date: NaiveDate) -> Money {
        self.0.get(&date).copied().unwrap_or(Money::ZERO)
    }

    /// Drop the bucket for `date`. Returns whether one existed.
    pub fn clear(&mut self, date: NaiveDate) -> bool {
        self.0.remove(&date).is_some()
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    pub fn total(&self) -> Money {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Money)> + '_ {
        self.0.iter().map(|(d, m)| (*d, *m))
    }
}

impl FromIterator<(NaiveDate, Money)> for BudgetBook {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, Money)>>(iter: T) -> Self {
        let mut book = Self::new();
        for (date, amount) in iter {
            book.add(date, amount);
        }
        book
    }
}
