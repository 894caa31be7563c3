use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dailyspend_core::{DomainError, DomainResult, Entity, ExpenseId, Money};

/// A single dated spend. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Expense {
    /// Validate raw input and stamp a new expense.
    ///
    /// `date` defaults to the UTC date of `now`.
    pub fn record(
        description: &str,
        amount: f64,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let description = description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        let amount = Money::positive(amount)?;

        Ok(Self {
            id: ExpenseId::new(),
            description: description.to_string(),
            amount,
            date: date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        })
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_iso_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}
