//! Read-side figures, recomputed from the ledger on every call.

use chrono::NaiveDate;
use serde::Serialize;

use dailyspend_auth::Role;
use dailyspend_core::{AccountId, Money};

use crate::account::Account;
use crate::budget::BudgetBook;
use crate::expense::Expense;

/// Spend vs. budget for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub budget: Money,
    pub spent: Money,
    pub remaining: Money,
}

impl DailySummary {
    pub fn compute(date: NaiveDate, budgets: &BudgetBook, expenses: &[Expense]) -> Self {
        let budget = budgets.get(date);
        let spent: Money = expenses
            .iter()
            .filter(|e| e.date == date)
            .map(|e| e.amount)
            .sum();

        Self {
            date,
            budget,
            spent,
            remaining: budget - spent,
        }
    }
}

/// One row of the admin account listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOverview {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    pub expense_count: usize,
    pub total_spent: Money,
    pub total_budget: Money,
    pub remaining: Money,
}

impl AccountOverview {
    pub fn compute(account: &Account, budgets: &BudgetBook, expenses: &[Expense]) -> Self {
        let total_spent: Money = expenses.iter().map(|e| e.amount).sum();
        let total_budget = budgets.total();

        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
            expense_count: expenses.len(),
            total_spent,
            total_budget,
            remaining: total_budget - total_spent,
        }
    }
}

/// Totals across every account in an admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminTotals {
    pub accounts: usize,
    pub expenses: usize,
    pub spent: Money,
}

impl AdminTotals {
    pub fn from_overviews(rows: &[AccountOverview]) -> Self {
        rows.iter().fold(Self::default(), |acc, row| Self {
            accounts: acc.accounts + 1,
            expenses: acc.expenses + row.expense_count,
            spent: acc.spent + row.total_spent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dailyspend_auth::PasswordHash;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn expense(amount: f64, date: NaiveDate) -> Expense {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 9, 0, 0).unwrap();
        Expense::record("item", amount, Some(date), now).unwrap()
    }

    #[test]
    fn summary_matches_worked_example() {
        let mut budgets = BudgetBook::new();
        budgets.add(day(1), Money::from_cents(30_000));
        let expenses = vec![expense(120.0, day(1)), expense(80.0, day(1)), expense(40.0, day(2))];

        let s = DailySummary::compute(day(1), &budgets, &expenses);
        assert_eq!(s.budget, Money::from_cents(30_000));
        assert_eq!(s.spent, Money::from_cents(20_000));
        assert_eq!(s.remaining, Money::from_cents(10_000));
    }

    #[test]
    fn summary_without_budget_goes_negative() {
        let s = DailySummary::compute(day(3), &BudgetBook::new(), &[expense(15.0, day(3))]);
        assert_eq!(s.budget, Money::ZERO);
        assert!(s.remaining.is_negative());
        assert_eq!(s.remaining, Money::from_cents(-1500));
    }

    #[test]
    fn overview_and_totals() {
        let account = Account::new(
            "carol".into(),
            PasswordHash::from_stored("sha256$1$00$00"),
            Role::User,
            Utc::now(),
        );
        let mut budgets = BudgetBook::new();
        budgets.add(day(1), Money::from_cents(1000));
        budgets.add(day(2), Money::from_cents(500));
        let expenses = vec![expense(2.0, day(1)), expense(3.0, day(2))];

        let row = AccountOverview::compute(&account, &budgets, &expenses);
        assert_eq!(row.expense_count, 2);
        assert_eq!(row.total_spent, Money::from_cents(500));
        assert_eq!(row.total_budget, Money::from_cents(1500));
        assert_eq!(row.remaining, Money::from_cents(1000));

        let empty = AccountOverview::compute(&account, &BudgetBook::new(), &[]);
        let totals = AdminTotals::from_overviews(&[row, empty]);
        assert_eq!(totals.accounts, 2);
        assert_eq!(totals.expenses, 2);
        assert_eq!(totals.spent, Money::from_cents(500));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn remaining_is_budget_minus_spent_on_that_date(
            budget in 0i64..10_000_000,
            rows in proptest::collection::vec((1i64..100_000, 1u32..4), 0..30),
        ) {
            let mut budgets = BudgetBook::new();
            if budget > 0 {
                budgets.add(day(1), Money::from_cents(budget));
            }
            let expenses: Vec<Expense> = rows
                .iter()
                .map(|(cents, d)| expense(*cents as f64 / 100.0, day(*d)))
                .collect();

            let s = DailySummary::compute(day(1), &budgets, &expenses);
            let spent: i64 = rows.iter().filter(|(_, d)| *d == 1).map(|(c, _)| *c).sum();

            prop_assert_eq!(s.spent, Money::from_cents(spent));
            prop_assert_eq!(s.remaining, Money::from_cents(budget - spent));
        }
    }
}
