//! Ledger module (accounts, per-day budgets, expenses, summaries).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod budget;
pub mod expense;
pub mod summary;

pub use account::{validate_new_password, validate_password, validate_username, Account};
pub use budget::BudgetBook;
pub use expense::{parse_iso_date, Expense};
pub use summary::{AccountOverview, AdminTotals, DailySummary};
