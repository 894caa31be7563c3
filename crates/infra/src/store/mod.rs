//! Storage abstractions for accounts and their ledgers.
//!
//! Every ledger call is scoped by the owning `AccountId`; there is no way to
//! reach another account's expenses through these traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use dailyspend_auth::{PasswordHash, Role};
use dailyspend_core::{AccountId, ExpenseId, Money};
use dailyspend_ledger::{Account, BudgetBook, Expense};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    #[error("record not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Database(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `DuplicateUsername` when the username is taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Exact, case-sensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// All accounts, oldest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn rename_account(&self, id: AccountId, username: &str) -> Result<(), StoreError>;

    async fn set_password_hash(&self, id: AccountId, hash: &PasswordHash) -> Result<(), StoreError>;

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError>;

    /// Removes the account together with its budgets and expenses.
    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn budgets(&self, account: AccountId) -> Result<BudgetBook, StoreError>;

    /// Accumulate into the bucket for `date`; returns the new bucket total.
    async fn add_budget(&self, account: AccountId, date: NaiveDate, amount: Money) -> Result<Money, StoreError>;

    async fn clear_budget(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError>;

    async fn insert_expense(&self, account: AccountId, expense: &Expense) -> Result<(), StoreError>;

    /// `NotFound` when no expense with this id belongs to `account`.
    async fn delete_expense(&self, account: AccountId, expense: ExpenseId) -> Result<(), StoreError>;

    /// Newest first. `date` filters by exact calendar date.
    async fn list_expenses(&self, account: AccountId, date: Option<NaiveDate>) -> Result<Vec<Expense>, StoreError>;

    /// Drop every expense and every budget of the account.
    async fn clear_ledger(&self, account: AccountId) -> Result<(), StoreError>;

    /// Drop the expenses dated `date` and the budget for `date`.
    async fn clear_day(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError>;
}

/// Everything the service needs from storage.
pub trait Store: AccountStore + LedgerStore {}

impl<T> Store for T where T: AccountStore + LedgerStore + ?Sized {}
