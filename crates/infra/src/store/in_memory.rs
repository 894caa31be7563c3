use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use dailyspend_auth::{PasswordHash, Role};
use dailyspend_core::{AccountId, ExpenseId, Money};
use dailyspend_ledger::{Account, BudgetBook, Expense};

use super::{AccountStore, LedgerStore, StoreError};

#[derive(Debug)]
struct AccountRecord {
    account: Account,
    budgets: BudgetBook,
    /// Oldest first; listings reverse it.
    expenses: Vec<Expense>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, AccountRecord>,
    usernames: HashMap<String, AccountId>,
}

impl State {
    fn record(&self, id: AccountId) -> Result<&AccountRecord, StoreError> {
        self.accounts.get(&id).ok_or(StoreError::NotFound)
    }

    fn record_mut(&mut self, id: AccountId) -> Result<&mut AccountRecord, StoreError> {
        self.accounts.get_mut(&id).ok_or(StoreError::NotFound)
    }
}

/// In-memory store for tests/dev. Each operation runs under a single lock
/// acquisition, so it is atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.usernames.contains_key(&account.username) {
            return Err(StoreError::DuplicateUsername(account.username.clone()));
        }
        state.usernames.insert(account.username.clone(), account.id);
        state.accounts.insert(
            account.id,
            AccountRecord {
                account: account.clone(),
                budgets: BudgetBook::new(),
                expenses: Vec::new(),
            },
        );
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let state = self.read()?;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.accounts.get(id))
            .map(|r| r.account.clone()))
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let state = self.read()?;
        Ok(state.accounts.get(&id).map(|r| r.account.clone()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let state = self.read()?;
        let mut accounts: Vec<Account> = state.accounts.values().map(|r| r.account.clone()).collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn rename_account(&self, id: AccountId, username: &str) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let current = state.record(id)?.account.username.clone();
        if current == username {
            return Ok(());
        }
        if state.usernames.contains_key(username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        state.usernames.remove(&current);
        state.usernames.insert(username.to_string(), id);
        state.record_mut(id)?.account.username = username.to_string();
        Ok(())
    }

    async fn set_password_hash(&self, id: AccountId, hash: &PasswordHash) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.record_mut(id)?.account.password_hash = hash.clone();
        Ok(())
    }

    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.record_mut(id)?.account.role = role;
        Ok(())
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state.accounts.remove(&id).ok_or(StoreError::NotFound)?;
        state.usernames.remove(&record.account.username);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn budgets(&self, account: AccountId) -> Result<BudgetBook, StoreError> {
        let state = self.read()?;
        Ok(state.record(account)?.budgets.clone())
    }

    async fn add_budget(&self, account: AccountId, date: NaiveDate, amount: Money) -> Result<Money, StoreError> {
        let mut state = self.write()?;
        Ok(state.record_mut(account)?.budgets.add(date, amount))
    }

    async fn clear_budget(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.record_mut(account)?.budgets.clear(date);
        Ok(())
    }

    async fn insert_expense(&self, account: AccountId, expense: &Expense) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.record_mut(account)?.expenses.push(expense.clone());
        Ok(())
    }

    async fn delete_expense(&self, account: AccountId, expense: ExpenseId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state.record_mut(account)?;
        let before = record.expenses.len();
        record.expenses.retain(|e| e.id != expense);
        if record.expenses.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_expenses(&self, account: AccountId, date: Option<NaiveDate>) -> Result<Vec<Expense>, StoreError> {
        let state = self.read()?;
        Ok(state
            .record(account)?
            .expenses
            .iter()
            .rev()
            .filter(|e| date.is_none_or(|d| e.date == d))
            .cloned()
            .collect())
    }

    async fn clear_ledger(&self, account: AccountId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state.record_mut(account)?;
        record.expenses.clear();
        record.budgets.clear_all();
        Ok(())
    }

    async fn clear_day(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let record = state.record_mut(account)?;
        record.expenses.retain(|e| e.date != date);
        record.budgets.clear(date);
        Ok(())
    }
}
