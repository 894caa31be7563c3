//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) on `accounts.username` | `23505` | `DuplicateUsername` |
//! | Database (foreign key violation) | `23503` | `NotFound` (owning account is gone) |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / network / decode | N/A | `Database` |
//!
//! Cascading deletes are enforced by `ON DELETE CASCADE` foreign keys, so
//! removing an account is a single statement.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use dailyspend_auth::{PasswordHash, Role};
use dailyspend_core::{AccountId, ExpenseId, Money};
use dailyspend_ledger::{Account, BudgetBook, Expense};

use super::{AccountStore, LedgerStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS budgets (
        account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        budget_date DATE NOT NULL,
        amount_cents BIGINT NOT NULL,
        PRIMARY KEY (account_id, budget_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
        expense_date DATE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS expenses_account_date_idx ON expenses (account_id, expense_date)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(account.password_hash.as_str())
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| username_error("insert_account", &account.username, e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM accounts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM accounts ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;

        rows.iter().map(account_from_row).collect()
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn rename_account(&self, id: AccountId, username: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET username = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(username)
            .execute(&*self.pool)
            .await
            .map_err(|e| username_error("rename_account", username, e))?;
        expect_one_row(result.rows_affected())
    }

    #[instrument(skip(self, hash), fields(account_id = %id), err)]
    async fn set_password_hash(&self, id: AccountId, hash: &PasswordHash) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(hash.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_password_hash", e))?;
        expect_one_row(result.rows_affected())
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn set_role(&self, id: AccountId, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET role = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(role.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_role", e))?;
        expect_one_row(result.rows_affected())
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_account", e))?;
        expect_one_row(result.rows_affected())
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn budgets(&self, account: AccountId) -> Result<BudgetBook, StoreError> {
        let rows = sqlx::query("SELECT budget_date, amount_cents FROM budgets WHERE account_id = $1")
            .bind(account.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("budgets", e))?;

        let mut book = BudgetBook::new();
        for row in &rows {
            let date: NaiveDate = row.try_get("budget_date").map_err(|e| map_sqlx_error("budgets", e))?;
            let cents: i64 = row.try_get("amount_cents").map_err(|e| map_sqlx_error("budgets", e))?;
            book.set(date, Money::from_cents(cents));
        }
        Ok(book)
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn add_budget(&self, account: AccountId, date: NaiveDate, amount: Money) -> Result<Money, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO budgets (account_id, budget_date, amount_cents)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id, budget_date)
            DO UPDATE SET amount_cents =
                LEAST(budgets.amount_cents::numeric + EXCLUDED.amount_cents, 9223372036854775807)::bigint
            RETURNING amount_cents
            "#,
        )
        .bind(account.as_uuid())
        .bind(date)
        .bind(amount.cents())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_budget", e))?;

        let total: i64 = row.try_get("amount_cents").map_err(|e| map_sqlx_error("add_budget", e))?;
        Ok(Money::from_cents(total))
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn clear_budget(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM budgets WHERE account_id = $1 AND budget_date = $2")
            .bind(account.as_uuid())
            .bind(date)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_budget", e))?;
        Ok(())
    }

    #[instrument(skip(self, expense), fields(account_id = %account, expense_id = %expense.id), err)]
    async fn insert_expense(&self, account: AccountId, expense: &Expense) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, account_id, description, amount_cents, expense_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(expense.id.as_uuid())
        .bind(account.as_uuid())
        .bind(&expense.description)
        .bind(expense.amount.cents())
        .bind(expense.date)
        .bind(expense.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_expense", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %account, expense_id = %expense), err)]
    async fn delete_expense(&self, account: AccountId, expense: ExpenseId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND account_id = $2")
            .bind(expense.as_uuid())
            .bind(account.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_expense", e))?;
        expect_one_row(result.rows_affected())
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn list_expenses(&self, account: AccountId, date: Option<NaiveDate>) -> Result<Vec<Expense>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, amount_cents, expense_date, created_at
            FROM expenses
            WHERE account_id = $1
                AND ($2::date IS NULL OR expense_date = $2)
            ORDER BY seq DESC
            "#,
        )
        .bind(account.as_uuid())
        .bind(date)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_expenses", e))?;

        rows.iter().map(expense_from_row).collect()
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn clear_ledger(&self, account: AccountId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("clear_ledger", e))?;
        sqlx::query("DELETE FROM expenses WHERE account_id = $1")
            .bind(account.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_ledger", e))?;
        sqlx::query("DELETE FROM budgets WHERE account_id = $1")
            .bind(account.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_ledger", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("clear_ledger", e))
    }

    #[instrument(skip(self), fields(account_id = %account), err)]
    async fn clear_day(&self, account: AccountId, date: NaiveDate) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("clear_day", e))?;
        sqlx::query("DELETE FROM expenses WHERE account_id = $1 AND expense_date = $2")
            .bind(account.as_uuid())
            .bind(date)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_day", e))?;
        sqlx::query("DELETE FROM budgets WHERE account_id = $1 AND budget_date = $2")
            .bind(account.as_uuid())
            .bind(date)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_day", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("clear_day", e))
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let decode = |e| map_sqlx_error("decode_account", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let username: String = row.try_get("username").map_err(decode)?;
    let password_hash: String = row.try_get("password_hash").map_err(decode)?;
    let role: String = row.try_get("role").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    Ok(Account {
        id: AccountId::from_uuid(id),
        username,
        password_hash: PasswordHash::from_stored(password_hash),
        role: Role::from_str(&role).map_err(StoreError::Database)?,
        created_at,
    })
}

fn expense_from_row(row: &PgRow) -> Result<Expense, StoreError> {
    let decode = |e| map_sqlx_error("decode_expense", e);
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let amount_cents: i64 = row.try_get("amount_cents").map_err(decode)?;

    Ok(Expense {
        id: ExpenseId::from_uuid(id),
        description: row.try_get("description").map_err(decode)?,
        amount: Money::from_cents(amount_cents),
        date: row.try_get("expense_date").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn expect_one_row(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

/// Like `map_sqlx_error`, but a unique violation names the taken username.
fn username_error(operation: &str, username: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateUsername(username.to_string())
    } else {
        map_sqlx_error(operation, err)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Foreign key violation: the owning account no longer exists.
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Database(format!("connection pool closed in {}", operation)),
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
