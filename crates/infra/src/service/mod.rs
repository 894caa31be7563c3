//! `LedgerService`: the operations exposed over HTTP, expressed over a
//! `Store`, a password hasher, a token issuer and a clock.
//!
//! Every session-scoped operation resolves the caller's account first, so a
//! token that outlives its account gets `NotFound` rather than touching
//! orphaned rows. Admin operations additionally require the stored account,
//! not just the token, to carry the admin role.
//!
//! Password hashing and verification run on the blocking pool.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use dailyspend_auth::{require_role, IssuedToken, PasswordHash, PasswordHasher, Role, Session, TokenIssuer};
use dailyspend_core::{AccountId, Clock, ExpenseId, Money};
use dailyspend_ledger::{
    validate_new_password, validate_password, validate_username, Account, AccountOverview, AdminTotals,
    BudgetBook, DailySummary, Expense,
};

use crate::store::Store;

mod error;

pub use error::ServiceError;

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub account: Account,
    pub token: IssuedToken,
    /// Budget for today at the time of login.
    pub budget_today: Money,
}

/// Everything the client needs to render its home screen.
#[derive(Debug, Clone)]
pub struct Profile {
    pub account: Account,
    pub today: NaiveDate,
    pub budget_today: Money,
    pub budgets: BudgetBook,
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone)]
pub struct AccountsListing {
    pub accounts: Vec<AccountOverview>,
    pub totals: AdminTotals,
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerService").field("hasher", &self.hasher).finish_non_exhaustive()
    }
}

impl LedgerService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ---- credentials -------------------------------------------------

    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Authenticated, ServiceError> {
        let username = validate_username(username)?;
        validate_password(password)?;

        let hash = self.hash_password(password).await?;
        let account = Account::new(username, hash, Role::User, self.clock.now());
        self.store.insert_account(&account).await?;
        info!(account_id = %account.id, "account registered");

        let token = self.issue(&account)?;
        Ok(Authenticated {
            account,
            token,
            budget_today: Money::ZERO,
        })
    }

    /// `NotFound` for an unknown username, `InvalidCredential` for a wrong
    /// password. Callers facing the network should not tell them apart.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Authenticated, ServiceError> {
        let username = validate_username(username)?;
        validate_password(password)?;

        let account = self
            .store
            .find_by_username(&username)
            .await?
            .ok_or(ServiceError::NotFound)?;
        self.verify(&account, password).await?;

        let token = self.issue(&account)?;
        let budget_today = self.store.budgets(account.id).await?.get(self.clock.today());
        info!(account_id = %account.id, "login succeeded");

        Ok(Authenticated {
            account,
            token,
            budget_today,
        })
    }

    /// Make the configured username and password the admin credential.
    ///
    /// A missing account is created. An existing one is promoted, and its
    /// verifier is replaced unless it already matches `password`, so only
    /// the configured password can sign in as admin.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<Account, ServiceError> {
        let username = validate_username(username)?;
        validate_password(password)?;

        match self.store.find_by_username(&username).await? {
            Some(mut account) => {
                if !self.password_matches(&account, password).await? {
                    let hash = self.hash_password(password).await?;
                    self.store.set_password_hash(account.id, &hash).await?;
                    account.password_hash = hash;
                    warn!(account_id = %account.id, "admin password reset to the configured value");
                }
                if !account.is_admin() {
                    self.store.set_role(account.id, Role::Admin).await?;
                    account.role = Role::Admin;
                    info!(account_id = %account.id, "existing account promoted to admin");
                }
                Ok(account)
            }
            None => {
                let hash = self.hash_password(password).await?;
                let account = Account::new(username, hash, Role::Admin, self.clock.now());
                self.store.insert_account(&account).await?;
                info!(account_id = %account.id, "admin account created");
                Ok(account)
            }
        }
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn change_password(
        &self,
        session: &Session,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let account = self.account_for(session).await?;
        self.verify(&account, current_password).await?;
        validate_new_password(new_password)?;

        let hash = self.hash_password(new_password).await?;
        self.store.set_password_hash(account.id, &hash).await?;
        info!("password changed");
        Ok(())
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn delete_own_account(&self, session: &Session, password: &str) -> Result<(), ServiceError> {
        let account = self.account_for(session).await?;
        self.verify(&account, password).await?;

        self.store.delete_account(account.id).await?;
        info!("account deleted by owner");
        Ok(())
    }

    // ---- ledger ------------------------------------------------------

    /// Add to the budget for `date` (default today). Returns the date and
    /// its new total.
    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn add_budget(
        &self,
        session: &Session,
        amount: f64,
        date: Option<NaiveDate>,
    ) -> Result<(NaiveDate, Money), ServiceError> {
        let amount = Money::positive(amount).map_err(|err| {
            if amount.is_finite() && amount > Money::MAX_ENTRY.as_major() {
                ServiceError::from(err)
            } else {
                ServiceError::InvalidInput("budget must be greater than zero".into())
            }
        })?;
        let account = self.account_for(session).await?;
        let date = date.unwrap_or_else(|| self.clock.today());

        let total = self.store.add_budget(account.id, date, amount).await?;
        debug!(%date, total = %total, "budget added");
        Ok((date, total))
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn clear_budget(&self, session: &Session, date: Option<NaiveDate>) -> Result<NaiveDate, ServiceError> {
        let account = self.account_for(session).await?;
        let date = date.unwrap_or_else(|| self.clock.today());

        self.store.clear_budget(account.id, date).await?;
        debug!(%date, "budget cleared");
        Ok(date)
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn add_expense(
        &self,
        session: &Session,
        description: &str,
        amount: f64,
        date: Option<NaiveDate>,
    ) -> Result<Expense, ServiceError> {
        let expense = Expense::record(description, amount, date, self.clock.now())?;
        let account = self.account_for(session).await?;

        self.store.insert_expense(account.id, &expense).await?;
        debug!(expense_id = %expense.id, "expense added");
        Ok(expense)
    }

    #[instrument(skip_all, fields(account_id = %session.account_id(), expense_id = %expense_id))]
    pub async fn delete_expense(&self, session: &Session, expense_id: ExpenseId) -> Result<(), ServiceError> {
        let account = self.account_for(session).await?;
        self.store.delete_expense(account.id, expense_id).await?;
        debug!("expense deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn list_expenses(
        &self,
        session: &Session,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, ServiceError> {
        let account = self.account_for(session).await?;
        Ok(self.store.list_expenses(account.id, date).await?)
    }

    /// Remove every expense and every budget.
    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn clear_all(&self, session: &Session) -> Result<(), ServiceError> {
        let account = self.account_for(session).await?;
        self.store.clear_ledger(account.id).await?;
        info!("ledger cleared");
        Ok(())
    }

    /// Remove today's expenses and today's budget.
    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn reset_today(&self, session: &Session) -> Result<NaiveDate, ServiceError> {
        let account = self.account_for(session).await?;
        let today = self.clock.today();
        self.store.clear_day(account.id, today).await?;
        debug!(%today, "day reset");
        Ok(today)
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn summarize(&self, session: &Session, date: Option<NaiveDate>) -> Result<DailySummary, ServiceError> {
        let account = self.account_for(session).await?;
        let date = date.unwrap_or_else(|| self.clock.today());

        let budgets = self.store.budgets(account.id).await?;
        let expenses = self.store.list_expenses(account.id, Some(date)).await?;
        Ok(DailySummary::compute(date, &budgets, &expenses))
    }

    #[instrument(skip_all, fields(account_id = %session.account_id()))]
    pub async fn profile(&self, session: &Session) -> Result<Profile, ServiceError> {
        let account = self.account_for(session).await?;
        let today = self.clock.today();
        let budgets = self.store.budgets(account.id).await?;
        let expenses = self.store.list_expenses(account.id, None).await?;

        Ok(Profile {
            account,
            today,
            budget_today: budgets.get(today),
            budgets,
            expenses,
        })
    }

    // ---- admin -------------------------------------------------------

    #[instrument(skip_all, fields(admin_id = %session.account_id()))]
    pub async fn list_accounts(&self, session: &Session) -> Result<AccountsListing, ServiceError> {
        self.admin_for(session).await?;

        let mut accounts = Vec::new();
        for account in self.store.list_accounts().await? {
            let budgets = self.store.budgets(account.id).await?;
            let expenses = self.store.list_expenses(account.id, None).await?;
            accounts.push(AccountOverview::compute(&account, &budgets, &expenses));
        }
        let totals = AdminTotals::from_overviews(&accounts);
        Ok(AccountsListing { accounts, totals })
    }

    #[instrument(skip_all, fields(admin_id = %session.account_id(), account_id = %id))]
    pub async fn rename_account(&self, session: &Session, id: AccountId, new_username: &str) -> Result<(), ServiceError> {
        self.admin_for(session).await?;
        let new_username = validate_username(new_username)?;

        let account = self.store.get_account(id).await?.ok_or(ServiceError::NotFound)?;
        if account.username == new_username {
            return Err(ServiceError::InvalidInput("new username is the same as the current one".into()));
        }

        self.store.rename_account(id, &new_username).await?;
        info!("account renamed by admin");
        Ok(())
    }

    #[instrument(skip_all, fields(admin_id = %session.account_id(), account_id = %id))]
    pub async fn reset_password(&self, session: &Session, id: AccountId, new_password: &str) -> Result<(), ServiceError> {
        self.admin_for(session).await?;
        validate_new_password(new_password)?;

        let hash = self.hash_password(new_password).await?;
        self.store.set_password_hash(id, &hash).await?;
        info!("password reset by admin");
        Ok(())
    }

    #[instrument(skip_all, fields(admin_id = %session.account_id(), account_id = %id))]
    pub async fn delete_account(&self, session: &Session, id: AccountId) -> Result<(), ServiceError> {
        self.admin_for(session).await?;

        self.store.delete_account(id).await?;
        info!("account deleted by admin");
        Ok(())
    }

    // ---- helpers -----------------------------------------------------

    async fn account_for(&self, session: &Session) -> Result<Account, ServiceError> {
        self.store
            .get_account(session.account_id())
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Both the token and the stored account must carry the admin role: a
    /// deleted admin gets `NotFound`, and a promoted account must sign in
    /// again before its old user token counts.
    async fn admin_for(&self, session: &Session) -> Result<Account, ServiceError> {
        require_role(session, Role::Admin)?;
        let account = self.account_for(session).await?;
        if !account.is_admin() {
            warn!(account_id = %account.id, "token role no longer matches stored role");
            return Err(ServiceError::Forbidden);
        }
        Ok(account)
    }

    async fn verify(&self, account: &Account, password: &str) -> Result<(), ServiceError> {
        if self.password_matches(account, password).await? {
            Ok(())
        } else {
            warn!(account_id = %account.id, "password mismatch");
            Err(ServiceError::InvalidCredential)
        }
    }

    async fn password_matches(&self, account: &Account, password: &str) -> Result<bool, ServiceError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let stored = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(format!("password verification task failed: {e}")))??;
        Ok(matches)
    }

    async fn hash_password(&self, password: &str) -> Result<PasswordHash, ServiceError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {e}")))
    }

    fn issue(&self, account: &Account) -> Result<IssuedToken, ServiceError> {
        Ok(self
            .tokens
            .issue(account.id, &account.username, account.role, self.clock.now())?)
    }
}

#[cfg(test)]
mod tests;
