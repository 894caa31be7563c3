//! Request/response DTOs and JSON mapping helpers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dailyspend_auth::Role;
use dailyspend_core::{AccountId, Money};
use dailyspend_infra::{AccountsListing, Authenticated, Profile, ServiceError};
use dailyspend_ledger::{parse_iso_date, Account, AccountOverview, AdminTotals, BudgetBook, Expense};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub budget: f64,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub username: String,
}

/// `?date=YYYY-MM-DD`; an empty value means "no date".
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    pub fn parse(&self) -> Result<Option<NaiveDate>, ApiError> {
        parse_optional_date(self.date.as_deref())
    }
}

pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_iso_date(s)
            .map(Some)
            .map_err(|e| ApiError::from(ServiceError::from(e))),
        None => Ok(None),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for UserDto {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Today's budget.
    pub budget: Money,
}

impl From<Authenticated> for AuthResponse {
    fn from(auth: Authenticated) -> Self {
        Self {
            user: UserDto::from(&auth.account),
            token: auth.token.token,
            expires_at: auth.token.expires_at,
            budget: auth.budget_today,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserDto,
    pub today: NaiveDate,
    pub budget: Money,
    pub budgets: BudgetBook,
    pub expenses: Vec<Expense>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user: UserDto::from(&profile.account),
            today: profile.today,
            budget: profile.budget_today,
            budgets: profile.budgets,
            expenses: profile.expenses,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub success: bool,
    pub date: NaiveDate,
    pub budget: Money,
}

#[derive(Debug, Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountOverview>,
    pub totals: AdminTotals,
}

impl From<AccountsListing> for AccountsResponse {
    fn from(listing: AccountsListing) -> Self {
        Self {
            accounts: listing.accounts,
            totals: listing.totals,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
