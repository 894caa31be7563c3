use chrono::{DateTime, Utc};
use serde::Serialize;

use dailyspend_auth::{PasswordHash, Role};
use dailyspend_core::{AccountId, DomainError, DomainResult, Entity};

/// Shortest password accepted by password change and admin reset.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Longest username accepted (in characters, after trimming).
pub const MAX_USERNAME_LEN: usize = 64;

/// A registered account. Budgets and expenses are held by the store,
/// keyed by `id`, so renaming never detaches owned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, password_hash: PasswordHash, role: Role, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            username,
            password_hash,
            role,
            created_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Trim and check a username. Comparison elsewhere stays case-sensitive.
pub fn validate_username(raw: &str) -> DomainResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(DomainError::validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username.to_string())
}

/// Registration and login only require a non-empty password.
pub fn validate_password(raw: &str) -> DomainResult<()> {
    if raw.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    Ok(())
}

/// Replacement passwords (self-service change, admin reset).
pub fn validate_new_password(raw: &str) -> DomainResult<()> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
