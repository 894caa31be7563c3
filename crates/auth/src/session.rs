use chrono::{DateTime, Utc};
use serde::Serialize;

use dailyspend_core::AccountId;

use crate::{JwtClaims, Role};

/// The authenticated identity of one request.
///
/// Built from a validated token and handed explicitly to every operation
/// that needs to know who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    account_id: AccountId,
    username: String,
    role: Role,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(account_id: AccountId, username: impl Into<String>, role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            username: username.into(),
            role,
            expires_at,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl From<JwtClaims> for Session {
    fn from(claims: JwtClaims) -> Self {
        Self {
            account_id: claims.sub,
            username: claims.username,
            role: claims.role,
            expires_at: claims.exp,
        }
    }
}
