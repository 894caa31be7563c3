use thiserror::Error;

use dailyspend_auth::{AuthzError, PasswordError, TokenError};
use dailyspend_core::DomainError;

use crate::store::StoreError;

/// Failures surfaced by `LedgerService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(StoreError),

    /// Signing or verifier failures; never caused by user input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => Self::DuplicateUsername,
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidAmount(msg) | DomainError::InvalidId(msg) => {
                Self::InvalidInput(msg)
            }
            DomainError::NotFound => Self::NotFound,
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(_: AuthzError) -> Self {
        Self::Forbidden
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => Self::Internal(msg),
            TokenError::Decode(_) | TokenError::Claims(_) => Self::Unauthorized,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}
