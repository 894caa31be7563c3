//! `dailyspend-auth`: credentials, sessions and role checks.
//!
//! This crate is intentionally decoupled from HTTP and storage: it turns
//! passwords into verifiers, verifiers back into yes/no answers, and
//! accounts into signed bearer tokens (and back into sessions).

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod session;
pub mod token;

pub use authorize::{require_role, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use password::{PasswordError, PasswordHash, PasswordHasher};
pub use roles::Role;
pub use session::Session;
pub use token::{Hs256Tokens, IssuedToken, JwtValidator, TokenError, TokenIssuer};
