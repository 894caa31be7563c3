//! Role checks on an authenticated session.
//!
//! - No IO
//! - No panics

use thiserror::Error;

use crate::{Role, Session};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{required}' required")]
    Forbidden { required: Role },
}

/// Require the session to carry `required`.
///
/// Admin sessions satisfy every role requirement.
pub fn require_role(session: &Session, required: Role) -> Result<(), AuthzError> {
    if session.role() == required || session.role().is_admin() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { required })
    }
}
