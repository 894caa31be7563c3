use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod account;
pub mod admin;
pub mod auth;
pub mod budget;
pub mod expenses;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Router for all authenticated (session-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/profile", get(account::profile))
        .route("/password", post(account::change_password))
        .route("/account", delete(account::delete_account))
        .route("/budget", post(budget::add_budget).delete(budget::clear_budget))
        .route("/summary", get(budget::summary))
        .route(
            "/expenses",
            get(expenses::list_expenses)
                .post(expenses::add_expense)
                .delete(expenses::clear_all),
        )
        .route("/expenses/:id", delete(expenses::delete_expense))
        .route("/reset-today", post(expenses::reset_today))
        .nest("/admin", admin::router())
}

/// Parse an id from a path segment. Malformed ids cannot name anything, so
/// they are reported as missing.
pub(crate) fn parse_path_id<T: core::str::FromStr>(raw: &str) -> Result<T, crate::app::errors::ApiError> {
    raw.parse()
        .map_err(|_| crate::app::errors::ApiError::not_found("not found"))
}
