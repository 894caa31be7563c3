//! Cross-account administration. The admin role is checked by the service
//! on every call, so these handlers only translate HTTP.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    routing::{delete, get, put},
    Json, Router,
};

use dailyspend_auth::Session;
use dailyspend_core::AccountId;
use dailyspend_infra::LedgerService;

use crate::app::dto::{AccountsResponse, PasswordRequest, RenameRequest, SuccessResponse};
use crate::app::errors::ApiError;
use crate::app::routes::parse_path_id;

pub fn router() -> Router {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/:id", delete(delete_account))
        .route("/accounts/:id/username", put(rename_account))
        .route("/accounts/:id/password", put(reset_password))
}

pub async fn list_accounts(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let listing = service.list_accounts(&session).await?;
    Ok(Json(listing.into()))
}

pub async fn rename_account(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id: AccountId = parse_path_id(&id)?;
    let Json(body) = payload?;
    service.rename_account(&session, id, &body.username).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn reset_password(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id: AccountId = parse_path_id(&id)?;
    let Json(body) = payload?;
    service.reset_password(&session, id, &body.password).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn delete_account(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id: AccountId = parse_path_id(&id)?;
    service.delete_account(&session, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
