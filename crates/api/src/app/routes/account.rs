use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::Extension, Json};

use dailyspend_auth::Session;
use dailyspend_infra::LedgerService;

use crate::app::dto::{ChangePasswordRequest, PasswordRequest, ProfileResponse, SuccessResponse};
use crate::app::errors::ApiError;

pub async fn profile(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = service.profile(&session).await?;
    Ok(Json(profile.into()))
}

pub async fn change_password(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(body) = payload?;
    service
        .change_password(&session, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn delete_account(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(body) = payload?;
    service.delete_own_account(&session, &body.password).await?;
    Ok(Json(SuccessResponse::ok()))
}
