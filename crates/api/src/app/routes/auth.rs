use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::Extension, http::StatusCode, Json};

use dailyspend_infra::{LedgerService, ServiceError};

use crate::app::dto::{AuthResponse, CredentialsRequest};
use crate::app::errors::ApiError;

pub async fn register(
    Extension(service): Extension<Arc<LedgerService>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(body) = payload?;
    let auth = service.register(&body.username, &body.password).await?;
    Ok((StatusCode::CREATED, Json(auth.into())))
}

pub async fn login(
    Extension(service): Extension<Arc<LedgerService>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = payload?;
    match service.login(&body.username, &body.password).await {
        Ok(auth) => Ok(Json(auth.into())),
        // Unknown user and wrong password must be indistinguishable.
        Err(ServiceError::NotFound | ServiceError::InvalidCredential) => Err(ApiError::invalid_credentials()),
        Err(e) => Err(e.into()),
    }
}
