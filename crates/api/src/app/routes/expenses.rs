use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Extension, Path, Query},
    http::StatusCode,
    Json,
};

use dailyspend_auth::Session;
use dailyspend_core::ExpenseId;
use dailyspend_infra::LedgerService;
use dailyspend_ledger::Expense;

use crate::app::dto::{self, DateQuery, ExpenseRequest, ExpensesResponse, SuccessResponse};
use crate::app::errors::ApiError;
use crate::app::routes::parse_path_id;

pub async fn list_expenses(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ExpensesResponse>, ApiError> {
    let Query(query) = query?;
    let expenses = service.list_expenses(&session, query.parse()?).await?;
    Ok(Json(ExpensesResponse { expenses }))
}

pub async fn add_expense(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let Json(body) = payload?;
    let date = dto::parse_optional_date(body.date.as_deref())?;
    let expense = service
        .add_expense(&session, &body.description, body.amount, date)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn delete_expense(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id: ExpenseId = parse_path_id(&id)?;
    service.delete_expense(&session, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Removes every expense and every budget of the caller.
pub async fn clear_all(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SuccessResponse>, ApiError> {
    service.clear_all(&session).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn reset_today(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SuccessResponse>, ApiError> {
    service.reset_today(&session).await?;
    Ok(Json(SuccessResponse::ok()))
}
