use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Extension, Query},
    Json,
};

use dailyspend_auth::Session;
use dailyspend_infra::LedgerService;
use dailyspend_ledger::DailySummary;

use crate::app::dto::{self, BudgetRequest, BudgetResponse, DateQuery, SuccessResponse};
use crate::app::errors::ApiError;

/// Adds to the day's budget; repeated calls for one date accumulate.
pub async fn add_budget(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let Json(body) = payload?;
    let date = dto::parse_optional_date(body.date.as_deref())?;
    let (date, budget) = service.add_budget(&session, body.budget, date).await?;
    Ok(Json(BudgetResponse {
        success: true,
        date,
        budget,
    }))
}

pub async fn clear_budget(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Query(query) = query?;
    service.clear_budget(&session, query.parse()?).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn summary(
    Extension(service): Extension<Arc<LedgerService>>,
    Extension(session): Extension<Session>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<DailySummary>, ApiError> {
    let Query(query) = query?;
    let summary = service.summarize(&session, query.parse()?).await?;
    Ok(Json(summary))
}
