use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::database::models::{DebitInput, HistoricalImportInput};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{Actor, CreditService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOfQuery {
    pub as_of: Option<String>,
}

fn parse_as_of(raw: &Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match raw {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadDate(format!("{value} is not an ISO-8601 date"))),
        None => Ok(None),
    }
}

pub async fn debit(
    actor: Actor,
    service: web::Data<CreditService>,
    input: web::Json<DebitInput>,
) -> Result<HttpResponse, AppError> {
    let allocations = service
        .debit(input.into_inner(), actor.id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(allocations)))
}

pub async fn expire_sweep(
    service: web::Data<CreditService>,
    query: web::Query<AsOfQuery>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let as_of = match parse_as_of(&query.as_of)? {
        Some(date) => date,
        None => service.today(now).await?,
    };
    let result = service.expire_sweep(as_of, now).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

pub async fn balance(
    service: web::Data<CreditService>,
    path: web::Path<String>,
    query: web::Query<AsOfQuery>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let as_of = match parse_as_of(&query.as_of)? {
        Some(date) => date,
        None => service.today(now).await?,
    };
    let summary = service.balance(&path.into_inner(), as_of).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub async fn import_historical(
    actor: Actor,
    service: web::Data<CreditService>,
    input: web::Json<HistoricalImportInput>,
) -> Result<HttpResponse, AppError> {
    let batch = service
        .import_historical(input.into_inner(), actor.id(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(batch)))
}

/// Ledger-versus-batch reconciliation; a mismatch surfaces as Internal.
pub async fn verify_ledger(
    service: web::Data<CreditService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let reconciliation = service.verify_ledger(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reconciliation)))
}
