use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::ReportService;

pub async fn detailed_ledger(
    service: web::Data<ReportService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let as_of = service.today(now).await?;
    let ledger = service.detailed_ledger(&path.into_inner(), as_of).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(ledger)))
}

pub async fn uncertified_stats(
    service: web::Data<ReportService>,
) -> Result<HttpResponse, AppError> {
    let stats = service.uncertified_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

pub async fn uncertified_detailed(
    service: web::Data<ReportService>,
) -> Result<HttpResponse, AppError> {
    let rows = service.uncertified_detailed().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(rows)))
}

pub async fn certified_months(
    service: web::Data<ReportService>,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year) = path.into_inner();
    let months = service.certified_months(&employee_id, year).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(months)))
}

pub async fn progress(
    service: web::Data<ReportService>,
    path: web::Path<(String, i32, String)>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year, month) = path.into_inner();
    let now = Utc::now();
    let as_of = service.today(now).await?;
    let report = service.progress(&employee_id, &month, year, as_of).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

pub async fn ledger_entries(
    service: web::Data<ReportService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let entries = service.ledger_entries(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}
