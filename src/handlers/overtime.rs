use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::database::models::{LogOvertimeInput, OvertimeLogUpdate};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{Actor, OvertimeService};

pub async fn log_overtime(
    actor: Actor,
    service: web::Data<OvertimeService>,
    input: web::Json<LogOvertimeInput>,
) -> Result<HttpResponse, AppError> {
    let result = service
        .log_batch(input.into_inner(), actor.id(), Utc::now())
        .await?;
    let message = if result.skipped_duplicates.is_empty() {
        format!("{} entries logged", result.entries_logged)
    } else {
        format!(
            "{} entries logged, {} duplicate dates skipped",
            result.entries_logged,
            result.skipped_duplicates.len()
        )
    };
    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(Some(result), &message)))
}

pub async fn get_log(
    service: web::Data<OvertimeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let log = service.get_log(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(log)))
}

pub async fn update_log(
    service: web::Data<OvertimeService>,
    path: web::Path<String>,
    update: web::Json<OvertimeLogUpdate>,
) -> Result<HttpResponse, AppError> {
    let log = service
        .update_log(&path.into_inner(), update.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(log)))
}

pub async fn delete_log(
    service: web::Data<OvertimeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let log = service.delete_log(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(log)))
}

pub async fn logs_for_employee(
    service: web::Data<OvertimeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let logs = service.logs_for_employee(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(logs)))
}
