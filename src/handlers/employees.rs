use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::database::models::{EmployeeInput, EmployeeUpdate};
use crate::database::repositories::EmployeeRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn create_employee(
    repo: web::Data<EmployeeRepository>,
    input: web::Json<EmployeeInput>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    if input.employee_id.trim().is_empty() {
        return Err(AppError::MissingField("employeeId".into()));
    }
    if input.email.trim().is_empty() {
        return Err(AppError::MissingField("email".into()));
    }
    let employee = repo.create(input, Utc::now()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(employee)))
}

pub async fn get_employees(
    repo: web::Data<EmployeeRepository>,
) -> Result<HttpResponse, AppError> {
    let employees = repo.get_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(employees)))
}

pub async fn get_employee(
    repo: web::Data<EmployeeRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee = repo.require(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(employee)))
}

pub async fn update_employee(
    repo: web::Data<EmployeeRepository>,
    path: web::Path<String>,
    update: web::Json<EmployeeUpdate>,
) -> Result<HttpResponse, AppError> {
    let employee = repo
        .update(&path.into_inner(), update.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(employee)))
}

/// Soft delete; the employee stays referenceable from logs and batches.
pub async fn delete_employee(
    repo: web::Data<EmployeeRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee = repo.soft_delete(&path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(employee)))
}
