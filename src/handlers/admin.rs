use actix_web::{web, HttpResponse};

use crate::database::models::{ConfigUpdateInput, LibraryUpdateInput};
use crate::database::repositories::{ConfigurationRepository, LibraryRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn get_configuration(
    repo: web::Data<ConfigurationRepository>,
) -> Result<HttpResponse, AppError> {
    let entries = repo.all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entries)))
}

/// Upserts one configuration key. Unrecognized keys are stored but ignored
/// by the engine.
pub async fn set_configuration(
    repo: web::Data<ConfigurationRepository>,
    path: web::Path<String>,
    input: web::Json<ConfigUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    let input = input.into_inner();
    if input.value.trim().is_empty() {
        return Err(AppError::MissingField("value".into()));
    }
    let hint = input.hint.unwrap_or_else(|| "string".to_string());
    let entry = repo.set(&key, &input.value, &hint).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

pub async fn get_library(
    repo: web::Data<LibraryRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let list = repo.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

pub async fn put_library(
    repo: web::Data<LibraryRepository>,
    path: web::Path<String>,
    input: web::Json<LibraryUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let list = repo.put(&path.into_inner(), input.into_inner().entries).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}
