use actix_web::{web, HttpResponse};

use crate::database::models::HolidayInput;
use crate::database::repositories::HolidayRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn create_holiday(
    repo: web::Data<HolidayRepository>,
    input: web::Json<HolidayInput>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    if input.name.trim().is_empty() {
        return Err(AppError::MissingField("name".into()));
    }
    let holiday = repo.create(input).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(holiday)))
}

pub async fn holidays_for_year(
    repo: web::Data<HolidayRepository>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let holidays = repo.by_year(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(holidays)))
}

pub async fn delete_holiday(
    repo: web::Data<HolidayRepository>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    repo.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(None, "deleted")))
}
