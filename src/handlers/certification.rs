use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::database::models::CertifyInput;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{Actor, CertificationService};

pub async fn certify(
    actor: Actor,
    service: web::Data<CertificationService>,
    input: web::Json<CertifyInput>,
) -> Result<HttpResponse, AppError> {
    let result = service
        .certify(input.into_inner(), actor.id(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(result)))
}

pub async fn certificates_for_year(
    service: web::Data<CertificationService>,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year) = path.into_inner();
    let certificates = service.certificates_for_year(&employee_id, year).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(certificates)))
}

/// Completes any period left half-certified by a crash.
pub async fn recover(
    service: web::Data<CertificationService>,
) -> Result<HttpResponse, AppError> {
    let recovered = service.recover_dangling(Utc::now()).await?;
    let message = format!("{} periods completed", recovered.len());
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(Some(recovered), &message)))
}
