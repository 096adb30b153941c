use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::database::store::StoreError;
use crate::handlers::shared::ApiResponse;

/// Details attached to a cap rejection so callers can show the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapDetails {
    pub current: f64,
    pub delta: f64,
    pub limit: f64,
}

impl std::fmt::Display for CapDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} existing + {} new exceeds {}",
            self.current, self.delta, self.limit
        )
    }
}

/// Which period lock rejected the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodLockKind {
    Historical,
    Certified,
}

impl std::fmt::Display for PeriodLockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodLockKind::Historical => write!(f, "historical"),
            PeriodLockKind::Certified => write!(f, "certified"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Bad date: {0}")]
    BadDate(String),

    #[error("Bad time: {0}")]
    BadTime(String),

    #[error("Month mismatch: {0}")]
    MonthMismatch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Period locked ({kind}): {message}")]
    PeriodLocked {
        kind: PeriodLockKind,
        message: String,
    },

    #[error("Monthly cap exceeded: {0}")]
    MonthlyCapExceeded(CapDetails),

    #[error("Total cap exceeded: {0}")]
    TotalCapExceeded(CapDetails),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Schema drift: {0}")]
    SchemaDrift(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, part of the public API surface.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingField(_) => "ValidationError/MissingField",
            AppError::BadDate(_) => "ValidationError/BadDate",
            AppError::BadTime(_) => "ValidationError/BadTime",
            AppError::MonthMismatch(_) => "ValidationError/MonthMismatch",
            AppError::NotFound(_) => "NotFound",
            AppError::AlreadyExists(_) => "Conflict/AlreadyExists",
            AppError::PeriodLocked {
                kind: PeriodLockKind::Historical,
                ..
            } => "Conflict/PeriodLocked/Historical",
            AppError::PeriodLocked {
                kind: PeriodLockKind::Certified,
                ..
            } => "Conflict/PeriodLocked/Certified",
            AppError::MonthlyCapExceeded(_) => "CapExceeded/Monthly",
            AppError::TotalCapExceeded(_) => "CapExceeded/Total",
            AppError::PreconditionFailed(_) => "PreconditionFailed",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::SchemaDrift(_) => "Internal/SchemaDrift",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Retriable errors left no partial state behind.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn schema_drift(collection: &str, id: &str, detail: &str) -> Self {
        AppError::SchemaDrift(format!("{collection}/{id}: {detail}"))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::BadDate(_)
            | AppError::BadTime(_)
            | AppError::MonthMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::PeriodLocked { .. } => StatusCode::CONFLICT,
            AppError::MonthlyCapExceeded(_)
            | AppError::TotalCapExceeded(_)
            | AppError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SchemaDrift(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let message = self.to_string();

        log::error!("Request failed with status {}: {}", status_code, message);

        let body = match self {
            AppError::MonthlyCapExceeded(details) | AppError::TotalCapExceeded(details) => {
                ApiResponse::error_with_data(*details, self.kind(), &message)
            }
            _ => ApiResponse::<CapDetails>::error(self.kind(), &message),
        };

        HttpResponse::build(status_code).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{collection}/{id}"))
            }
            StoreError::AlreadyExists { collection, id } => {
                AppError::AlreadyExists(format!("{collection}/{id}"))
            }
            StoreError::Unavailable(message) => AppError::StoreUnavailable(message),
            StoreError::Corrupt(message) => AppError::SchemaDrift(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Unhandled error: {}", error);
        AppError::Internal(error.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
