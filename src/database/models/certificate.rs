use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

/// Witness that a (employee, month, year) period was certified; its presence
/// is the period lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_id: String,
    pub employee_id: String,
    pub month: String,
    pub year: i32,
    pub date_of_issuance: NaiveDate,
    pub valid_until: NaiveDate,
    pub total_hours: f64,
    pub certified_by: String,
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    pub fn to_document(&self) -> Document {
        Document::new(self.certificate_id.clone())
            .with("certificateId", self.certificate_id.as_str())
            .with("employeeId", self.employee_id.as_str())
            .with("month", self.month.as_str())
            .with("year", self.year)
            .with("dateOfIssuance", self.date_of_issuance)
            .with("validUntil", self.valid_until)
            .with("totalHours", self.total_hours)
            .with("certifiedBy", self.certified_by.as_str())
            .with("createdAt", self.created_at)
    }

    pub fn from_document(doc: &Document) -> Result<Certificate, AppError> {
        const C: &str = collections::CERTIFICATES;
        Ok(Certificate {
            certificate_id: doc.str(C, "certificateId")?,
            employee_id: doc.str(C, "employeeId")?,
            month: doc.str(C, "month")?,
            year: doc.int(C, "year")? as i32,
            date_of_issuance: doc.civil_date(C, "dateOfIssuance")?,
            valid_until: doc.civil_date(C, "validUntil")?,
            total_hours: doc.float(C, "totalHours")?,
            certified_by: doc.str(C, "certifiedBy")?,
            created_at: doc.timestamp(C, "createdAt")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifyInput {
    pub employee_id: String,
    pub month: String,
    pub year: i32,
    pub date_of_issuance: String,
}

/// Success payload of a certification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifyResult {
    pub certificate_id: String,
    pub batch_id: String,
    pub logs_certified: usize,
    pub total_hours: f64,
    pub valid_until: NaiveDate,
}
