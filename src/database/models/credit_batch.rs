use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum BatchStatus {
        Active => "Active",
        Used => "Used",
        Expired => "Expired",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum BatchSource {
        MonthlyCertificate => "MonthlyCertificate",
        HistoricalImport => "HistoricalImport",
    }
}

/// Immutable record of certified credits with an expiration.
///
/// Only `remaining_hours`, `used_hours`, and `status` ever change after
/// creation; expiration preserves `remaining_hours` on the record for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditBatch {
    pub batch_id: String,
    pub employee_id: String,
    pub earned_month: String,
    pub earned_year: i32,
    pub original_hours: f64,
    pub remaining_hours: f64,
    pub used_hours: f64,
    pub status: BatchStatus,
    pub date_of_issuance: NaiveDate,
    pub valid_until: NaiveDate,
    pub source_type: BatchSource,
    pub source_certificate_id: Option<String>,
    pub notes: Option<String>,
}

impl CreditBatch {
    /// Usable for debits at `as_of`: active and not past validity.
    pub fn is_usable(&self, as_of: NaiveDate) -> bool {
        self.status == BatchStatus::Active && self.valid_until >= as_of
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.batch_id.clone())
            .with("batchId", self.batch_id.as_str())
            .with("employeeId", self.employee_id.as_str())
            .with("earnedMonth", self.earned_month.as_str())
            .with("earnedYear", self.earned_year)
            .with("originalHours", self.original_hours)
            .with("remainingHours", self.remaining_hours)
            .with("usedHours", self.used_hours)
            .with("status", self.status.to_string())
            .with("dateOfIssuance", self.date_of_issuance)
            .with("validUntil", self.valid_until)
            .with("sourceType", self.source_type.to_string())
            .with("sourceCertificateId", self.source_certificate_id.clone())
            .with("notes", self.notes.clone())
    }

    pub fn from_document(doc: &Document) -> Result<CreditBatch, AppError> {
        const C: &str = collections::CREDIT_BATCHES;
        Ok(CreditBatch {
            batch_id: doc.str(C, "batchId")?,
            employee_id: doc.str(C, "employeeId")?,
            earned_month: doc.str(C, "earnedMonth")?,
            earned_year: doc.int(C, "earnedYear")? as i32,
            original_hours: doc.float(C, "originalHours")?,
            remaining_hours: doc.float(C, "remainingHours")?,
            used_hours: doc.float(C, "usedHours")?,
            status: doc
                .str(C, "status")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            date_of_issuance: doc.civil_date(C, "dateOfIssuance")?,
            valid_until: doc.civil_date(C, "validUntil")?,
            source_type: doc
                .str(C, "sourceType")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            source_certificate_id: doc.opt_str(C, "sourceCertificateId")?,
            notes: doc.opt_str(C, "notes")?,
        })
    }

    /// Patch applied when a debit consumes hours from this batch.
    pub fn consume_patch(&self, consumed: f64) -> Document {
        let remaining = crate::services::accrual::round_tenth(self.remaining_hours - consumed);
        let used = crate::services::accrual::round_tenth(self.used_hours + consumed);
        let status = if remaining <= 0.0 {
            BatchStatus::Used
        } else {
            self.status
        };
        Document::new(self.batch_id.clone())
            .with("remainingHours", remaining)
            .with("usedHours", used)
            .with("status", status.to_string())
    }

    /// Patch applied by the expiration sweep; remaining hours stay recorded.
    pub fn expire_patch(&self) -> Document {
        Document::new(self.batch_id.clone()).with("status", BatchStatus::Expired.to_string())
    }
}

/// Input for a pre-system balance carried in from the old spreadsheets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalImportInput {
    pub employee_id: String,
    pub earned_month: String,
    pub earned_year: i32,
    pub hours: f64,
    pub date_of_issuance: String,
    pub valid_until: String,
    pub notes: Option<String>,
}
