use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum TransactionType {
        Credit => "Credit",
        Debit => "Debit",
        Adjustment => "Adjustment",
        Expiration => "Expiration",
    }
}

/// One signed-hours journal row. The ledger is append-only; corrections are
/// new rows of type Adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub transaction_id: String,
    pub employee_id: String,
    pub transaction_type: TransactionType,
    /// Signed: positive for Credit and upward Adjustment, negative for
    /// Debit, Expiration, and downward Adjustment.
    pub hours: f64,
    pub batch_id: Option<String>,
    pub reference_id: Option<String>,
    pub notes: String,
    pub transaction_date: DateTime<Utc>,
    pub performed_by: String,
}

impl LedgerEntry {
    pub fn to_document(&self) -> Document {
        Document::new(self.transaction_id.clone())
            .with("transactionId", self.transaction_id.as_str())
            .with("employeeId", self.employee_id.as_str())
            .with("transactionType", self.transaction_type.to_string())
            .with("hours", self.hours)
            .with("batchId", self.batch_id.clone())
            .with("referenceId", self.reference_id.clone())
            .with("notes", self.notes.as_str())
            .with("transactionDate", self.transaction_date)
            .with("performedBy", self.performed_by.as_str())
    }

    pub fn from_document(doc: &Document) -> Result<LedgerEntry, AppError> {
        const C: &str = collections::LEDGER;
        Ok(LedgerEntry {
            transaction_id: doc.str(C, "transactionId")?,
            employee_id: doc.str(C, "employeeId")?,
            transaction_type: doc
                .str(C, "transactionType")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            hours: doc.float(C, "hours")?,
            batch_id: doc.opt_str(C, "batchId")?,
            reference_id: doc.opt_str(C, "referenceId")?,
            notes: doc.str(C, "notes")?,
            transaction_date: doc.timestamp(C, "transactionDate")?,
            performed_by: doc.str(C, "performedBy")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitInput {
    pub employee_id: String,
    pub hours: f64,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

/// How a debit landed on one batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebitAllocation {
    pub batch_id: String,
    pub hours_consumed: f64,
}

/// Point-in-time balance decomposition for one employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub active: f64,
    pub uncertified: f64,
    pub total_earned: f64,
    pub used: f64,
    pub expired: f64,
}
