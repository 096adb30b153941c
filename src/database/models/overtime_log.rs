use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::{Document, Value};
use crate::error::AppError;

use super::macros::string_enum;

string_enum! {
    /// Classification of a worked date; selects the accrual rule.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    pub enum DayType {
        Weekday => "Weekday",
        Weekend => "Weekend",
        Holiday => "Holiday",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum LogStatus {
        Uncertified => "Uncertified",
        Active => "Active",
        Used => "Used",
        Expired => "Expired",
    }
}

impl LogStatus {
    /// Terminal logs no longer count toward the monthly cap.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogStatus::Used | LogStatus::Expired)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeLog {
    pub log_id: String,
    pub employee_id: String,
    pub month: String,
    pub year: i32,
    pub date_worked: NaiveDate,
    pub day_type: DayType,
    pub am_in: Option<String>,
    pub am_out: Option<String>,
    pub pm_in: Option<String>,
    pub pm_out: Option<String>,
    pub coc_earned: f64,
    pub status: LogStatus,
    pub logged_by: String,
    pub logged_at: DateTime<Utc>,
    pub valid_until: Option<NaiveDate>,
    pub correlation_id: Option<String>,
}

impl OvertimeLog {
    pub fn to_document(&self) -> Document {
        Document::new(self.log_id.clone())
            .with("logId", self.log_id.as_str())
            .with("employeeId", self.employee_id.as_str())
            .with("month", self.month.as_str())
            .with("year", self.year)
            .with("dateWorked", self.date_worked)
            .with("dayType", self.day_type.to_string())
            .with("amIn", self.am_in.clone())
            .with("amOut", self.am_out.clone())
            .with("pmIn", self.pm_in.clone())
            .with("pmOut", self.pm_out.clone())
            .with("cocEarned", self.coc_earned)
            .with("status", self.status.to_string())
            .with("loggedBy", self.logged_by.as_str())
            .with("loggedAt", self.logged_at)
            .with("validUntil", self.valid_until)
            .with("correlationId", self.correlation_id.clone())
    }

    pub fn from_document(doc: &Document) -> Result<OvertimeLog, AppError> {
        const C: &str = collections::OVERTIME_LOGS;
        Ok(OvertimeLog {
            log_id: doc.str(C, "logId")?,
            employee_id: doc.str(C, "employeeId")?,
            month: doc.str(C, "month")?,
            year: doc.int(C, "year")? as i32,
            date_worked: doc.civil_date(C, "dateWorked")?,
            day_type: doc
                .str(C, "dayType")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            am_in: doc.opt_str(C, "amIn")?,
            am_out: doc.opt_str(C, "amOut")?,
            pm_in: doc.opt_str(C, "pmIn")?,
            pm_out: doc.opt_str(C, "pmOut")?,
            coc_earned: doc.float(C, "cocEarned")?,
            status: doc
                .str(C, "status")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            logged_by: doc.str(C, "loggedBy")?,
            logged_at: doc.timestamp(C, "loggedAt")?,
            valid_until: doc.opt_civil_date(C, "validUntil")?,
            correlation_id: doc.opt_str(C, "correlationId")?,
        })
    }

    /// Patch that moves an uncertified log into a certificate.
    pub fn certify_patch(log_id: &str, valid_until: NaiveDate) -> Document {
        Document::new(log_id)
            .with("status", LogStatus::Active.to_string())
            .with("validUntil", valid_until)
    }

    pub fn status_patch(log_id: &str, status: LogStatus) -> Document {
        let mut patch = Document::new(log_id).with("status", status.to_string());
        if status == LogStatus::Uncertified {
            patch.set("validUntil", Value::Null);
        }
        patch
    }
}

/// One punch-card row in a batch overtime submission.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeEntryInput {
    pub date: String,
    pub am_in: Option<String>,
    pub am_out: Option<String>,
    pub pm_in: Option<String>,
    pub pm_out: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOvertimeInput {
    pub employee_id: String,
    pub month: String,
    pub year: i32,
    pub entries: Vec<OvertimeEntryInput>,
    /// Caller-supplied idempotency token; generated when absent.
    pub correlation_id: Option<String>,
}

/// Success payload of the batch write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOvertimeResult {
    pub entries_logged: usize,
    pub total_credit_hours: f64,
    pub skipped_duplicates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeLogUpdate {
    pub am_in: Option<String>,
    pub am_out: Option<String>,
    pub pm_in: Option<String>,
    pub pm_out: Option<String>,
}
