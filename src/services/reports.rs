//! Read-side composition: the employee detailed ledger, uncertified roll-ups,
//! certified-month lookup, and cap progress. Every view queries the store
//! with the predicates it knows; nothing loads a collection to filter in
//! code.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::database::models::{BatchSource, DayType, LogStatus};
use crate::database::repositories::{
    CertificateRepository, ConfigurationRepository, CreditBatchRepository, EmployeeRepository,
    LedgerRepository, OvertimeLogRepository,
};
use crate::error::AppResult;
use crate::services::accrual::round_tenth;

#[derive(Clone)]
pub struct ReportService {
    logs: OvertimeLogRepository,
    batches: CreditBatchRepository,
    certificates: CertificateRepository,
    employees: EmployeeRepository,
    ledger: LedgerRepository,
    configuration: ConfigurationRepository,
}

/// One row of the combined employee ledger view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub month: String,
    pub year: i32,
    pub date: NaiveDate,
    pub day_type: Option<DayType>,
    pub am_in: Option<String>,
    pub am_out: Option<String>,
    pub pm_in: Option<String>,
    pub pm_out: Option<String>,
    pub earned: f64,
    pub used: Option<f64>,
    pub remaining: Option<f64>,
    pub date_of_issuance: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub status: String,
    pub is_historical: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedLedger {
    pub employee_id: String,
    pub active_balance: f64,
    pub uncertified_balance: f64,
    pub total_earned: f64,
    pub used_credits: f64,
    pub rows: Vec<LedgerRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertifiedStats {
    pub total_hours: f64,
    pub total_logs: usize,
    pub unique_employees: usize,
    pub oldest_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertifiedLogRow {
    pub log_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub month: String,
    pub year: i32,
    pub date_worked: NaiveDate,
    pub coc_earned: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub monthly_total: f64,
    pub monthly_cap: f64,
    pub monthly_remaining: f64,
    pub total_balance: f64,
    pub total_cap: f64,
    pub total_remaining: f64,
}

impl ReportService {
    pub fn new(
        logs: OvertimeLogRepository,
        batches: CreditBatchRepository,
        certificates: CertificateRepository,
        employees: EmployeeRepository,
        ledger: LedgerRepository,
        configuration: ConfigurationRepository,
    ) -> Self {
        Self {
            logs,
            batches,
            certificates,
            employees,
            ledger,
            configuration,
        }
    }

    /// Today's civil date in the configured zone.
    pub async fn today(&self, now: chrono::DateTime<chrono::Utc>) -> AppResult<NaiveDate> {
        let settings = self.configuration.settings().await?;
        Ok(crate::services::calendar::civil_today(now, settings.time_zone))
    }

    /// Historical batches and current logs merged into one sequence, newest
    /// first. Exactly two store queries.
    pub async fn detailed_ledger(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> AppResult<DetailedLedger> {
        let batches = self.batches.by_employee(employee_id).await?;
        let logs = self.logs.query_by_employee(employee_id).await?;

        let mut rows: Vec<LedgerRow> = Vec::with_capacity(batches.len() + logs.len());
        let mut active_balance = 0.0;
        let mut total_earned = 0.0;
        let mut used_credits = 0.0;
        let mut uncertified_balance = 0.0;

        for batch in &batches {
            total_earned += batch.original_hours;
            used_credits += batch.used_hours;
            if batch.is_usable(as_of) {
                active_balance += batch.remaining_hours;
            }
            if batch.source_type == BatchSource::HistoricalImport {
                rows.push(LedgerRow {
                    month: batch.earned_month.clone(),
                    year: batch.earned_year,
                    date: batch.date_of_issuance,
                    day_type: None,
                    am_in: None,
                    am_out: None,
                    pm_in: None,
                    pm_out: None,
                    earned: batch.original_hours,
                    used: Some(batch.used_hours),
                    remaining: Some(batch.remaining_hours),
                    date_of_issuance: Some(batch.date_of_issuance),
                    valid_until: Some(batch.valid_until),
                    status: batch.status.to_string(),
                    is_historical: true,
                });
            }
        }

        // Issuance dates for certified log rows come from their period's
        // certification batch, joined in memory.
        let issuance_by_period: HashMap<(&str, i32), NaiveDate> = batches
            .iter()
            .filter(|batch| batch.source_type == BatchSource::MonthlyCertificate)
            .map(|batch| {
                (
                    (batch.earned_month.as_str(), batch.earned_year),
                    batch.date_of_issuance,
                )
            })
            .collect();

        for log in &logs {
            if log.status == LogStatus::Uncertified {
                uncertified_balance += log.coc_earned;
            }
            rows.push(LedgerRow {
                month: log.month.clone(),
                year: log.year,
                date: log.date_worked,
                day_type: Some(log.day_type),
                am_in: log.am_in.clone(),
                am_out: log.am_out.clone(),
                pm_in: log.pm_in.clone(),
                pm_out: log.pm_out.clone(),
                earned: log.coc_earned,
                used: None,
                remaining: None,
                date_of_issuance: if log.status == LogStatus::Uncertified {
                    None
                } else {
                    issuance_by_period
                        .get(&(log.month.as_str(), log.year))
                        .copied()
                },
                valid_until: log.valid_until,
                status: log.status.to_string(),
                is_historical: false,
            });
        }

        rows.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(DetailedLedger {
            employee_id: employee_id.to_string(),
            active_balance: round_tenth(active_balance),
            uncertified_balance: round_tenth(uncertified_balance),
            total_earned: round_tenth(total_earned),
            used_credits: round_tenth(used_credits),
            rows,
        })
    }

    /// Office-wide roll-up of everything still awaiting certification.
    pub async fn uncertified_stats(&self) -> AppResult<UncertifiedStats> {
        let logs = self.logs.query_by_status(LogStatus::Uncertified).await?;
        let unique: std::collections::HashSet<&str> =
            logs.iter().map(|log| log.employee_id.as_str()).collect();
        Ok(UncertifiedStats {
            total_hours: round_tenth(logs.iter().map(|log| log.coc_earned).sum()),
            total_logs: logs.len(),
            unique_employees: unique.len(),
            oldest_date: logs.iter().map(|log| log.date_worked).min(),
        })
    }

    /// Uncertified logs with employee names: one query for logs, one for
    /// active employees, joined in memory.
    pub async fn uncertified_detailed(&self) -> AppResult<Vec<UncertifiedLogRow>> {
        let logs = self.logs.query_by_status(LogStatus::Uncertified).await?;
        let employees = self.employees.get_active().await?;
        let names: HashMap<&str, String> = employees
            .iter()
            .map(|employee| (employee.employee_id.as_str(), employee.full_name()))
            .collect();

        Ok(logs
            .into_iter()
            .map(|log| {
                let employee_name = names
                    .get(log.employee_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| log.employee_id.clone());
                UncertifiedLogRow {
                    log_id: log.log_id,
                    employee_name,
                    employee_id: log.employee_id,
                    month: log.month,
                    year: log.year,
                    date_worked: log.date_worked,
                    coc_earned: log.coc_earned,
                }
            })
            .collect())
    }

    pub async fn certified_months(&self, employee_id: &str, year: i32) -> AppResult<Vec<String>> {
        let certificates = self.certificates.by_employee_year(employee_id, year).await?;
        Ok(certificates
            .into_iter()
            .map(|certificate| certificate.month)
            .collect())
    }

    /// Standing against both caps for one period.
    pub async fn progress(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
        as_of: NaiveDate,
    ) -> AppResult<ProgressReport> {
        let settings = self.configuration.settings().await?;
        let monthly_total = self
            .logs
            .month_total_non_terminal(employee_id, month, year)
            .await?;

        let batches = self.batches.active_by_employee(employee_id).await?;
        let active: f64 = batches
            .iter()
            .filter(|batch| batch.is_usable(as_of))
            .map(|batch| batch.remaining_hours)
            .sum();
        let uncertified = self.logs.uncertified_total(employee_id).await?;
        let total_balance = round_tenth(active + uncertified);

        Ok(ProgressReport {
            monthly_total,
            monthly_cap: settings.monthly_cap,
            monthly_remaining: round_tenth((settings.monthly_cap - monthly_total).max(0.0)),
            total_balance,
            total_cap: settings.total_cap,
            total_remaining: round_tenth((settings.total_cap - total_balance).max(0.0)),
        })
    }

    /// Employee-ordered ledger entries, the §4.6 total order.
    pub async fn ledger_entries(
        &self,
        employee_id: &str,
    ) -> AppResult<Vec<crate::database::models::LedgerEntry>> {
        self.ledger.by_employee(employee_id).await
    }
}
