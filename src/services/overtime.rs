//! The overtime write path: validation cascade, accrual, and atomic persist.
//!
//! The cascade short-circuits on the first failure and reports one aggregate
//! error; duplicate dates inside a batch are skipped with a note instead of
//! failing the whole submission.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{
    DayType, LogOvertimeInput, LogOvertimeResult, LogStatus, OvertimeEntryInput, OvertimeLog,
    OvertimeLogUpdate,
};
use crate::database::repositories::{
    CertificateRepository, ConfigurationRepository, CreditBatchRepository, EmployeeRepository,
    HolidayRepository, OvertimeLogRepository,
};
use crate::error::{AppError, AppResult, CapDetails, PeriodLockKind};
use crate::services::accrual::{credit_hours, parse_punch, round_tenth};
use crate::services::calendar::{civil_today, month_name, month_number, Calendar};

const CAP_TOLERANCE: f64 = 1e-9;

#[derive(Clone)]
pub struct OvertimeService {
    logs: OvertimeLogRepository,
    employees: EmployeeRepository,
    batches: CreditBatchRepository,
    certificates: CertificateRepository,
    holidays: HolidayRepository,
    configuration: ConfigurationRepository,
}

struct AcceptedEntry {
    date: NaiveDate,
    entry: OvertimeEntryInput,
    day_type: DayType,
    earned: f64,
}

impl OvertimeService {
    pub fn new(
        logs: OvertimeLogRepository,
        employees: EmployeeRepository,
        batches: CreditBatchRepository,
        certificates: CertificateRepository,
        holidays: HolidayRepository,
        configuration: ConfigurationRepository,
    ) -> Self {
        Self {
            logs,
            employees,
            batches,
            certificates,
            holidays,
            configuration,
        }
    }

    /// Validates and persists one batch submission for a single period.
    ///
    /// Steps, in order: schema, employee, historical period lock, certified
    /// period lock, prefetch, per-entry classification and accrual, monthly
    /// cap, total cap, atomic persist with read-back verification.
    pub async fn log_batch(
        &self,
        input: LogOvertimeInput,
        actor: &str,
        now: DateTime<Utc>,
    ) -> AppResult<LogOvertimeResult> {
        // 1. Schema.
        if input.employee_id.trim().is_empty() {
            return Err(AppError::MissingField("employeeId".into()));
        }
        let month_index = month_number(&input.month).ok_or_else(|| {
            AppError::BadDate(format!("{} is not an English month name", input.month))
        })?;
        // Canonical capitalization, whatever the caller sent.
        let month = month_name(month_index)
            .unwrap_or(input.month.as_str())
            .to_string();
        let input = LogOvertimeInput { month, ..input };
        if input.entries.is_empty() {
            return Err(AppError::MissingField("entries".into()));
        }

        // 2. Employee must exist; status does not gate backfill.
        self.employees.require(&input.employee_id).await?;

        // 3. Historical period lock.
        if self
            .batches
            .historical_for_period(&input.employee_id, &input.month, input.year)
            .await?
            .is_some()
        {
            return Err(AppError::PeriodLocked {
                kind: PeriodLockKind::Historical,
                message: format!(
                    "{} {} for {} is covered by a historical import",
                    input.month, input.year, input.employee_id
                ),
            });
        }

        // 4. Certified period lock.
        if self
            .certificates
            .find_for_period(&input.employee_id, &input.month, input.year)
            .await?
            .is_some()
        {
            return Err(AppError::PeriodLocked {
                kind: PeriodLockKind::Certified,
                message: format!(
                    "{} {} for {} is already certified",
                    input.month, input.year, input.employee_id
                ),
            });
        }

        // 5. Prefetch: existing dates, holiday set, weekend configuration.
        // One query each; per-entry work below touches no storage.
        let existing = self
            .logs
            .query_by_period(&input.employee_id, &input.month, input.year)
            .await?;
        let mut taken_dates: HashSet<NaiveDate> = existing
            .iter()
            .filter(|log| !log.status.is_terminal())
            .map(|log| log.date_worked)
            .collect();
        let holiday_dates = self.holidays.dates_for_year(input.year).await?;
        let settings = self.configuration.settings().await?;
        let calendar = Calendar::new(settings.weekend_days.clone(), holiday_dates);

        // 6. Per-entry, in input order.
        let mut accepted: Vec<AcceptedEntry> = Vec::new();
        let mut skipped: Vec<NaiveDate> = Vec::new();
        let mut batch_total = 0.0;

        for entry in &input.entries {
            let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d").map_err(|_| {
                AppError::BadDate(format!("{} is not an ISO-8601 date", entry.date))
            })?;
            if date.month() != month_index || date.year() != input.year {
                return Err(AppError::MonthMismatch(format!(
                    "{date} is outside {} {}",
                    input.month, input.year
                )));
            }
            if taken_dates.contains(&date) {
                skipped.push(date);
                continue;
            }

            let day_type = calendar.day_type(date);
            let earned = credit_hours(
                day_type,
                entry.am_in.as_deref(),
                entry.am_out.as_deref(),
                entry.pm_in.as_deref(),
                entry.pm_out.as_deref(),
            );
            batch_total = round_tenth(batch_total + earned);
            taken_dates.insert(date);
            accepted.push(AcceptedEntry {
                date,
                entry: entry.clone(),
                day_type,
                earned,
            });
        }

        if accepted.is_empty() {
            return Err(AppError::MissingField(
                "entries: every submitted date is already logged".into(),
            ));
        }

        // 7. Monthly cap over all non-terminal logs in the period.
        let month_current = self
            .logs
            .month_total_non_terminal(&input.employee_id, &input.month, input.year)
            .await?;
        if month_current + batch_total > settings.monthly_cap + CAP_TOLERANCE {
            return Err(AppError::MonthlyCapExceeded(CapDetails {
                current: month_current,
                delta: batch_total,
                limit: settings.monthly_cap,
            }));
        }

        // 8. Total cap over active plus uncertified credits.
        let today = civil_today(now, settings.time_zone);
        let active = self.active_credits(&input.employee_id, today).await?;
        let uncertified = self.logs.uncertified_total(&input.employee_id).await?;
        let holding = round_tenth(active + uncertified);
        if holding + batch_total > settings.total_cap + CAP_TOLERANCE {
            return Err(AppError::TotalCapExceeded(CapDetails {
                current: holding,
                delta: batch_total,
                limit: settings.total_cap,
            }));
        }

        // Persist the accepted entries as one write, tagged for recovery.
        let correlation_id = input
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut logs = Vec::with_capacity(accepted.len());
        for item in &accepted {
            let log_id = self.logs.next_log_id().await?;
            logs.push(OvertimeLog {
                log_id,
                employee_id: input.employee_id.clone(),
                month: input.month.clone(),
                year: input.year,
                date_worked: item.date,
                day_type: item.day_type,
                am_in: item.entry.am_in.clone(),
                am_out: item.entry.am_out.clone(),
                pm_in: item.entry.pm_in.clone(),
                pm_out: item.entry.pm_out.clone(),
                coc_earned: item.earned,
                status: LogStatus::Uncertified,
                logged_by: actor.to_string(),
                logged_at: now,
                valid_until: None,
                correlation_id: Some(correlation_id.clone()),
            });
        }

        if let Err(error) = self.logs.create_many(&logs).await {
            // Compensate any stragglers from a partial apply before
            // surfacing the original failure.
            match self.logs.delete_by_correlation(&correlation_id).await {
                Ok(removed) if removed > 0 => log::warn!(
                    "compensated {removed} partially written logs for batch {correlation_id}"
                ),
                Ok(_) => {}
                Err(cleanup) => log::error!(
                    "compensation for batch {correlation_id} failed: {cleanup}"
                ),
            }
            return Err(error);
        }

        // Read-back verification of the batch-write post-condition.
        let written = self.logs.find_by_correlation(&correlation_id).await?;
        if written.len() != logs.len() {
            let removed = self.logs.delete_by_correlation(&correlation_id).await?;
            log::warn!(
                "batch {correlation_id} wrote {} of {} logs; compensated {removed}",
                written.len(),
                logs.len()
            );
            return Err(AppError::StoreUnavailable(format!(
                "batch write for {correlation_id} was incomplete and has been rolled back"
            )));
        }

        log::info!(
            "logged {} overtime entries ({batch_total} hours) for {} in {} {}",
            logs.len(),
            input.employee_id,
            input.month,
            input.year
        );

        Ok(LogOvertimeResult {
            entries_logged: logs.len(),
            total_credit_hours: batch_total,
            skipped_duplicates: skipped,
        })
    }

    /// Re-computes punches on an uncertified log, re-checking the monthly cap.
    pub async fn update_log(
        &self,
        log_id: &str,
        update: OvertimeLogUpdate,
    ) -> AppResult<OvertimeLog> {
        let log = self.logs.require(log_id).await?;
        if log.status != LogStatus::Uncertified {
            return Err(AppError::PreconditionFailed(format!(
                "overtime log {log_id} is {} and cannot be edited",
                log.status
            )));
        }

        // Unlike the batch path, an explicit edit naming a punch must name a
        // parseable one.
        for (field, value) in [
            ("amIn", &update.am_in),
            ("amOut", &update.am_out),
            ("pmIn", &update.pm_in),
            ("pmOut", &update.pm_out),
        ] {
            if let Some(raw) = value {
                if !raw.trim().is_empty() && parse_punch(raw).is_none() {
                    return Err(AppError::BadTime(format!("{field}: {raw}")));
                }
            }
        }

        let am_in = update.am_in.or(log.am_in.clone());
        let am_out = update.am_out.or(log.am_out.clone());
        let pm_in = update.pm_in.or(log.pm_in.clone());
        let pm_out = update.pm_out.or(log.pm_out.clone());

        let settings = self.configuration.settings().await?;
        let holiday_dates = self.holidays.dates_for_year(log.year).await?;
        let calendar = Calendar::new(settings.weekend_days.clone(), holiday_dates);
        let day_type = calendar.day_type(log.date_worked);
        let earned = credit_hours(
            day_type,
            am_in.as_deref(),
            am_out.as_deref(),
            pm_in.as_deref(),
            pm_out.as_deref(),
        );

        let month_current = self
            .logs
            .month_total_non_terminal(&log.employee_id, &log.month, log.year)
            .await?;
        let adjusted = round_tenth(month_current - log.coc_earned + earned);
        if adjusted > settings.monthly_cap + CAP_TOLERANCE {
            return Err(AppError::MonthlyCapExceeded(CapDetails {
                current: round_tenth(month_current - log.coc_earned),
                delta: earned,
                limit: settings.monthly_cap,
            }));
        }

        let patch = crate::database::store::Document::new(log_id)
            .with("amIn", am_in.clone())
            .with("amOut", am_out.clone())
            .with("pmIn", pm_in.clone())
            .with("pmOut", pm_out.clone())
            .with("dayType", day_type.to_string())
            .with("cocEarned", earned);
        self.logs.update(log_id, patch).await?;

        self.logs.require(log_id).await
    }

    pub async fn delete_log(&self, log_id: &str) -> AppResult<OvertimeLog> {
        self.logs.delete(log_id).await
    }

    pub async fn get_log(&self, log_id: &str) -> AppResult<OvertimeLog> {
        self.logs.require(log_id).await
    }

    pub async fn logs_for_employee(&self, employee_id: &str) -> AppResult<Vec<OvertimeLog>> {
        self.employees.require(employee_id).await?;
        self.logs.query_by_employee(employee_id).await
    }

    async fn active_credits(&self, employee_id: &str, as_of: NaiveDate) -> AppResult<f64> {
        let batches = self.batches.active_by_employee(employee_id).await?;
        Ok(round_tenth(
            batches
                .iter()
                .filter(|batch| batch.is_usable(as_of))
                .map(|batch| batch.remaining_hours)
                .sum(),
        ))
    }
}
