//! Certification: uncertified logs for one period become an active credit
//! batch with an expiration, a ledger credit, and a certificate record.
//!
//! The four writes commit as one batch in the order log-updates, batch,
//! ledger, certificate. On a backend without transactions the only
//! observable partial state is "logs Active but no certificate", which the
//! recovery scan detects and completes.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{
    BatchSource, BatchStatus, Certificate, CertifyInput, CertifyResult, CreditBatch, LedgerEntry,
    LogStatus, OvertimeLog, TransactionType,
};
use crate::database::repositories::{
    CertificateRepository, ConfigurationRepository, CreditBatchRepository, EmployeeRepository,
    LedgerRepository, OvertimeLogRepository,
};
use crate::database::store::WriteOp;
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};
use crate::services::accrual::round_tenth;
use crate::services::calendar::{civil_today, month_name, month_number, validity_end};
use crate::services::locks::LockService;

const LOCK_TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct CertificationService {
    store: Store,
    logs: OvertimeLogRepository,
    employees: EmployeeRepository,
    batches: CreditBatchRepository,
    certificates: CertificateRepository,
    ledger: LedgerRepository,
    configuration: ConfigurationRepository,
    locks: LockService,
}

/// One period completed by the recovery scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredPeriod {
    pub employee_id: String,
    pub month: String,
    pub year: i32,
    pub total_hours: f64,
}

impl CertificationService {
    pub fn new(
        store: Store,
        logs: OvertimeLogRepository,
        employees: EmployeeRepository,
        batches: CreditBatchRepository,
        certificates: CertificateRepository,
        ledger: LedgerRepository,
        configuration: ConfigurationRepository,
        locks: LockService,
    ) -> Self {
        Self {
            store,
            logs,
            employees,
            batches,
            certificates,
            ledger,
            configuration,
            locks,
        }
    }

    pub async fn certify(
        &self,
        input: CertifyInput,
        actor: &str,
        now: DateTime<Utc>,
    ) -> AppResult<CertifyResult> {
        let month_index = month_number(&input.month).ok_or_else(|| {
            AppError::BadDate(format!("{} is not an English month name", input.month))
        })?;
        let month = month_name(month_index)
            .unwrap_or(input.month.as_str())
            .to_string();
        let input = CertifyInput { month, ..input };
        let issuance = NaiveDate::parse_from_str(&input.date_of_issuance, "%Y-%m-%d")
            .map_err(|_| {
                AppError::BadDate(format!(
                    "{} is not an ISO-8601 date",
                    input.date_of_issuance
                ))
            })?;

        let settings = self.configuration.settings().await?;
        let today = civil_today(now, settings.time_zone);
        if issuance > today {
            return Err(AppError::PreconditionFailed(format!(
                "date of issuance {issuance} is in the future"
            )));
        }

        self.employees.require(&input.employee_id).await?;

        let guard = self
            .locks
            .acquire("certify", &input.employee_id, LOCK_TTL, now)
            .await?;
        let outcome = self
            .certify_locked(&input, issuance, actor, now, settings.certificate_validity_months)
            .await;
        guard.release().await?;
        outcome
    }

    async fn certify_locked(
        &self,
        input: &CertifyInput,
        issuance: NaiveDate,
        actor: &str,
        now: DateTime<Utc>,
        validity_months: u32,
    ) -> AppResult<CertifyResult> {
        // Repeating a certification is a no-op failure, not a second batch.
        if self
            .certificates
            .find_for_period(&input.employee_id, &input.month, input.year)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "{} {} for {} is already certified",
                input.month, input.year, input.employee_id
            )));
        }

        let uncertified = self
            .logs
            .query_uncertified_for_period(&input.employee_id, &input.month, input.year)
            .await?;
        if uncertified.is_empty() {
            return Err(AppError::PreconditionFailed(format!(
                "no uncertified logs for {} in {} {}",
                input.employee_id, input.month, input.year
            )));
        }

        let valid_until = validity_end(issuance, validity_months)?;
        let total_hours = round_tenth(uncertified.iter().map(|log| log.coc_earned).sum());

        let certificate_id = Uuid::new_v4().to_string();
        let batch_id = Uuid::new_v4().to_string();
        let transaction_id = self.ledger.next_transaction_id().await?;

        let batch = CreditBatch {
            batch_id: batch_id.clone(),
            employee_id: input.employee_id.clone(),
            earned_month: input.month.clone(),
            earned_year: input.year,
            original_hours: total_hours,
            remaining_hours: total_hours,
            used_hours: 0.0,
            status: BatchStatus::Active,
            date_of_issuance: issuance,
            valid_until,
            source_type: BatchSource::MonthlyCertificate,
            source_certificate_id: Some(certificate_id.clone()),
            notes: None,
        };
        let credit = LedgerEntry {
            transaction_id,
            employee_id: input.employee_id.clone(),
            transaction_type: TransactionType::Credit,
            hours: total_hours,
            batch_id: Some(batch_id.clone()),
            reference_id: Some(certificate_id.clone()),
            notes: format!("Certified {} {}", input.month, input.year),
            transaction_date: now,
            performed_by: actor.to_string(),
        };
        let certificate = Certificate {
            certificate_id: certificate_id.clone(),
            employee_id: input.employee_id.clone(),
            month: input.month.clone(),
            year: input.year,
            date_of_issuance: issuance,
            valid_until,
            total_hours,
            certified_by: actor.to_string(),
            created_at: now,
        };

        // Write order is load-bearing for crash recovery: logs first,
        // certificate last.
        let mut ops: Vec<WriteOp> = uncertified
            .iter()
            .map(|log| {
                WriteOp::update(
                    collections::OVERTIME_LOGS,
                    &log.log_id,
                    OvertimeLog::certify_patch(&log.log_id, valid_until),
                )
            })
            .collect();
        ops.push(WriteOp::create(
            collections::CREDIT_BATCHES,
            batch.to_document(),
        ));
        ops.push(WriteOp::create(collections::LEDGER, credit.to_document()));
        ops.push(WriteOp::create(
            collections::CERTIFICATES,
            certificate.to_document(),
        ));
        self.store.batch_write(ops).await?;

        log::info!(
            "certified {} logs ({total_hours} hours) for {} in {} {}",
            uncertified.len(),
            input.employee_id,
            input.month,
            input.year
        );

        Ok(CertifyResult {
            certificate_id,
            batch_id,
            logs_certified: uncertified.len(),
            total_hours,
            valid_until,
        })
    }

    /// Completes periods left half-certified by a crash: logs are Active but
    /// no certificate exists. Derives the issuance back from the logs'
    /// validity end and writes the missing batch, credit, and certificate.
    pub async fn recover_dangling(&self, now: DateTime<Utc>) -> AppResult<Vec<RecoveredPeriod>> {
        let settings = self.configuration.settings().await?;
        let active_logs = self.logs.query_by_status(LogStatus::Active).await?;

        let mut periods: BTreeMap<(String, String, i32), Vec<OvertimeLog>> = BTreeMap::new();
        for log in active_logs {
            periods
                .entry((log.employee_id.clone(), log.month.clone(), log.year))
                .or_default()
                .push(log);
        }

        let mut recovered = Vec::new();
        for ((employee_id, month, year), logs) in periods {
            if self
                .certificates
                .find_for_period(&employee_id, &month, year)
                .await?
                .is_some()
            {
                continue;
            }

            let valid_until = match logs.iter().filter_map(|log| log.valid_until).max() {
                Some(date) => date,
                None => continue,
            };
            let issuance = valid_until
                .succ_opt()
                .and_then(|day_after| {
                    day_after.checked_sub_months(Months::new(settings.certificate_validity_months))
                })
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "cannot derive issuance from validity end {valid_until}"
                    ))
                })?;
            let total_hours = round_tenth(logs.iter().map(|log| log.coc_earned).sum());

            let guard = self
                .locks
                .acquire("certify", &employee_id, LOCK_TTL, now)
                .await?;
            let result = self
                .complete_period(&employee_id, &month, year, issuance, valid_until, total_hours, now)
                .await;
            guard.release().await?;
            result?;

            log::warn!(
                "recovery completed certification of {month} {year} for {employee_id} \
                 ({total_hours} hours)"
            );
            recovered.push(RecoveredPeriod {
                employee_id,
                month,
                year,
                total_hours,
            });
        }

        Ok(recovered)
    }

    /// Writes whatever is still missing for a half-certified period, reusing
    /// a batch or credit row that landed before the crash.
    #[allow(clippy::too_many_arguments)]
    async fn complete_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
        issuance: NaiveDate,
        valid_until: NaiveDate,
        total_hours: f64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let existing_batch = self
            .batches
            .certificate_batch_for_period(employee_id, month, year)
            .await?;
        let certificate_id = existing_batch
            .as_ref()
            .and_then(|batch| batch.source_certificate_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let batch_id = existing_batch
            .as_ref()
            .map(|batch| batch.batch_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut ops: Vec<WriteOp> = Vec::new();
        if existing_batch.is_none() {
            let batch = CreditBatch {
                batch_id: batch_id.clone(),
                employee_id: employee_id.to_string(),
                earned_month: month.to_string(),
                earned_year: year,
                original_hours: total_hours,
                remaining_hours: total_hours,
                used_hours: 0.0,
                status: BatchStatus::Active,
                date_of_issuance: issuance,
                valid_until,
                source_type: BatchSource::MonthlyCertificate,
                source_certificate_id: Some(certificate_id.clone()),
                notes: Some("Completed by recovery scan".to_string()),
            };
            ops.push(WriteOp::create(
                collections::CREDIT_BATCHES,
                batch.to_document(),
            ));
        }

        let credited = self.ledger.by_batch(employee_id, &batch_id).await?;
        if credited.is_empty() {
            let credit = LedgerEntry {
                transaction_id: self.ledger.next_transaction_id().await?,
                employee_id: employee_id.to_string(),
                transaction_type: TransactionType::Credit,
                hours: total_hours,
                batch_id: Some(batch_id.clone()),
                reference_id: Some(certificate_id.clone()),
                notes: format!("Certified {month} {year} (recovered)"),
                transaction_date: now,
                performed_by: "recovery".to_string(),
            };
            ops.push(WriteOp::create(collections::LEDGER, credit.to_document()));
        }

        let certificate = Certificate {
            certificate_id,
            employee_id: employee_id.to_string(),
            month: month.to_string(),
            year,
            date_of_issuance: issuance,
            valid_until,
            total_hours,
            certified_by: "recovery".to_string(),
            created_at: now,
        };
        ops.push(WriteOp::create(
            collections::CERTIFICATES,
            certificate.to_document(),
        ));

        self.store.batch_write(ops).await?;
        Ok(())
    }

    pub async fn certificates_for_year(
        &self,
        employee_id: &str,
        year: i32,
    ) -> AppResult<Vec<Certificate>> {
        self.employees.require(employee_id).await?;
        self.certificates.by_employee_year(employee_id, year).await
    }
}
