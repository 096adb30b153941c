//! Credit lifecycle after certification: FIFO debits, the expiration sweep,
//! balance decomposition, and ledger reconciliation.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{
    BalanceSummary, BatchSource, BatchStatus, CreditBatch, DebitAllocation, DebitInput,
    HistoricalImportInput, LedgerEntry, LogStatus, OvertimeLog, TransactionType,
};
use crate::database::repositories::{
    ConfigurationRepository, CreditBatchRepository, EmployeeRepository, LedgerRepository,
    OvertimeLogRepository,
};
use crate::database::store::{FilterOp, Value, WriteOp};
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};
use crate::services::accrual::round_tenth;
use crate::services::calendar::{civil_today, month_name, month_number};
use crate::services::locks::LockService;

const LOCK_TTL: Duration = Duration::from_secs(30);
/// Hours compare at one-decimal granularity; anything below this is noise.
const HOURS_EPSILON: f64 = 0.05;

#[derive(Clone)]
pub struct CreditService {
    store: Store,
    batches: CreditBatchRepository,
    ledger: LedgerRepository,
    logs: OvertimeLogRepository,
    employees: EmployeeRepository,
    configuration: ConfigurationRepository,
    locks: LockService,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredBatch {
    pub batch_id: String,
    pub employee_id: String,
    pub forfeited_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireSweepResult {
    pub batches_expired: usize,
    pub forfeited_total: f64,
    pub expired: Vec<ExpiredBatch>,
}

/// Ledger-versus-batch reconciliation figures for one employee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReconciliation {
    pub batch_active: f64,
    pub ledger_active: f64,
}

impl CreditService {
    pub fn new(
        store: Store,
        batches: CreditBatchRepository,
        ledger: LedgerRepository,
        logs: OvertimeLogRepository,
        employees: EmployeeRepository,
        configuration: ConfigurationRepository,
        locks: LockService,
    ) -> Self {
        Self {
            store,
            batches,
            ledger,
            logs,
            employees,
            configuration,
            locks,
        }
    }

    /// Today's civil date in the configured zone.
    pub async fn today(&self, now: DateTime<Utc>) -> AppResult<NaiveDate> {
        let settings = self.configuration.settings().await?;
        Ok(civil_today(now, settings.time_zone))
    }

    /// Consumes hours FIFO across the employee's usable batches, earliest
    /// expiry first. Serialized per employee; refuses overdraw.
    pub async fn debit(
        &self,
        input: DebitInput,
        actor: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DebitAllocation>> {
        if input.hours <= 0.0 {
            return Err(AppError::PreconditionFailed(
                "debit hours must be positive".into(),
            ));
        }
        let hours = round_tenth(input.hours);
        self.employees.require(&input.employee_id).await?;

        let guard = self
            .locks
            .acquire("debit", &input.employee_id, LOCK_TTL, now)
            .await?;
        let outcome = self.debit_locked(&input, hours, actor, now).await;
        guard.release().await?;
        outcome
    }

    async fn debit_locked(
        &self,
        input: &DebitInput,
        hours: f64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DebitAllocation>> {
        let settings = self.configuration.settings().await?;
        let today = civil_today(now, settings.time_zone);

        let fifo: Vec<CreditBatch> = self
            .batches
            .active_by_employee(&input.employee_id)
            .await?
            .into_iter()
            .filter(|batch| batch.is_usable(today))
            .collect();

        let available = round_tenth(fifo.iter().map(|batch| batch.remaining_hours).sum());
        if hours > available + HOURS_EPSILON {
            return Err(AppError::PreconditionFailed(format!(
                "debit of {hours} exceeds active balance of {available}"
            )));
        }

        let mut remaining = hours;
        let mut allocations = Vec::new();
        let mut ops = Vec::new();
        for batch in &fifo {
            if remaining <= 0.0 {
                break;
            }
            let consumed = round_tenth(remaining.min(batch.remaining_hours));
            if consumed <= 0.0 {
                continue;
            }
            remaining = round_tenth(remaining - consumed);

            ops.push(WriteOp::update(
                collections::CREDIT_BATCHES,
                &batch.batch_id,
                batch.consume_patch(consumed),
            ));
            let entry = LedgerEntry {
                transaction_id: self.ledger.next_transaction_id().await?,
                employee_id: input.employee_id.clone(),
                transaction_type: TransactionType::Debit,
                hours: -consumed,
                batch_id: Some(batch.batch_id.clone()),
                reference_id: input.reference_id.clone(),
                notes: input
                    .notes
                    .clone()
                    .unwrap_or_else(|| "Credit used".to_string()),
                transaction_date: now,
                performed_by: actor.to_string(),
            };
            ops.push(WriteOp::create(collections::LEDGER, entry.to_document()));

            // A drained certification batch carries its logs with it.
            if (batch.remaining_hours - consumed).abs() < HOURS_EPSILON {
                self.push_log_transitions(batch, LogStatus::Used, &mut ops).await?;
            }

            allocations.push(DebitAllocation {
                batch_id: batch.batch_id.clone(),
                hours_consumed: consumed,
            });
        }

        self.store.batch_write(ops).await?;

        log::info!(
            "debited {hours} hours from {} across {} batches",
            input.employee_id,
            allocations.len()
        );
        Ok(allocations)
    }

    /// Expires every Active batch past its validity, forfeiting whatever
    /// hours remain. The remaining figure stays on the record for audit.
    pub async fn expire_sweep(
        &self,
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<ExpireSweepResult> {
        let candidates = self
            .store
            .where_field(
                collections::CREDIT_BATCHES,
                "validUntil",
                FilterOp::Lt,
                Value::from(as_of),
            )
            .await?;

        let mut expired = Vec::new();
        let mut ops = Vec::new();
        let mut forfeited_total = 0.0;
        for doc in &candidates {
            let batch = CreditBatch::from_document(doc)?;
            if batch.status != BatchStatus::Active {
                continue;
            }

            ops.push(WriteOp::update(
                collections::CREDIT_BATCHES,
                &batch.batch_id,
                batch.expire_patch(),
            ));
            self.push_log_transitions(&batch, LogStatus::Expired, &mut ops)
                .await?;
            let forfeited = round_tenth(batch.remaining_hours);
            if forfeited > 0.0 {
                let entry = LedgerEntry {
                    transaction_id: self.ledger.next_transaction_id().await?,
                    employee_id: batch.employee_id.clone(),
                    transaction_type: TransactionType::Expiration,
                    hours: -forfeited,
                    batch_id: Some(batch.batch_id.clone()),
                    reference_id: None,
                    notes: format!("Credits expired on {}", batch.valid_until),
                    transaction_date: now,
                    performed_by: "system".to_string(),
                };
                ops.push(WriteOp::create(collections::LEDGER, entry.to_document()));
                forfeited_total = round_tenth(forfeited_total + forfeited);
            }
            expired.push(ExpiredBatch {
                batch_id: batch.batch_id.clone(),
                employee_id: batch.employee_id.clone(),
                forfeited_hours: forfeited,
            });
        }

        if !ops.is_empty() {
            self.store.batch_write(ops).await?;
            log::info!(
                "expire sweep as of {as_of}: {} batches, {forfeited_total} hours forfeited",
                expired.len()
            );
        }

        Ok(ExpireSweepResult {
            batches_expired: expired.len(),
            forfeited_total,
            expired,
        })
    }

    /// Queues status transitions for the Active logs a certification batch
    /// covers. Historical imports have no covered logs.
    async fn push_log_transitions(
        &self,
        batch: &CreditBatch,
        status: LogStatus,
        ops: &mut Vec<WriteOp>,
    ) -> AppResult<()> {
        if batch.source_type != BatchSource::MonthlyCertificate {
            return Ok(());
        }
        let covered = self
            .logs
            .query_for_period_with_status(
                &batch.employee_id,
                &batch.earned_month,
                batch.earned_year,
                LogStatus::Active,
            )
            .await?;
        for log in covered {
            ops.push(WriteOp::update(
                collections::OVERTIME_LOGS,
                &log.log_id,
                OvertimeLog::status_patch(&log.log_id, status),
            ));
        }
        Ok(())
    }

    /// Point-in-time decomposition of an employee's standing.
    pub async fn balance(&self, employee_id: &str, as_of: NaiveDate) -> AppResult<BalanceSummary> {
        self.employees.require(employee_id).await?;
        let batches = self.batches.by_employee(employee_id).await?;
        let uncertified = self.logs.uncertified_total(employee_id).await?;

        let mut active = 0.0;
        let mut total_earned = 0.0;
        let mut used = 0.0;
        let mut expired = 0.0;
        for batch in &batches {
            total_earned += batch.original_hours;
            used += batch.used_hours;
            if batch.is_usable(as_of) {
                active += batch.remaining_hours;
            } else if batch.remaining_hours > 0.0 {
                // Swept batches and those past validity awaiting the sweep.
                expired += batch.remaining_hours;
            }
        }

        Ok(BalanceSummary {
            active: round_tenth(active),
            uncertified,
            total_earned: round_tenth(total_earned),
            used: round_tenth(used),
            expired: round_tenth(expired),
        })
    }

    /// Checks the balance-reconstruction invariant: active balance derived
    /// from batches must equal the signed ledger sum. Batches past validity
    /// but not yet swept are still Active and still carried by the ledger,
    /// so status alone decides the batch side.
    pub async fn verify_ledger(&self, employee_id: &str) -> AppResult<LedgerReconciliation> {
        let batches = self.batches.by_employee(employee_id).await?;
        let entries = self.ledger.by_employee(employee_id).await?;

        let batch_active = round_tenth(
            batches
                .iter()
                .filter(|batch| batch.status == BatchStatus::Active)
                .map(|batch| batch.remaining_hours)
                .sum(),
        );
        let ledger_active = round_tenth(entries.iter().map(|entry| entry.hours).sum());

        if (batch_active - ledger_active).abs() > HOURS_EPSILON {
            return Err(AppError::internal(format!(
                "ledger mismatch for {employee_id}: batches say {batch_active}, \
                 ledger says {ledger_active}"
            )));
        }
        Ok(LedgerReconciliation {
            batch_active,
            ledger_active,
        })
    }

    /// Creates the one historical-import batch a period may carry, locking
    /// that period against further writes.
    pub async fn import_historical(
        &self,
        input: HistoricalImportInput,
        actor: &str,
        now: DateTime<Utc>,
    ) -> AppResult<CreditBatch> {
        let month_index = month_number(&input.earned_month).ok_or_else(|| {
            AppError::BadDate(format!("{} is not an English month name", input.earned_month))
        })?;
        let earned_month = month_name(month_index)
            .unwrap_or(input.earned_month.as_str())
            .to_string();
        let input = HistoricalImportInput {
            earned_month,
            ..input
        };
        if input.hours <= 0.0 {
            return Err(AppError::PreconditionFailed(
                "historical import hours must be positive".into(),
            ));
        }
        let issuance = NaiveDate::parse_from_str(&input.date_of_issuance, "%Y-%m-%d")
            .map_err(|_| {
                AppError::BadDate(format!(
                    "{} is not an ISO-8601 date",
                    input.date_of_issuance
                ))
            })?;
        let valid_until = NaiveDate::parse_from_str(&input.valid_until, "%Y-%m-%d")
            .map_err(|_| {
                AppError::BadDate(format!("{} is not an ISO-8601 date", input.valid_until))
            })?;
        self.employees.require(&input.employee_id).await?;

        if self
            .batches
            .historical_for_period(&input.employee_id, &input.earned_month, input.earned_year)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "a historical import for {} {} already covers {}",
                input.earned_month, input.earned_year, input.employee_id
            )));
        }

        let hours = round_tenth(input.hours);
        let batch = CreditBatch {
            batch_id: Uuid::new_v4().to_string(),
            employee_id: input.employee_id.clone(),
            earned_month: input.earned_month.clone(),
            earned_year: input.earned_year,
            original_hours: hours,
            remaining_hours: hours,
            used_hours: 0.0,
            status: BatchStatus::Active,
            date_of_issuance: issuance,
            valid_until,
            source_type: BatchSource::HistoricalImport,
            source_certificate_id: None,
            notes: Some(
                input
                    .notes
                    .unwrap_or_else(|| "Historical balance import".to_string()),
            ),
        };
        let credit = LedgerEntry {
            transaction_id: self.ledger.next_transaction_id().await?,
            employee_id: input.employee_id.clone(),
            transaction_type: TransactionType::Credit,
            hours,
            batch_id: Some(batch.batch_id.clone()),
            reference_id: None,
            notes: format!(
                "Historical import for {} {}",
                input.earned_month, input.earned_year
            ),
            transaction_date: now,
            performed_by: actor.to_string(),
        };

        self.store
            .batch_write(vec![
                WriteOp::create(collections::CREDIT_BATCHES, batch.to_document()),
                WriteOp::create(collections::LEDGER, credit.to_document()),
            ])
            .await?;
        Ok(batch)
    }
}
