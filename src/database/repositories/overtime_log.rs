use crate::database::models::{LogStatus, OvertimeLog};
use crate::database::store::{Document, FilterOp, Value, WriteOp};
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};
use crate::services::accrual::round_tenth;

#[derive(Clone)]
pub struct OvertimeLogRepository {
    store: Store,
}

impl OvertimeLogRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Fresh log id, strictly greater than any existing one. Store-side, so
    /// concurrent writers never collide.
    pub async fn next_log_id(&self) -> AppResult<String> {
        let id = self
            .store
            .next_id(collections::OVERTIME_LOGS, "logId")
            .await?;
        Ok(id.to_string())
    }

    /// Atomic insert of a whole accepted batch.
    pub async fn create_many(&self, logs: &[OvertimeLog]) -> AppResult<()> {
        let ops = logs
            .iter()
            .map(|log| WriteOp::create(collections::OVERTIME_LOGS, log.to_document()))
            .collect();
        self.store.batch_write(ops).await?;
        Ok(())
    }

    pub async fn get(&self, log_id: &str) -> AppResult<Option<OvertimeLog>> {
        match self.store.get(collections::OVERTIME_LOGS, log_id).await? {
            Some(doc) => Ok(Some(OvertimeLog::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, log_id: &str) -> AppResult<OvertimeLog> {
        self.get(log_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("overtime log {log_id} does not exist")))
    }

    pub async fn update(&self, log_id: &str, patch: Document) -> AppResult<()> {
        self.store
            .update(collections::OVERTIME_LOGS, log_id, patch)
            .await?;
        Ok(())
    }

    /// Uncertified logs may be removed; anything later is part of a
    /// certificate and immutable.
    pub async fn delete(&self, log_id: &str) -> AppResult<OvertimeLog> {
        let log = self.require(log_id).await?;
        if log.status != LogStatus::Uncertified {
            return Err(AppError::PreconditionFailed(format!(
                "overtime log {log_id} is {} and cannot be deleted",
                log.status
            )));
        }
        self.store.delete(collections::OVERTIME_LOGS, log_id).await?;
        Ok(log)
    }

    pub async fn query_by_employee(&self, employee_id: &str) -> AppResult<Vec<OvertimeLog>> {
        let docs = self
            .store
            .where_field(
                collections::OVERTIME_LOGS,
                "employeeId",
                FilterOp::Eq,
                Value::from(employee_id),
            )
            .await?;
        let mut logs: Vec<OvertimeLog> = docs
            .iter()
            .map(OvertimeLog::from_document)
            .collect::<Result<_, _>>()?;
        logs.sort_by(|a, b| b.date_worked.cmp(&a.date_worked));
        Ok(logs)
    }

    /// Equality query on the (employeeId, month, year) index.
    pub async fn query_by_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<Vec<OvertimeLog>> {
        let docs = self
            .store
            .match_all(
                collections::OVERTIME_LOGS,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("month", Value::from(month)),
                    ("year", Value::from(year)),
                ],
            )
            .await?;
        let mut logs: Vec<OvertimeLog> = docs
            .iter()
            .map(OvertimeLog::from_document)
            .collect::<Result<_, _>>()?;
        logs.sort_by_key(|log| log.date_worked);
        Ok(logs)
    }

    pub async fn query_by_status(&self, status: LogStatus) -> AppResult<Vec<OvertimeLog>> {
        let docs = self
            .store
            .where_field(
                collections::OVERTIME_LOGS,
                "status",
                FilterOp::Eq,
                Value::from(status.to_string()),
            )
            .await?;
        let mut logs: Vec<OvertimeLog> = docs
            .iter()
            .map(OvertimeLog::from_document)
            .collect::<Result<_, _>>()?;
        logs.sort_by_key(|log| log.date_worked);
        Ok(logs)
    }

    pub async fn query_for_period_with_status(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
        status: LogStatus,
    ) -> AppResult<Vec<OvertimeLog>> {
        let docs = self
            .store
            .match_all(
                collections::OVERTIME_LOGS,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("month", Value::from(month)),
                    ("year", Value::from(year)),
                    ("status", Value::from(status.to_string())),
                ],
            )
            .await?;
        let mut logs: Vec<OvertimeLog> = docs
            .iter()
            .map(OvertimeLog::from_document)
            .collect::<Result<_, _>>()?;
        logs.sort_by_key(|log| log.date_worked);
        Ok(logs)
    }

    pub async fn query_uncertified_for_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<Vec<OvertimeLog>> {
        self.query_for_period_with_status(employee_id, month, year, LogStatus::Uncertified)
            .await
    }

    pub async fn query_uncertified_month_total(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<f64> {
        let logs = self
            .query_uncertified_for_period(employee_id, month, year)
            .await?;
        Ok(round_tenth(logs.iter().map(|log| log.coc_earned).sum()))
    }

    /// Credit-hours already accrued for the period across all non-terminal
    /// logs; the figure the monthly cap gates on.
    pub async fn month_total_non_terminal(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<f64> {
        let logs = self.query_by_period(employee_id, month, year).await?;
        Ok(round_tenth(
            logs.iter()
                .filter(|log| !log.status.is_terminal())
                .map(|log| log.coc_earned)
                .sum(),
        ))
    }

    /// Uncertified hours across all periods; counts against the total cap.
    pub async fn uncertified_total(&self, employee_id: &str) -> AppResult<f64> {
        let docs = self
            .store
            .match_all(
                collections::OVERTIME_LOGS,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("status", Value::from(LogStatus::Uncertified.to_string())),
                ],
            )
            .await?;
        let logs: Vec<OvertimeLog> = docs
            .iter()
            .map(OvertimeLog::from_document)
            .collect::<Result<_, _>>()?;
        Ok(round_tenth(logs.iter().map(|log| log.coc_earned).sum()))
    }

    /// Logs written under one correlation id; the recovery hook for
    /// partially-applied batches.
    pub async fn find_by_correlation(&self, correlation_id: &str) -> AppResult<Vec<OvertimeLog>> {
        let docs = self
            .store
            .where_field(
                collections::OVERTIME_LOGS,
                "correlationId",
                FilterOp::Eq,
                Value::from(correlation_id),
            )
            .await?;
        docs.iter().map(OvertimeLog::from_document).collect()
    }

    pub async fn delete_by_correlation(&self, correlation_id: &str) -> AppResult<usize> {
        let logs = self.find_by_correlation(correlation_id).await?;
        let ids: Vec<String> = logs.iter().map(|log| log.log_id.clone()).collect();
        if !ids.is_empty() {
            self.store
                .delete_many(collections::OVERTIME_LOGS, &ids)
                .await?;
        }
        Ok(ids.len())
    }
}
