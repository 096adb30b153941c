use crate::database::models::{BatchSource, BatchStatus, CreditBatch};
use crate::database::store::{FilterOp, Value};
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CreditBatchRepository {
    store: Store,
}

impl CreditBatchRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Never overwrites; a taken batch id is a hard conflict.
    pub async fn create(&self, batch: &CreditBatch) -> AppResult<()> {
        self.store
            .create(collections::CREDIT_BATCHES, batch.to_document())
            .await?;
        Ok(())
    }

    pub async fn get(&self, batch_id: &str) -> AppResult<Option<CreditBatch>> {
        match self.store.get(collections::CREDIT_BATCHES, batch_id).await? {
            Some(doc) => Ok(Some(CreditBatch::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, batch_id: &str) -> AppResult<CreditBatch> {
        self.get(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("credit batch {batch_id} does not exist")))
    }

    pub async fn by_employee(&self, employee_id: &str) -> AppResult<Vec<CreditBatch>> {
        let docs = self
            .store
            .where_field(
                collections::CREDIT_BATCHES,
                "employeeId",
                FilterOp::Eq,
                Value::from(employee_id),
            )
            .await?;
        let mut batches: Vec<CreditBatch> = docs
            .iter()
            .map(CreditBatch::from_document)
            .collect::<Result<_, _>>()?;
        batches.sort_by_key(|batch| batch.date_of_issuance);
        Ok(batches)
    }

    /// Active batches in FIFO debit order: earliest expiry first, then
    /// earliest issuance.
    pub async fn active_by_employee(&self, employee_id: &str) -> AppResult<Vec<CreditBatch>> {
        let docs = self
            .store
            .match_all(
                collections::CREDIT_BATCHES,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("status", Value::from(BatchStatus::Active.to_string())),
                ],
            )
            .await?;
        let mut batches: Vec<CreditBatch> = docs
            .iter()
            .map(CreditBatch::from_document)
            .collect::<Result<_, _>>()?;
        batches.sort_by(|a, b| {
            a.valid_until
                .cmp(&b.valid_until)
                .then(a.date_of_issuance.cmp(&b.date_of_issuance))
        });
        Ok(batches)
    }

    /// The certification batch for a period, if its write already landed.
    /// The recovery scan uses this to avoid double-creating.
    pub async fn certificate_batch_for_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<Option<CreditBatch>> {
        let docs = self
            .store
            .match_all(
                collections::CREDIT_BATCHES,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("earnedMonth", Value::from(month)),
                    ("earnedYear", Value::from(year)),
                    (
                        "sourceType",
                        Value::from(BatchSource::MonthlyCertificate.to_string()),
                    ),
                ],
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(Some(CreditBatch::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn historical_for_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<Option<CreditBatch>> {
        let docs = self
            .store
            .match_all(
                collections::CREDIT_BATCHES,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("earnedMonth", Value::from(month)),
                    ("earnedYear", Value::from(year)),
                    (
                        "sourceType",
                        Value::from(BatchSource::HistoricalImport.to_string()),
                    ),
                ],
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(Some(CreditBatch::from_document(doc)?)),
            None => Ok(None),
        }
    }
}
