use crate::database::models::LedgerEntry;
use crate::database::store::{FilterOp, Value};
use crate::database::{collections, Store};
use crate::error::AppResult;

#[derive(Clone)]
pub struct LedgerRepository {
    store: Store,
}

impl LedgerRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Monotonic transaction id; with `transactionDate` it totally orders an
    /// employee's ledger.
    pub async fn next_transaction_id(&self) -> AppResult<String> {
        let id = self.store.next_id(collections::LEDGER, "transactionId").await?;
        Ok(id.to_string())
    }

    /// Append-only: entries are only ever created.
    pub async fn append(&self, entry: &LedgerEntry) -> AppResult<()> {
        self.store
            .create(collections::LEDGER, entry.to_document())
            .await?;
        Ok(())
    }

    pub async fn by_employee(&self, employee_id: &str) -> AppResult<Vec<LedgerEntry>> {
        let docs = self
            .store
            .where_field(
                collections::LEDGER,
                "employeeId",
                FilterOp::Eq,
                Value::from(employee_id),
            )
            .await?;
        let mut entries: Vec<LedgerEntry> = docs
            .iter()
            .map(LedgerEntry::from_document)
            .collect::<Result<_, _>>()?;
        entries.sort_by(|a, b| {
            a.transaction_date.cmp(&b.transaction_date).then_with(|| {
                let a_id = a.transaction_id.parse::<i64>().unwrap_or(0);
                let b_id = b.transaction_id.parse::<i64>().unwrap_or(0);
                a_id.cmp(&b_id)
            })
        });
        Ok(entries)
    }

    pub async fn by_batch(&self, employee_id: &str, batch_id: &str) -> AppResult<Vec<LedgerEntry>> {
        let docs = self
            .store
            .match_all(
                collections::LEDGER,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("batchId", Value::from(batch_id)),
                ],
            )
            .await?;
        docs.iter().map(LedgerEntry::from_document).collect()
    }
}
