use crate::database::models::Certificate;
use crate::database::store::Value;
use crate::database::{collections, Store};
use crate::error::AppResult;

#[derive(Clone)]
pub struct CertificateRepository {
    store: Store,
}

impl CertificateRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, certificate: &Certificate) -> AppResult<()> {
        self.store
            .create(collections::CERTIFICATES, certificate.to_document())
            .await?;
        Ok(())
    }

    /// Compound equality on the (employeeId, year, month) index; the period
    /// lock check.
    pub async fn find_for_period(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
    ) -> AppResult<Option<Certificate>> {
        let docs = self
            .store
            .match_all(
                collections::CERTIFICATES,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("year", Value::from(year)),
                    ("month", Value::from(month)),
                ],
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(Some(Certificate::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn by_employee_year(
        &self,
        employee_id: &str,
        year: i32,
    ) -> AppResult<Vec<Certificate>> {
        let docs = self
            .store
            .match_all(
                collections::CERTIFICATES,
                &[
                    ("employeeId", Value::from(employee_id)),
                    ("year", Value::from(year)),
                ],
            )
            .await?;
        let mut certificates: Vec<Certificate> = docs
            .iter()
            .map(Certificate::from_document)
            .collect::<Result<_, _>>()?;
        certificates.sort_by_key(|certificate| certificate.date_of_issuance);
        Ok(certificates)
    }

    pub async fn by_employee(&self, employee_id: &str) -> AppResult<Vec<Certificate>> {
        let docs = self
            .store
            .match_all(
                collections::CERTIFICATES,
                &[("employeeId", Value::from(employee_id))],
            )
            .await?;
        docs.iter().map(Certificate::from_document).collect()
    }
}
