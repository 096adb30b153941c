use chrono::{DateTime, Utc};

use crate::database::models::{Employee, EmployeeInput, EmployeeStatus, EmployeeUpdate};
use crate::database::store::{Document, FilterOp, Value};
use crate::database::{collections, Store, SCAN_LIMIT};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct EmployeeRepository {
    store: Store,
}

impl EmployeeRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: EmployeeInput, now: DateTime<Utc>) -> AppResult<Employee> {
        let clashes = self
            .store
            .where_field(
                collections::EMPLOYEES,
                "email",
                FilterOp::Eq,
                Value::from(input.email.as_str()),
            )
            .await?;
        if !clashes.is_empty() {
            return Err(AppError::AlreadyExists(format!(
                "employee with email {} already exists",
                input.email
            )));
        }

        let employee = Employee {
            employee_id: input.employee_id,
            first_name: input.first_name,
            last_name: input.last_name,
            status: EmployeeStatus::Active,
            position: input.position,
            office: input.office,
            email: input.email,
            created_at: now,
            updated_at: now,
        };
        self.store
            .create(collections::EMPLOYEES, employee.to_document())
            .await?;
        Ok(employee)
    }

    pub async fn get(&self, employee_id: &str) -> AppResult<Option<Employee>> {
        match self.store.get(collections::EMPLOYEES, employee_id).await? {
            Some(doc) => Ok(Some(Employee::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn require(&self, employee_id: &str) -> AppResult<Employee> {
        self.get(employee_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("employee {employee_id} does not exist"))
        })
    }

    pub async fn get_all(&self) -> AppResult<Vec<Employee>> {
        let docs = self.store.get_many(collections::EMPLOYEES, SCAN_LIMIT).await?;
        docs.iter().map(Employee::from_document).collect()
    }

    pub async fn get_active(&self) -> AppResult<Vec<Employee>> {
        let docs = self
            .store
            .where_field(
                collections::EMPLOYEES,
                "status",
                FilterOp::Eq,
                Value::from(EmployeeStatus::Active.to_string()),
            )
            .await?;
        docs.iter().map(Employee::from_document).collect()
    }

    pub async fn update(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Employee> {
        self.require(employee_id).await?;

        let mut patch = Document::new(employee_id);
        if let Some(first_name) = update.first_name {
            patch.set("firstName", first_name);
        }
        if let Some(last_name) = update.last_name {
            patch.set("lastName", last_name);
        }
        if let Some(status) = update.status {
            patch.set("status", status.to_string());
        }
        if let Some(position) = update.position {
            patch.set("position", position);
        }
        if let Some(office) = update.office {
            patch.set("office", office);
        }
        if let Some(email) = update.email {
            patch.set("email", email);
        }
        patch.set("updatedAt", now);

        self.store
            .update(collections::EMPLOYEES, employee_id, patch)
            .await?;
        self.require(employee_id).await
    }

    /// Soft delete: the record stays, referenced rows stay valid.
    pub async fn soft_delete(&self, employee_id: &str, now: DateTime<Utc>) -> AppResult<Employee> {
        self.require(employee_id).await?;
        let patch = Document::new(employee_id)
            .with("status", EmployeeStatus::Inactive.to_string())
            .with("updatedAt", now);
        self.store
            .update(collections::EMPLOYEES, employee_id, patch)
            .await?;
        self.require(employee_id).await
    }
}
