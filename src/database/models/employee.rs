use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum EmployeeStatus {
        Active => "Active",
        Inactive => "Inactive",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: EmployeeStatus,
    pub position: String,
    pub office: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.employee_id.clone())
            .with("employeeId", self.employee_id.as_str())
            .with("firstName", self.first_name.as_str())
            .with("lastName", self.last_name.as_str())
            .with("status", self.status.to_string())
            .with("position", self.position.as_str())
            .with("office", self.office.as_str())
            .with("email", self.email.as_str())
            .with("createdAt", self.created_at)
            .with("updatedAt", self.updated_at)
    }

    pub fn from_document(doc: &Document) -> Result<Employee, AppError> {
        const C: &str = collections::EMPLOYEES;
        Ok(Employee {
            employee_id: doc.str(C, "employeeId")?,
            first_name: doc.str(C, "firstName")?,
            last_name: doc.str(C, "lastName")?,
            status: doc
                .str(C, "status")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
            position: doc.str(C, "position")?,
            office: doc.str(C, "office")?,
            email: doc.str(C, "email")?,
            created_at: doc.timestamp(C, "createdAt")?,
            updated_at: doc.timestamp(C, "updatedAt")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub office: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub position: Option<String>,
    pub office: Option<String>,
    pub email: Option<String>,
}
