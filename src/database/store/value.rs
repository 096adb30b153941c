use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A field value in the document store.
///
/// Civil dates (no time-of-day meaning) travel as ISO-8601 date strings;
/// instants travel as [`Value::Timestamp`] and come back timezone-aware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn date(date: NaiveDate) -> Value {
        Value::Str(date.format("%Y-%m-%d").to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Ordering used by range filters. Numbers compare across Int/Float;
    /// strings lexicographically; timestamps chronologically. Mixed kinds
    /// do not compare.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
        }
    }

    /// Equality used by equality filters: Int and Float unify on value.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// One stored document: a closed map of field name to value plus its id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn missing(&self, collection: &str, field: &str) -> AppError {
        AppError::schema_drift(collection, &self.id, &format!("missing field {field}"))
    }

    fn wrong_type(&self, collection: &str, field: &str, expected: &str) -> AppError {
        AppError::schema_drift(
            collection,
            &self.id,
            &format!("field {field} is not a {expected}"),
        )
    }

    pub fn str(&self, collection: &str, field: &str) -> Result<String, AppError> {
        match self.get(field) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(_) => Err(self.wrong_type(collection, field, "string")),
            None => Err(self.missing(collection, field)),
        }
    }

    pub fn opt_str(&self, collection: &str, field: &str) -> Result<Option<String>, AppError> {
        match self.get(field) {
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(self.wrong_type(collection, field, "string")),
        }
    }

    pub fn int(&self, collection: &str, field: &str) -> Result<i64, AppError> {
        match self.get(field) {
            Some(Value::Int(n)) => Ok(*n),
            Some(_) => Err(self.wrong_type(collection, field, "integer")),
            None => Err(self.missing(collection, field)),
        }
    }

    pub fn float(&self, collection: &str, field: &str) -> Result<f64, AppError> {
        match self.get(field) {
            Some(Value::Float(n)) => Ok(*n),
            Some(Value::Int(n)) => Ok(*n as f64),
            Some(_) => Err(self.wrong_type(collection, field, "number")),
            None => Err(self.missing(collection, field)),
        }
    }

    pub fn timestamp(&self, collection: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
        match self.get(field) {
            Some(Value::Timestamp(t)) => Ok(*t),
            Some(_) => Err(self.wrong_type(collection, field, "timestamp")),
            None => Err(self.missing(collection, field)),
        }
    }

    pub fn civil_date(&self, collection: &str, field: &str) -> Result<NaiveDate, AppError> {
        let raw = self.str(collection, field)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            AppError::schema_drift(collection, &self.id, &format!("field {field} is not a date"))
        })
    }

    pub fn opt_civil_date(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Option<NaiveDate>, AppError> {
        match self.get(field) {
            Some(Value::Null) | None => Ok(None),
            _ => self.civil_date(collection, field).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(
            Value::Int(3).compare(&Value::Float(3.5)),
            Some(std::cmp::Ordering::Less)
        );
        assert!(Value::Int(4).loosely_equals(&Value::Float(4.0)));
    }

    #[test]
    fn mixed_kinds_do_not_compare() {
        assert_eq!(Value::Str("a".into()).compare(&Value::Int(1)), None);
    }

    #[test]
    fn civil_dates_round_trip_as_strings() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let doc = Document::new("d1").with("dateWorked", date);
        assert_eq!(doc.get("dateWorked"), Some(&Value::Str("2025-03-15".into())));
        assert_eq!(doc.civil_date("overtimeLogs", "dateWorked").unwrap(), date);
    }

    #[test]
    fn missing_required_field_is_schema_drift() {
        let doc = Document::new("d1");
        let err = doc.str("employees", "email").unwrap_err();
        assert_eq!(err.kind(), "Internal/SchemaDrift");
    }

    #[test]
    fn nullable_fields_read_back_as_none() {
        let doc = Document::new("d1").with("validUntil", Value::Null);
        assert_eq!(
            doc.opt_civil_date("overtimeLogs", "validUntil").unwrap(),
            None
        );
    }

    #[test]
    fn timestamps_stay_timezone_aware() {
        let instant = Utc.with_ymd_and_hms(2025, 4, 1, 8, 30, 0).unwrap();
        let doc = Document::new("d1").with("loggedAt", instant);
        assert_eq!(doc.timestamp("overtimeLogs", "loggedAt").unwrap(), instant);
    }
}
