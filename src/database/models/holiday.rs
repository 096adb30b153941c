use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::Document;
use crate::error::AppError;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum HolidayType {
        Regular => "Regular",
        Special => "Special",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub holiday_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub year: i32,
    pub holiday_type: HolidayType,
}

impl Holiday {
    pub fn new(holiday_id: String, name: String, date: NaiveDate, holiday_type: HolidayType) -> Self {
        Holiday {
            holiday_id,
            name,
            year: date.year(),
            date,
            holiday_type,
        }
    }

    pub fn to_document(&self) -> Document {
        Document::new(self.holiday_id.clone())
            .with("holidayId", self.holiday_id.as_str())
            .with("name", self.name.as_str())
            .with("date", self.date)
            .with("year", self.year)
            .with("type", self.holiday_type.to_string())
    }

    pub fn from_document(doc: &Document) -> Result<Holiday, AppError> {
        const C: &str = collections::HOLIDAYS;
        Ok(Holiday {
            holiday_id: doc.str(C, "holidayId")?,
            name: doc.str(C, "name")?,
            date: doc.civil_date(C, "date")?,
            year: doc.int(C, "year")? as i32,
            holiday_type: doc
                .str(C, "type")?
                .parse()
                .map_err(|e: String| AppError::schema_drift(C, &doc.id, &e))?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayInput {
    pub name: String,
    pub date: String,
    #[serde(rename = "type")]
    pub holiday_type: HolidayType,
}
