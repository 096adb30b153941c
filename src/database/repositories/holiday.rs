use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::models::{Holiday, HolidayInput};
use crate::database::store::{FilterOp, Value};
use crate::database::{collections, Store};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct HolidayRepository {
    store: Store,
}

impl HolidayRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: HolidayInput) -> AppResult<Holiday> {
        let date = NaiveDate::parse_from_str(&input.date, "%Y-%m-%d")
            .map_err(|_| AppError::BadDate(format!("{} is not an ISO-8601 date", input.date)))?;

        // Holidays are unique by date.
        let clashes = self
            .store
            .where_field(
                collections::HOLIDAYS,
                "date",
                FilterOp::Eq,
                Value::from(date),
            )
            .await?;
        if !clashes.is_empty() {
            return Err(AppError::AlreadyExists(format!(
                "a holiday on {date} already exists"
            )));
        }

        let holiday = Holiday::new(
            Uuid::new_v4().to_string(),
            input.name,
            date,
            input.holiday_type,
        );
        self.store
            .create(collections::HOLIDAYS, holiday.to_document())
            .await?;
        Ok(holiday)
    }

    /// Equality query on the year index; feeds the per-request holiday set.
    pub async fn by_year(&self, year: i32) -> AppResult<Vec<Holiday>> {
        let docs = self
            .store
            .where_field(
                collections::HOLIDAYS,
                "year",
                FilterOp::Eq,
                Value::from(year),
            )
            .await?;
        let mut holidays: Vec<Holiday> = docs
            .iter()
            .map(Holiday::from_document)
            .collect::<Result<_, _>>()?;
        holidays.sort_by_key(|holiday| holiday.date);
        Ok(holidays)
    }

    pub async fn dates_for_year(&self, year: i32) -> AppResult<std::collections::HashSet<NaiveDate>> {
        Ok(self
            .by_year(year)
            .await?
            .into_iter()
            .map(|holiday| holiday.date)
            .collect())
    }

    pub async fn delete(&self, holiday_id: &str) -> AppResult<()> {
        self.store.delete(collections::HOLIDAYS, holiday_id).await?;
        Ok(())
    }
}
