//! Date classification against the configured weekend set and the holiday
//! registry, plus the month-name and validity-window helpers the write and
//! certification paths share.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::database::models::DayType;
use crate::error::{AppError, AppResult};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    (month as usize)
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index))
        .copied()
}

pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(|index| index as u32 + 1)
}

/// Today's civil date in the configured zone. All date comparisons use this,
/// never the UTC day.
pub fn civil_today(now: DateTime<Utc>, zone: Tz) -> NaiveDate {
    now.with_timezone(&zone).date_naive()
}

/// End of a certificate's validity: issuance + `months` − 1 day.
pub fn validity_end(issuance: NaiveDate, months: u32) -> AppResult<NaiveDate> {
    issuance
        .checked_add_months(Months::new(months))
        .and_then(|date| date.pred_opt())
        .ok_or_else(|| {
            AppError::internal(format!(
                "validity window overflows for issuance {issuance} + {months} months"
            ))
        })
}

/// Per-request calendar built from the prefetched holiday and weekend sets.
/// Constructed fresh on every write request and discarded afterwards.
#[derive(Debug, Clone)]
pub struct Calendar {
    weekend_days: BTreeSet<u8>,
    holidays: HashSet<NaiveDate>,
}

impl Calendar {
    pub fn new(weekend_days: BTreeSet<u8>, holidays: HashSet<NaiveDate>) -> Self {
        Calendar {
            weekend_days,
            holidays,
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn weekend_days(&self) -> &BTreeSet<u8> {
        &self.weekend_days
    }

    /// Holiday wins over weekend: a holiday falling on a configured weekend
    /// day classifies as Holiday, which selects the same rate but is
    /// observable in the stored day type.
    pub fn day_type(&self, date: NaiveDate) -> DayType {
        if self.is_holiday(date) {
            return DayType::Holiday;
        }
        let day_index = date.weekday().num_days_from_sunday() as u8;
        if self.weekend_days.contains(&day_index) {
            DayType::Weekend
        } else {
            DayType::Weekday
        }
    }
}
