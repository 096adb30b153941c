#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use coc_engine::database::models::{
    EmployeeInput, HistoricalImportInput, HolidayInput, HolidayType, LogOvertimeInput,
    OvertimeEntryInput,
};
use coc_engine::database::Store;
use coc_engine::AppContext;

/// Fresh engine over an in-memory store, plus a fixed clock.
pub struct TestApp {
    pub ctx: AppContext,
}

/// 2025-04-10 10:00 in Manila (02:00 UTC); after March 2025, so March
/// periods can be certified with an April issuance.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 2, 0, 0).unwrap()
}

impl TestApp {
    pub async fn new() -> Self {
        let ctx = AppContext::new(Store::in_memory());
        TestApp { ctx }
    }

    pub async fn with_employee(employee_id: &str) -> Self {
        let app = TestApp::new().await;
        app.seed_employee(employee_id).await;
        app
    }

    pub async fn seed_employee(&self, employee_id: &str) {
        self.ctx
            .employees
            .create(MockData::employee(employee_id), fixed_now())
            .await
            .expect("seed employee");
    }

    pub async fn seed_holiday(&self, date: &str, name: &str) {
        self.ctx
            .holidays
            .create(HolidayInput {
                name: name.to_string(),
                date: date.to_string(),
                holiday_type: HolidayType::Regular,
            })
            .await
            .expect("seed holiday");
    }

    pub async fn import_batch(
        &self,
        employee_id: &str,
        month: &str,
        year: i32,
        hours: f64,
        valid_until: &str,
    ) -> String {
        self.ctx
            .credits
            .import_historical(
                HistoricalImportInput {
                    employee_id: employee_id.to_string(),
                    earned_month: month.to_string(),
                    earned_year: year,
                    hours,
                    date_of_issuance: "2025-01-01".to_string(),
                    valid_until: valid_until.to_string(),
                    notes: None,
                },
                "seeder",
                fixed_now(),
            )
            .await
            .expect("seed historical batch")
            .batch_id
    }
}

pub struct MockData;

impl MockData {
    pub fn employee(employee_id: &str) -> EmployeeInput {
        EmployeeInput {
            employee_id: employee_id.to_string(),
            first_name: "Maria".to_string(),
            last_name: format!("Santos-{employee_id}"),
            position: "Administrative Officer II".to_string(),
            office: "Records Division".to_string(),
            email: format!("{}@agency.gov.ph", employee_id.to_lowercase()),
        }
    }

    /// A full weekend/holiday day: 8–12 and 1–5, worth 12.0 on a rest day.
    pub fn full_rest_day(date: &str) -> OvertimeEntryInput {
        OvertimeEntryInput {
            date: date.to_string(),
            am_in: Some("8:00 AM".to_string()),
            am_out: Some("12:00 PM".to_string()),
            pm_in: Some("1:00 PM".to_string()),
            pm_out: Some("5:00 PM".to_string()),
        }
    }

    /// A weekday evening reaching the full 17:00–19:00 window, worth 2.0.
    pub fn full_weekday_evening(date: &str) -> OvertimeEntryInput {
        OvertimeEntryInput {
            date: date.to_string(),
            am_in: None,
            am_out: None,
            pm_in: Some("1:00 PM".to_string()),
            pm_out: Some("7:00 PM".to_string()),
        }
    }

    pub fn entry(
        date: &str,
        am: Option<(&str, &str)>,
        pm: Option<(&str, &str)>,
    ) -> OvertimeEntryInput {
        OvertimeEntryInput {
            date: date.to_string(),
            am_in: am.map(|(i, _)| i.to_string()),
            am_out: am.map(|(_, o)| o.to_string()),
            pm_in: pm.map(|(i, _)| i.to_string()),
            pm_out: pm.map(|(_, o)| o.to_string()),
        }
    }

    pub fn batch(
        employee_id: &str,
        month: &str,
        year: i32,
        entries: Vec<OvertimeEntryInput>,
    ) -> LogOvertimeInput {
        LogOvertimeInput {
            employee_id: employee_id.to_string(),
            month: month.to_string(),
            year,
            entries,
            correlation_id: None,
        }
    }
}
