pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

use actix_web::web;

use database::repositories::{
    CertificateRepository, ConfigurationRepository, CreditBatchRepository, EmployeeRepository,
    HolidayRepository, LedgerRepository, LibraryRepository, OvertimeLogRepository,
};
use database::Store;
use services::{
    CertificationService, CreditService, LockService, OvertimeService, ReportService,
};

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};

/// Everything the request layer needs, wired over one store handle. Tests
/// build this over a fresh in-memory store.
#[derive(Clone)]
pub struct AppContext {
    pub store: Store,
    pub employees: EmployeeRepository,
    pub logs: OvertimeLogRepository,
    pub batches: CreditBatchRepository,
    pub certificates: CertificateRepository,
    pub ledger: LedgerRepository,
    pub holidays: HolidayRepository,
    pub configuration: ConfigurationRepository,
    pub libraries: LibraryRepository,
    pub overtime: OvertimeService,
    pub certification: CertificationService,
    pub credits: CreditService,
    pub reports: ReportService,
}

impl AppContext {
    pub fn new(store: Store) -> Self {
        let employees = EmployeeRepository::new(store.clone());
        let logs = OvertimeLogRepository::new(store.clone());
        let batches = CreditBatchRepository::new(store.clone());
        let certificates = CertificateRepository::new(store.clone());
        let ledger = LedgerRepository::new(store.clone());
        let holidays = HolidayRepository::new(store.clone());
        let configuration = ConfigurationRepository::new(store.clone());
        let libraries = LibraryRepository::new(store.clone());
        let locks = LockService::new(store.clone());

        let overtime = OvertimeService::new(
            logs.clone(),
            employees.clone(),
            batches.clone(),
            certificates.clone(),
            holidays.clone(),
            configuration.clone(),
        );
        let certification = CertificationService::new(
            store.clone(),
            logs.clone(),
            employees.clone(),
            batches.clone(),
            certificates.clone(),
            ledger.clone(),
            configuration.clone(),
            locks.clone(),
        );
        let credits = CreditService::new(
            store.clone(),
            batches.clone(),
            ledger.clone(),
            logs.clone(),
            employees.clone(),
            configuration.clone(),
            locks,
        );
        let reports = ReportService::new(
            logs.clone(),
            batches.clone(),
            certificates.clone(),
            employees.clone(),
            ledger.clone(),
            configuration.clone(),
        );

        AppContext {
            store,
            employees,
            logs,
            batches,
            certificates,
            ledger,
            holidays,
            configuration,
            libraries,
            overtime,
            certification,
            credits,
            reports,
        }
    }

    /// Registers every repository and service as actix app data.
    pub fn configure_data(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.employees.clone()))
            .app_data(web::Data::new(self.logs.clone()))
            .app_data(web::Data::new(self.batches.clone()))
            .app_data(web::Data::new(self.certificates.clone()))
            .app_data(web::Data::new(self.ledger.clone()))
            .app_data(web::Data::new(self.holidays.clone()))
            .app_data(web::Data::new(self.configuration.clone()))
            .app_data(web::Data::new(self.libraries.clone()))
            .app_data(web::Data::new(self.overtime.clone()))
            .app_data(web::Data::new(self.certification.clone()))
            .app_data(web::Data::new(self.credits.clone()))
            .app_data(web::Data::new(self.reports.clone()));
    }
}
