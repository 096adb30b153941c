pub mod certificate;
pub mod configuration;
pub mod credit_batch;
pub mod employee;
pub mod holiday;
pub mod ledger;
pub mod library;
pub mod overtime_log;

pub use certificate::CertificateRepository;
pub use configuration::ConfigurationRepository;
pub use credit_batch::CreditBatchRepository;
pub use employee::EmployeeRepository;
pub use holiday::HolidayRepository;
pub use ledger::LedgerRepository;
pub use library::LibraryRepository;
pub use overtime_log::OvertimeLogRepository;
