pub mod accrual;
pub mod actor;
pub mod calendar;
pub mod certification;
pub mod credits;
pub mod locks;
pub mod overtime;
pub mod reports;

pub use actor::Actor;
pub use calendar::Calendar;
pub use certification::CertificationService;
pub use credits::CreditService;
pub use locks::LockService;
pub use overtime::OvertimeService;
pub use reports::ReportService;
