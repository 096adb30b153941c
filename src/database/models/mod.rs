pub(crate) mod macros;

pub mod certificate;
pub mod configuration;
pub mod credit_batch;
pub mod employee;
pub mod holiday;
pub mod ledger;
pub mod library;
pub mod overtime_log;

pub use certificate::{Certificate, CertifyInput, CertifyResult};
pub use configuration::{ConfigEntry, ConfigUpdateInput, Settings};
pub use credit_batch::{BatchSource, BatchStatus, CreditBatch, HistoricalImportInput};
pub use employee::{Employee, EmployeeInput, EmployeeStatus, EmployeeUpdate};
pub use holiday::{Holiday, HolidayInput, HolidayType};
pub use ledger::{
    BalanceSummary, DebitAllocation, DebitInput, LedgerEntry, TransactionType,
};
pub use library::{LibraryList, LibraryUpdateInput};
pub use overtime_log::{
    DayType, LogOvertimeInput, LogOvertimeResult, LogStatus, OvertimeEntryInput, OvertimeLog,
    OvertimeLogUpdate,
};
