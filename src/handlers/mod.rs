pub mod admin;
pub mod certification;
pub mod credits;
pub mod employees;
pub mod holidays;
pub mod overtime;
pub mod reports;
pub mod shared;
