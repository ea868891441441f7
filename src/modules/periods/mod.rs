//! Academic periods.

pub mod service;

pub use service::PeriodService;
