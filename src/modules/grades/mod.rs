//! Grade recording. One grade per student per offering.

pub mod service;

pub use service::GradeService;
