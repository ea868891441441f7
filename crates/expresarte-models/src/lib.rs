//! # Expresarte Models
//!
//! Entities as stored, typed identifiers and the DTOs the services accept.
//!
//! - [`ids`]: `Uuid` newtypes per entity
//! - [`principals`]: accounts of every role
//! - [`periods`], [`subjects`], [`offerings`], [`teacher_subjects`]: the academic catalog
//! - [`enrollments`]: enrollment records and the status lifecycle
//! - [`grades`]: the grading scale and grade records

pub mod enrollments;
pub mod grades;
pub mod ids;
pub mod offerings;
pub mod periods;
pub mod principals;
pub mod subjects;
pub mod teacher_subjects;

pub use ids::{AcademicPeriodId, EnrollmentId, GradeId, OfferingId, TeacherSubjectId, UserId};
