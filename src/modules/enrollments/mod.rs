//! Enrollment of students into offerings.
//!
//! Seat allocation is serialised per offering by row-locking the offering
//! (`SELECT ... FOR UPDATE`) before counting active enrollments. A partial
//! unique index on `(student_id, offering_id) WHERE status = 'active'` backs
//! the one-active-enrollment rule.

pub mod service;

pub use service::EnrollmentService;
