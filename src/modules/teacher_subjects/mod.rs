//! Which subjects each teacher is qualified to teach.

pub mod service;

pub use service::TeacherSubjectService;
