pub mod enrollments;
pub mod grades;
pub mod offerings;
pub mod periods;
pub mod principals;
pub mod teacher_subjects;
