//! Permission catalog.
//!
//! Permissions are atomic capability tags checked by [`crate::AccessPolicy`].
//! They are compiled in and never stored as mutable data.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // =========================================================================
    // Users
    // =========================================================================
    CreateUsers,
    EditUsers,
    /// Deactivation; principals are never hard-deleted.
    DeleteUsers,
    ViewUsers,

    // =========================================================================
    // Courses (offerings and teacher qualifications)
    // =========================================================================
    CreateCourses,
    EditCourses,
    DeleteCourses,
    ViewCourses,

    // =========================================================================
    // Songs / repertoire
    // =========================================================================
    CreateSongs,
    EditSongs,
    DeleteSongs,
    AssignSongs,
    ViewSongs,

    // =========================================================================
    // Grading
    // =========================================================================
    EditGrades,
    ViewGrades,

    // =========================================================================
    // Administration
    // =========================================================================
    ManageAcademicPeriods,
    GenerateReports,

    // =========================================================================
    // Enrollment
    // =========================================================================
    /// Enroll a student into an offering.
    EnrollInCourses,
    /// Change enrollment status or remove an enrollment.
    ManageEnrollments,
}

impl Permission {
    pub const ALL: [Permission; 19] = [
        Permission::CreateUsers,
        Permission::EditUsers,
        Permission::DeleteUsers,
        Permission::ViewUsers,
        Permission::CreateCourses,
        Permission::EditCourses,
        Permission::DeleteCourses,
        Permission::ViewCourses,
        Permission::CreateSongs,
        Permission::EditSongs,
        Permission::DeleteSongs,
        Permission::AssignSongs,
        Permission::ViewSongs,
        Permission::EditGrades,
        Permission::ViewGrades,
        Permission::ManageAcademicPeriods,
        Permission::GenerateReports,
        Permission::EnrollInCourses,
        Permission::ManageEnrollments,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::CreateUsers => "CREATE_USERS",
            Permission::EditUsers => "EDIT_USERS",
            Permission::DeleteUsers => "DELETE_USERS",
            Permission::ViewUsers => "VIEW_USERS",
            Permission::CreateCourses => "CREATE_COURSES",
            Permission::EditCourses => "EDIT_COURSES",
            Permission::DeleteCourses => "DELETE_COURSES",
            Permission::ViewCourses => "VIEW_COURSES",
            Permission::CreateSongs => "CREATE_SONGS",
            Permission::EditSongs => "EDIT_SONGS",
            Permission::DeleteSongs => "DELETE_SONGS",
            Permission::AssignSongs => "ASSIGN_SONGS",
            Permission::ViewSongs => "VIEW_SONGS",
            Permission::EditGrades => "EDIT_GRADES",
            Permission::ViewGrades => "VIEW_GRADES",
            Permission::ManageAcademicPeriods => "MANAGE_ACADEMIC_PERIODS",
            Permission::GenerateReports => "GENERATE_REPORTS",
            Permission::EnrollInCourses => "ENROLL_IN_COURSES",
            Permission::ManageEnrollments => "MANAGE_ENROLLMENTS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
