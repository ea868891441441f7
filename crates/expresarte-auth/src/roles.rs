//! The closed set of principal roles and their privilege ranks.

use std::fmt;
use std::str::FromStr;

use expresarte_core::AppError;
use serde::{Deserialize, Serialize};

/// Role held by a principal. Every principal holds exactly one.
///
/// Ranks are strictly ordered, lower meaning more privileged:
///
/// ```text
/// super_admin (1) > admin (2) > academic (3) > teacher (4) > student (5)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Academic,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Academic,
        Role::Teacher,
        Role::Student,
    ];

    pub const fn rank(self) -> u8 {
        match self {
            Role::SuperAdmin => 1,
            Role::Admin => 2,
            Role::Academic => 3,
            Role::Teacher => 4,
            Role::Student => 5,
        }
    }

    /// Strictly more privileged than `other`.
    pub const fn outranks(self, other: Role) -> bool {
        self.rank() < other.rank()
    }

    /// Same role or more privileged than `minimum`.
    pub const fn is_at_least(self, minimum: Role) -> bool {
        self.rank() <= minimum.rank()
    }

    /// Teacher or any role above it; the requirement for teaching an offering.
    pub const fn can_teach(self) -> bool {
        self.is_at_least(Role::Teacher)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Academic => "academic",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::validation(anyhow::anyhow!("Invalid role: {}", s)))
    }
}
