//! Grades. A student gets at most one grade per offering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use expresarte_core::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::ids::{AcademicPeriodId, GradeId, OfferingId, UserId};

/// Qualitative grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "grade_value")]
pub enum GradeValue {
    #[serde(rename = "en_proceso")]
    #[sqlx(rename = "en_proceso")]
    InProgress,
    #[serde(rename = "avanzado")]
    #[sqlx(rename = "avanzado")]
    Advanced,
    #[serde(rename = "consolidado")]
    #[sqlx(rename = "consolidado")]
    Consolidated,
}

impl GradeValue {
    pub const ALL: [GradeValue; 3] = [
        GradeValue::InProgress,
        GradeValue::Advanced,
        GradeValue::Consolidated,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            GradeValue::InProgress => "en_proceso",
            GradeValue::Advanced => "avanzado",
            GradeValue::Consolidated => "consolidado",
        }
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeValue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeValue::ALL
            .into_iter()
            .find(|value| value.as_str() == s)
            .ok_or_else(|| AppError::validation(anyhow::anyhow!("Invalid grade value: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: UserId,
    pub offering_id: OfferingId,
    pub period_id: AcademicPeriodId,
    pub value: GradeValue,
    pub notes: Option<String>,
    pub graded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordGradeDto {
    pub student_id: UserId,
    pub offering_id: OfferingId,
    pub value: GradeValue,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Partial edit. `graded_at` is refreshed even when both fields are absent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditGradeDto {
    pub value: Option<GradeValue>,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}
