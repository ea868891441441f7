//! Offerings: one subject taught to one group within one period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::ids::{AcademicPeriodId, OfferingId, UserId};
use crate::subjects::Subject;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Offering {
    pub id: OfferingId,
    pub subject: Subject,
    pub period_id: AcademicPeriodId,
    pub group_label: String,
    pub teacher_id: Option<UserId>,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOfferingDto {
    pub subject: Subject,
    pub period_id: AcademicPeriodId,
    #[validate(length(min = 1, max = 10, message = "group label must be 1-10 characters"))]
    pub group_label: String,
    pub teacher_id: Option<UserId>,
    /// Falls back to the configured default when absent.
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
}

/// An offering together with how many seats are taken.
#[derive(Debug, Clone, Serialize)]
pub struct OfferingOccupancy {
    #[serde(flatten)]
    pub offering: Offering,
    pub active_enrollments: i64,
}

impl OfferingOccupancy {
    pub fn seats_left(&self) -> i64 {
        (i64::from(self.offering.capacity) - self.active_enrollments).max(0)
    }
}
