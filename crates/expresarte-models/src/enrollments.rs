//! Enrollments and their lifecycle.
//!
//! ```text
//! pending ─┬─> active ─┬─> retired
//!          │           └─> approved
//!          ├─> rejected
//!          ├─> awaiting_confirmation
//!          ├─> awaiting_payment
//!          └─> cancelled
//! ```
//!
//! Every state not listed with outgoing edges is terminal. Only `active`
//! occupies a seat in the offering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use expresarte_core::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{AcademicPeriodId, EnrollmentId, OfferingId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Retired,
    Approved,
    Cancelled,
    Rejected,
    AwaitingConfirmation,
    AwaitingPayment,
    Inactive,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 9] = [
        EnrollmentStatus::Pending,
        EnrollmentStatus::Active,
        EnrollmentStatus::Retired,
        EnrollmentStatus::Approved,
        EnrollmentStatus::Cancelled,
        EnrollmentStatus::Rejected,
        EnrollmentStatus::AwaitingConfirmation,
        EnrollmentStatus::AwaitingPayment,
        EnrollmentStatus::Inactive,
    ];

    /// Statuses that still block a second request for the same offering.
    pub const OPEN: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Pending,
        EnrollmentStatus::AwaitingConfirmation,
        EnrollmentStatus::AwaitingPayment,
        EnrollmentStatus::Active,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Retired => "retired",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::AwaitingConfirmation => "awaiting_confirmation",
            EnrollmentStatus::AwaitingPayment => "awaiting_payment",
            EnrollmentStatus::Inactive => "inactive",
        }
    }

    pub fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;

        matches!(
            (self, next),
            (
                Pending,
                Active | Rejected | AwaitingConfirmation | AwaitingPayment | Cancelled
            ) | (Active, Retired | Approved)
        )
    }

    pub fn is_terminal(self) -> bool {
        !EnrollmentStatus::ALL
            .into_iter()
            .any(|next| self.can_transition_to(next))
    }

    pub fn is_open(self) -> bool {
        EnrollmentStatus::OPEN.contains(&self)
    }

    pub fn occupies_seat(self) -> bool {
        self == EnrollmentStatus::Active
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnrollmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::validation(anyhow::anyhow!("Invalid enrollment status: {}", s))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub offering_id: OfferingId,
    pub period_id: AcademicPeriodId,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
