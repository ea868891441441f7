//! Academic periods (terms). A period owns its offerings.

use chrono::{DateTime, NaiveDate, Utc};
use expresarte_core::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::ids::AcademicPeriodId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AcademicPeriod {
    pub id: AcademicPeriodId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePeriodDto {
    #[validate(length(min = 1, max = 50, message = "period name must be 1-50 characters"))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePeriodDto {
    #[validate(length(min = 1, max = 50, message = "period name must be 1-50 characters"))]
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A period must start strictly before it ends.
pub fn ensure_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::validation(anyhow::anyhow!(
            "Start date ({}) must be before end date ({})",
            start,
            end
        )));
    }
    Ok(())
}
