use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{TeacherSubjectId, UserId};
use crate::subjects::Subject;

/// A teacher's qualification to teach a subject.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherSubject {
    pub id: TeacherSubjectId,
    pub teacher_id: UserId,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
}
