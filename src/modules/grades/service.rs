use std::sync::Arc;

use anyhow::anyhow;
use expresarte_auth::{AccessPolicy, Actor, Permission, Role};
use expresarte_core::AppError;
use expresarte_db::{Database, PgConnection, conflict_on_unique};
use expresarte_models::GradeId;
use expresarte_models::grades::{EditGradeDto, Grade, RecordGradeDto};
use expresarte_models::offerings::Offering;
use tracing::{info, instrument};

use crate::access::guard;
use crate::modules::enrollments::service::find_active_in;
use crate::modules::offerings::service::find_offering_in;
use crate::modules::principals::service::require_principal_in;
use crate::validation::validate_dto;

async fn find_grade_in(conn: &mut PgConnection, id: GradeId) -> Result<Grade, AppError> {
    sqlx::query_as::<_, Grade>(
        r#"SELECT id, student_id, offering_id, period_id, value, notes, graded_at
           FROM grades
           WHERE id = $1
           FOR UPDATE"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Grade {} not found", id)))
}

/// Teachers grade only the offerings they teach; higher roles grade any.
fn ensure_grader(actor: &Actor, offering: &Offering) -> Result<(), AppError> {
    let teaches = offering.teacher_id.is_some_and(|id| actor.is(id.as_uuid()));
    if actor.role == Role::Teacher && !teaches {
        return Err(AppError::forbidden(anyhow!(
            "Teachers can only grade offerings assigned to them"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct GradeService {
    db: Database,
    policy: Arc<AccessPolicy>,
}

impl GradeService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>) -> Self {
        Self { db, policy }
    }

    /// Record a student's grade for an offering.
    ///
    /// Validates that:
    /// - the offering exists and the actor may grade it
    /// - the student is a student with an active enrollment in it
    /// - no grade exists yet for the pair
    #[instrument(skip(self, actor, dto), fields(student_id = %dto.student_id, offering_id = %dto.offering_id))]
    pub async fn record_grade(&self, actor: Option<&Actor>, dto: RecordGradeDto) -> Result<Grade, AppError> {
        let actor = guard(&self.policy, actor, Permission::EditGrades)?;
        validate_dto(&dto)?;

        let mut tx = self.db.begin("record_grade").await?;
        let result = async {
            let offering = find_offering_in(tx.conn(), dto.offering_id).await?;
            ensure_grader(actor, &offering)?;

            let student = require_principal_in(tx.conn(), dto.student_id).await?;
            if student.role != Role::Student {
                return Err(AppError::validation(anyhow!(
                    "{} is not a student",
                    student.full_name()
                )));
            }
            if find_active_in(tx.conn(), dto.student_id, dto.offering_id)
                .await?
                .is_none()
            {
                return Err(AppError::validation(anyhow!(
                    "{} has no active enrollment in {} group {}",
                    student.full_name(),
                    offering.subject,
                    offering.group_label
                )));
            }

            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM grades WHERE student_id = $1 AND offering_id = $2)",
            )
            .bind(dto.student_id)
            .bind(dto.offering_id)
            .fetch_one(tx.conn())
            .await?;
            if exists {
                return Err(AppError::conflict(anyhow!(
                    "A grade is already recorded for this student in this offering"
                )));
            }

            sqlx::query_as::<_, Grade>(
                r#"INSERT INTO grades (student_id, offering_id, period_id, value, notes, graded_at)
                   VALUES ($1, $2, $3, $4, $5, NOW())
                   RETURNING id, student_id, offering_id, period_id, value, notes, graded_at"#,
            )
            .bind(dto.student_id)
            .bind(dto.offering_id)
            .bind(offering.period_id)
            .bind(dto.value)
            .bind(&dto.notes)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| {
                conflict_on_unique(e, "A grade is already recorded for this student in this offering")
            })
        }
        .await;

        let grade = tx.finish(result).await?;
        expresarte_observability::track_grade_recorded(grade.value.as_str());
        info!(grade_id = %grade.id, value = %grade.value, "grade recorded");
        Ok(grade)
    }

    /// Partial edit; `graded_at` is always refreshed.
    #[instrument(skip(self, actor, dto))]
    pub async fn edit_grade(
        &self,
        actor: Option<&Actor>,
        grade_id: GradeId,
        dto: EditGradeDto,
    ) -> Result<Grade, AppError> {
        let actor = guard(&self.policy, actor, Permission::EditGrades)?;
        validate_dto(&dto)?;

        let mut tx = self.db.begin("edit_grade").await?;
        let result = async {
            let grade = find_grade_in(tx.conn(), grade_id).await?;
            let offering = find_offering_in(tx.conn(), grade.offering_id).await?;
            ensure_grader(actor, &offering)?;

            let updated = sqlx::query_as::<_, Grade>(
                r#"UPDATE grades
                   SET value = COALESCE($2, value),
                       notes = COALESCE($3, notes),
                       graded_at = clock_timestamp()
                   WHERE id = $1
                   RETURNING id, student_id, offering_id, period_id, value, notes, graded_at"#,
            )
            .bind(grade_id)
            .bind(dto.value)
            .bind(&dto.notes)
            .fetch_one(tx.conn())
            .await?;
            Ok::<_, AppError>(updated)
        }
        .await;
        tx.finish(result).await
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_grade(&self, actor: Option<&Actor>, grade_id: GradeId) -> Result<(), AppError> {
        let actor = guard(&self.policy, actor, Permission::EditGrades)?;

        let mut tx = self.db.begin("delete_grade").await?;
        let result = async {
            let grade = find_grade_in(tx.conn(), grade_id).await?;
            let offering = find_offering_in(tx.conn(), grade.offering_id).await?;
            ensure_grader(actor, &offering)?;

            sqlx::query("DELETE FROM grades WHERE id = $1")
                .bind(grade_id)
                .execute(tx.conn())
                .await?;
            Ok::<_, AppError>(())
        }
        .await;
        tx.finish(result).await?;

        info!(grade_id = %grade_id, "grade deleted");
        Ok(())
    }

    #[instrument(skip(self, actor))]
    pub async fn get_grade(&self, actor: Option<&Actor>, grade_id: GradeId) -> Result<Grade, AppError> {
        guard(&self.policy, actor, Permission::ViewGrades)?;

        sqlx::query_as::<_, Grade>(
            r#"SELECT id, student_id, offering_id, period_id, value, notes, graded_at
               FROM grades
               WHERE id = $1"#,
        )
        .bind(grade_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Grade {} not found", grade_id)))
    }
}
