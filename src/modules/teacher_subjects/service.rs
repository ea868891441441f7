use std::sync::Arc;

use anyhow::anyhow;
use expresarte_auth::{AccessPolicy, Actor, Permission};
use expresarte_core::AppError;
use expresarte_db::{Database, conflict_on_unique};
use expresarte_models::UserId;
use expresarte_models::subjects::Subject;
use expresarte_models::teacher_subjects::TeacherSubject;
use tracing::{info, instrument};

use crate::access::guard;
use crate::modules::principals::service::{ensure_can_teach, require_principal_in};

#[derive(Clone)]
pub struct TeacherSubjectService {
    db: Database,
    policy: Arc<AccessPolicy>,
}

impl TeacherSubjectService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>) -> Self {
        Self { db, policy }
    }

    /// Record that a teacher can teach `subject`. Repeating an existing
    /// assignment succeeds and returns the original row.
    #[instrument(skip(self, actor))]
    pub async fn assign_teacher_to_subject(
        &self,
        actor: Option<&Actor>,
        teacher_id: UserId,
        subject: Subject,
    ) -> Result<TeacherSubject, AppError> {
        guard(&self.policy, actor, Permission::EditCourses)?;

        let mut tx = self.db.begin("assign_teacher_to_subject").await?;
        let result = async {
            let teacher = require_principal_in(tx.conn(), teacher_id).await?;
            ensure_can_teach(&teacher)?;

            sqlx::query(
                r#"INSERT INTO teacher_subjects (teacher_id, subject)
                   VALUES ($1, $2)
                   ON CONFLICT (teacher_id, subject) DO NOTHING"#,
            )
            .bind(teacher_id)
            .bind(subject)
            .execute(tx.conn())
            .await?;

            let assignment = sqlx::query_as::<_, TeacherSubject>(
                r#"SELECT id, teacher_id, subject, created_at
                   FROM teacher_subjects
                   WHERE teacher_id = $1 AND subject = $2"#,
            )
            .bind(teacher_id)
            .bind(subject)
            .fetch_one(tx.conn())
            .await?;
            Ok::<_, AppError>(assignment)
        }
        .await;

        let assignment = tx.finish(result).await?;
        info!(teacher_id = %teacher_id, subject = subject.code(), "teacher assigned to subject");
        Ok(assignment)
    }

    #[instrument(skip(self, actor))]
    pub async fn remove_teacher_from_subject(
        &self,
        actor: Option<&Actor>,
        teacher_id: UserId,
        subject: Subject,
    ) -> Result<(), AppError> {
        guard(&self.policy, actor, Permission::EditCourses)?;

        let removed = sqlx::query("DELETE FROM teacher_subjects WHERE teacher_id = $1 AND subject = $2")
            .bind(teacher_id)
            .bind(subject)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found(anyhow!(
                "Teacher {} is not assigned to {}",
                teacher_id,
                subject
            )));
        }
        Ok(())
    }

    /// Move an existing assignment from one subject to another in place.
    ///
    /// Moving onto a subject the teacher already holds is a `Conflict`;
    /// moving onto the same subject returns the row unchanged.
    #[instrument(skip(self, actor))]
    pub async fn reassign_teacher_subject(
        &self,
        actor: Option<&Actor>,
        teacher_id: UserId,
        from: Subject,
        to: Subject,
    ) -> Result<TeacherSubject, AppError> {
        guard(&self.policy, actor, Permission::EditCourses)?;

        let mut tx = self.db.begin("reassign_teacher_subject").await?;
        let result = async {
            let current = sqlx::query_as::<_, TeacherSubject>(
                r#"SELECT id, teacher_id, subject, created_at
                   FROM teacher_subjects
                   WHERE teacher_id = $1 AND subject = $2
                   FOR UPDATE"#,
            )
            .bind(teacher_id)
            .bind(from)
            .fetch_optional(tx.conn())
            .await?
            .ok_or_else(|| {
                AppError::not_found(anyhow!("Teacher {} is not assigned to {}", teacher_id, from))
            })?;

            if from == to {
                return Ok(current);
            }

            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM teacher_subjects WHERE teacher_id = $1 AND subject = $2)",
            )
            .bind(teacher_id)
            .bind(to)
            .fetch_one(tx.conn())
            .await?;
            if taken {
                return Err(AppError::conflict(anyhow!(
                    "Teacher {} is already assigned to {}",
                    teacher_id,
                    to
                )));
            }

            let moved = sqlx::query_as::<_, TeacherSubject>(
                r#"UPDATE teacher_subjects
                   SET subject = $2
                   WHERE id = $1
                   RETURNING id, teacher_id, subject, created_at"#,
            )
            .bind(current.id)
            .bind(to)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| conflict_on_unique(e, "Teacher is already assigned to that subject"))?;
            Ok::<_, AppError>(moved)
        }
        .await;

        let moved = tx.finish(result).await?;
        info!(
            teacher_id = %teacher_id,
            from = from.code(),
            to = to.code(),
            "teacher subject reassigned"
        );
        Ok(moved)
    }
}
