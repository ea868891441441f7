use std::sync::Arc;

use anyhow::anyhow;
use expresarte_auth::{AccessPolicy, Actor, Permission};
use expresarte_core::AppError;
use expresarte_db::{
    Database, PgConnection, conflict_on_foreign_key, conflict_on_unique, is_foreign_key_violation,
    not_found_on_foreign_key,
};
use expresarte_models::offerings::{CreateOfferingDto, Offering, OfferingOccupancy};
use expresarte_models::{OfferingId, UserId};
use tracing::{info, instrument};

use crate::access::{guard, guard_any};
use crate::modules::periods::service::find_period_in;
use crate::modules::principals::service::{ensure_can_teach, require_principal_in};
use crate::validation::{non_blank, validate_dto};

pub(crate) async fn find_offering_in(
    conn: &mut PgConnection,
    id: OfferingId,
) -> Result<Offering, AppError> {
    sqlx::query_as::<_, Offering>(
        r#"SELECT id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at
           FROM offerings
           WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Offering {} not found", id)))
}

/// Load and row-lock an offering until the caller's transaction ends.
///
/// Every path that may add an active enrollment takes this lock first, which
/// serialises seat allocation per offering.
pub(crate) async fn lock_offering_in(
    conn: &mut PgConnection,
    id: OfferingId,
) -> Result<Offering, AppError> {
    sqlx::query_as::<_, Offering>(
        r#"SELECT id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at
           FROM offerings
           WHERE id = $1
           FOR UPDATE"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Offering {} not found", id)))
}

pub(crate) async fn count_active_in(conn: &mut PgConnection, id: OfferingId) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE offering_id = $1 AND status = 'active'",
    )
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

fn ensure_capacity(capacity: i32) -> Result<(), AppError> {
    if capacity < 1 {
        return Err(AppError::validation(anyhow!(
            "Capacity must be at least 1, got {}",
            capacity
        )));
    }
    Ok(())
}

async fn validate_teacher_in(conn: &mut PgConnection, teacher_id: UserId) -> Result<(), AppError> {
    let teacher = require_principal_in(conn, teacher_id).await?;
    ensure_can_teach(&teacher)
}

#[derive(Clone)]
pub struct OfferingService {
    db: Database,
    policy: Arc<AccessPolicy>,
    default_capacity: i32,
}

impl OfferingService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>, default_capacity: i32) -> Self {
        Self {
            db,
            policy,
            default_capacity,
        }
    }

    /// Open an offering of a subject for one group within a period.
    ///
    /// Validates that:
    /// - the period exists (row-locked so it cannot be deleted underneath)
    /// - the teacher, when given, exists, is active and is teacher rank or higher
    /// - capacity (or the configured default) is at least 1
    /// - (subject, period, group) is not already taken
    #[instrument(skip(self, actor, dto), fields(subject = %dto.subject, group = %dto.group_label))]
    pub async fn create_offering(
        &self,
        actor: Option<&Actor>,
        dto: CreateOfferingDto,
    ) -> Result<Offering, AppError> {
        guard_any(
            &self.policy,
            actor,
            &[Permission::ManageAcademicPeriods, Permission::CreateCourses],
        )?;
        validate_dto(&dto)?;
        let group_label = non_blank(&dto.group_label, "group label")?;
        let capacity = dto.capacity.unwrap_or(self.default_capacity);
        ensure_capacity(capacity)?;

        let mut tx = self.db.begin("create_offering").await?;
        let result = async {
            find_period_in(tx.conn(), dto.period_id, true).await?;
            if let Some(teacher_id) = dto.teacher_id {
                validate_teacher_in(tx.conn(), teacher_id).await?;
            }

            let taken: bool = sqlx::query_scalar(
                r#"SELECT EXISTS(
                       SELECT 1 FROM offerings
                       WHERE subject = $1 AND period_id = $2 AND group_label = $3
                   )"#,
            )
            .bind(dto.subject)
            .bind(dto.period_id)
            .bind(&group_label)
            .fetch_one(tx.conn())
            .await?;
            if taken {
                return Err(AppError::conflict(anyhow!(
                    "{} group {} already exists in this period",
                    dto.subject,
                    group_label
                )));
            }

            sqlx::query_as::<_, Offering>(
                r#"INSERT INTO offerings (subject, period_id, group_label, teacher_id, capacity)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at"#,
            )
            .bind(dto.subject)
            .bind(dto.period_id)
            .bind(&group_label)
            .bind(dto.teacher_id)
            .bind(capacity)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return not_found_on_foreign_key(e, "The period or teacher no longer exists");
                }
                conflict_on_unique(e, "This subject group already exists in this period")
            })
        }
        .await;

        let offering = tx.finish(result).await?;
        info!(offering_id = %offering.id, capacity = offering.capacity, "offering created");
        Ok(offering)
    }

    /// Set (or replace) the teacher of an offering.
    #[instrument(skip(self, actor))]
    pub async fn assign_teacher(
        &self,
        actor: Option<&Actor>,
        offering_id: OfferingId,
        teacher_id: UserId,
    ) -> Result<Offering, AppError> {
        guard(&self.policy, actor, Permission::EditCourses)?;

        let mut tx = self.db.begin("assign_teacher").await?;
        let result = async {
            validate_teacher_in(tx.conn(), teacher_id).await?;

            sqlx::query_as::<_, Offering>(
                r#"UPDATE offerings
                   SET teacher_id = $2, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at"#,
            )
            .bind(offering_id)
            .bind(teacher_id)
            .fetch_optional(tx.conn())
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Offering {} not found", offering_id)))
        }
        .await;
        tx.finish(result).await
    }

    /// Resize an offering. It can never shrink below its active enrollments.
    #[instrument(skip(self, actor))]
    pub async fn update_capacity(
        &self,
        actor: Option<&Actor>,
        offering_id: OfferingId,
        capacity: i32,
    ) -> Result<Offering, AppError> {
        guard(&self.policy, actor, Permission::EditCourses)?;
        ensure_capacity(capacity)?;

        let mut tx = self.db.begin("update_capacity").await?;
        let result = async {
            lock_offering_in(tx.conn(), offering_id).await?;
            let active = count_active_in(tx.conn(), offering_id).await?;
            if i64::from(capacity) < active {
                return Err(AppError::conflict(anyhow!(
                    "Capacity {} is below the {} active enrollment(s)",
                    capacity,
                    active
                )));
            }

            let offering = sqlx::query_as::<_, Offering>(
                r#"UPDATE offerings
                   SET capacity = $2, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at"#,
            )
            .bind(offering_id)
            .bind(capacity)
            .fetch_one(tx.conn())
            .await?;
            Ok(offering)
        }
        .await;
        tx.finish(result).await
    }

    /// Delete an offering nobody is enrolled in or graded for.
    #[instrument(skip(self, actor))]
    pub async fn delete_offering(&self, actor: Option<&Actor>, offering_id: OfferingId) -> Result<(), AppError> {
        guard(&self.policy, actor, Permission::DeleteCourses)?;

        let mut tx = self.db.begin("delete_offering").await?;
        let result = async {
            lock_offering_in(tx.conn(), offering_id).await?;

            let (enrollments, grades): (i64, i64) = sqlx::query_as(
                r#"SELECT
                       (SELECT COUNT(*) FROM enrollments WHERE offering_id = $1),
                       (SELECT COUNT(*) FROM grades WHERE offering_id = $1)"#,
            )
            .bind(offering_id)
            .fetch_one(tx.conn())
            .await?;
            if enrollments > 0 || grades > 0 {
                return Err(AppError::conflict(anyhow!(
                    "Offering still has {} enrollment(s) and {} grade(s)",
                    enrollments,
                    grades
                )));
            }

            sqlx::query("DELETE FROM offerings WHERE id = $1")
                .bind(offering_id)
                .execute(tx.conn())
                .await
                .map_err(|e| conflict_on_foreign_key(e, "Offering is still referenced"))?;

            info!(offering_id = %offering_id, "offering deleted");
            Ok(())
        }
        .await;
        tx.finish(result).await
    }

    #[instrument(skip(self, actor))]
    pub async fn get_offering(&self, actor: Option<&Actor>, offering_id: OfferingId) -> Result<Offering, AppError> {
        guard(&self.policy, actor, Permission::ViewCourses)?;
        let mut conn = self.db.pool().acquire().await?;
        find_offering_in(&mut conn, offering_id).await
    }

    #[instrument(skip(self, actor))]
    pub async fn count_active_enrollments(
        &self,
        actor: Option<&Actor>,
        offering_id: OfferingId,
    ) -> Result<i64, AppError> {
        guard(&self.policy, actor, Permission::ViewCourses)?;
        let mut conn = self.db.pool().acquire().await?;
        find_offering_in(&mut conn, offering_id).await?;
        count_active_in(&mut conn, offering_id).await
    }

    #[instrument(skip(self, actor))]
    pub async fn get_occupancy(
        &self,
        actor: Option<&Actor>,
        offering_id: OfferingId,
    ) -> Result<OfferingOccupancy, AppError> {
        guard(&self.policy, actor, Permission::ViewCourses)?;
        let mut conn = self.db.pool().acquire().await?;
        let offering = find_offering_in(&mut conn, offering_id).await?;
        let active_enrollments = count_active_in(&mut conn, offering_id).await?;
        Ok(OfferingOccupancy {
            offering,
            active_enrollments,
        })
    }
}
