use std::sync::Arc;

use anyhow::anyhow;
use expresarte_auth::{AccessPolicy, Actor, Permission};
use expresarte_core::AppError;
use expresarte_db::{Database, PgConnection, conflict_on_foreign_key, conflict_on_unique};
use expresarte_models::AcademicPeriodId;
use expresarte_models::periods::{AcademicPeriod, CreatePeriodDto, UpdatePeriodDto, ensure_date_order};
use tracing::{info, instrument};

use crate::access::guard;
use crate::validation::{non_blank, validate_dto};

pub(crate) async fn find_period_in(
    conn: &mut PgConnection,
    id: AcademicPeriodId,
    lock: bool,
) -> Result<AcademicPeriod, AppError> {
    let sql = if lock {
        r#"SELECT id, name, start_date, end_date, is_active, created_at, updated_at
           FROM academic_periods WHERE id = $1 FOR UPDATE"#
    } else {
        r#"SELECT id, name, start_date, end_date, is_active, created_at, updated_at
           FROM academic_periods WHERE id = $1"#
    };

    sqlx::query_as::<_, AcademicPeriod>(sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Academic period {} not found", id)))
}

fn duplicate_name(name: &str) -> String {
    format!("An academic period named '{}' already exists", name)
}

#[derive(Clone)]
pub struct PeriodService {
    db: Database,
    policy: Arc<AccessPolicy>,
}

impl PeriodService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>) -> Self {
        Self { db, policy }
    }

    /// Create a period.
    ///
    /// Validates that:
    /// - the name is non-blank and at most 50 characters
    /// - start_date < end_date
    /// - no other period has the same name
    #[instrument(skip(self, actor, dto), fields(name = %dto.name))]
    pub async fn create_period(
        &self,
        actor: Option<&Actor>,
        dto: CreatePeriodDto,
    ) -> Result<AcademicPeriod, AppError> {
        guard(&self.policy, actor, Permission::ManageAcademicPeriods)?;
        validate_dto(&dto)?;
        let name = non_blank(&dto.name, "period name")?;
        ensure_date_order(dto.start_date, dto.end_date)?;

        let period = sqlx::query_as::<_, AcademicPeriod>(
            r#"INSERT INTO academic_periods (name, start_date, end_date)
               VALUES ($1, $2, $3)
               RETURNING id, name, start_date, end_date, is_active, created_at, updated_at"#,
        )
        .bind(&name)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, &duplicate_name(&name)))?;

        info!(period_id = %period.id, "academic period created");
        Ok(period)
    }

    #[instrument(skip(self, actor, dto))]
    pub async fn update_period(
        &self,
        actor: Option<&Actor>,
        id: AcademicPeriodId,
        dto: UpdatePeriodDto,
    ) -> Result<AcademicPeriod, AppError> {
        guard(&self.policy, actor, Permission::ManageAcademicPeriods)?;
        validate_dto(&dto)?;
        let name = dto
            .name
            .as_deref()
            .map(|n| non_blank(n, "period name"))
            .transpose()?;

        let mut tx = self.db.begin("update_period").await?;
        let result = async {
            let current = find_period_in(tx.conn(), id, true).await?;

            let name = name.unwrap_or(current.name);
            let start_date = dto.start_date.unwrap_or(current.start_date);
            let end_date = dto.end_date.unwrap_or(current.end_date);
            ensure_date_order(start_date, end_date)?;

            sqlx::query_as::<_, AcademicPeriod>(
                r#"UPDATE academic_periods
                   SET name = $2, start_date = $3, end_date = $4, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, name, start_date, end_date, is_active, created_at, updated_at"#,
            )
            .bind(id)
            .bind(&name)
            .bind(start_date)
            .bind(end_date)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| conflict_on_unique(e, &duplicate_name(&name)))
        }
        .await;
        tx.finish(result).await
    }

    #[instrument(skip(self, actor))]
    pub async fn set_period_active(
        &self,
        actor: Option<&Actor>,
        id: AcademicPeriodId,
        is_active: bool,
    ) -> Result<AcademicPeriod, AppError> {
        guard(&self.policy, actor, Permission::ManageAcademicPeriods)?;

        sqlx::query_as::<_, AcademicPeriod>(
            r#"UPDATE academic_periods
               SET is_active = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, start_date, end_date, is_active, created_at, updated_at"#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Academic period {} not found", id)))
    }

    /// Delete a period that owns no offerings.
    #[instrument(skip(self, actor))]
    pub async fn delete_period(&self, actor: Option<&Actor>, id: AcademicPeriodId) -> Result<(), AppError> {
        guard(&self.policy, actor, Permission::ManageAcademicPeriods)?;

        let mut tx = self.db.begin("delete_period").await?;
        let result = async {
            let period = find_period_in(tx.conn(), id, true).await?;

            let offerings: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM offerings WHERE period_id = $1")
                    .bind(id)
                    .fetch_one(tx.conn())
                    .await?;
            if offerings > 0 {
                return Err(AppError::conflict(anyhow!(
                    "Academic period '{}' still has {} offering(s)",
                    period.name,
                    offerings
                )));
            }

            sqlx::query("DELETE FROM academic_periods WHERE id = $1")
                .bind(id)
                .execute(tx.conn())
                .await
                .map_err(|e| conflict_on_foreign_key(e, "Academic period is still referenced"))?;

            info!(period_id = %id, "academic period deleted");
            Ok(())
        }
        .await;
        tx.finish(result).await
    }

    #[instrument(skip(self, actor))]
    pub async fn get_period(&self, actor: Option<&Actor>, id: AcademicPeriodId) -> Result<AcademicPeriod, AppError> {
        guard(&self.policy, actor, Permission::ViewCourses)?;
        let mut conn = self.db.pool().acquire().await?;
        find_period_in(&mut conn, id, false).await
    }
}
