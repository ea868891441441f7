use std::sync::Arc;

use anyhow::anyhow;
use expresarte_auth::{AccessPolicy, Actor, Permission, Role};
use expresarte_core::AppError;
use expresarte_db::{Database, PgConnection, conflict_on_unique};
use expresarte_models::enrollments::{Enrollment, EnrollmentStatus};
use expresarte_models::offerings::Offering;
use expresarte_models::{EnrollmentId, OfferingId, UserId};
use tracing::{info, instrument, warn};

use crate::access::guard;
use crate::modules::offerings::service::{count_active_in, lock_offering_in};
use crate::modules::principals::service::{ensure_student, require_principal_in};

/// The student's active enrollment in an offering, if any.
pub(crate) async fn find_active_in(
    conn: &mut PgConnection,
    student_id: UserId,
    offering_id: OfferingId,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"SELECT id, student_id, offering_id, period_id, status, enrolled_at, updated_at
           FROM enrollments
           WHERE student_id = $1 AND offering_id = $2 AND status = 'active'"#,
    )
    .bind(student_id)
    .bind(offering_id)
    .fetch_optional(conn)
    .await?;
    Ok(enrollment)
}

async fn find_enrollment_in(
    conn: &mut PgConnection,
    id: EnrollmentId,
    lock: bool,
) -> Result<Enrollment, AppError> {
    let sql = if lock {
        r#"SELECT id, student_id, offering_id, period_id, status, enrolled_at, updated_at
           FROM enrollments WHERE id = $1 FOR UPDATE"#
    } else {
        r#"SELECT id, student_id, offering_id, period_id, status, enrolled_at, updated_at
           FROM enrollments WHERE id = $1"#
    };

    sqlx::query_as::<_, Enrollment>(sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment {} not found", id)))
}

/// Seat check for a new active enrollment. The offering must already be
/// locked by the caller's transaction.
async fn ensure_seat_in(
    conn: &mut PgConnection,
    offering: &Offering,
    student_id: UserId,
) -> Result<(), AppError> {
    let active = count_active_in(conn, offering.id).await?;
    if active >= i64::from(offering.capacity) {
        expresarte_observability::track_capacity_rejection(offering.subject.code());
        warn!(offering_id = %offering.id, capacity = offering.capacity, "offering is full");
        return Err(AppError::capacity_exceeded(anyhow!(
            "{} group {} is full ({} of {} seats taken)",
            offering.subject,
            offering.group_label,
            active,
            offering.capacity
        )));
    }

    if find_active_in(conn, student_id, offering.id).await?.is_some() {
        return Err(AppError::conflict(anyhow!(
            "Student is already actively enrolled in {} group {}",
            offering.subject,
            offering.group_label
        )));
    }
    Ok(())
}

const DUPLICATE_ACTIVE: &str = "Student is already actively enrolled in this offering";

/// A student may only enroll themselves; staff may enroll anyone.
fn ensure_may_enroll(actor: &Actor, student_id: UserId) -> Result<(), AppError> {
    if actor.role == Role::Student && !actor.is(student_id.as_uuid()) {
        return Err(AppError::forbidden(anyhow!(
            "Students can only enroll themselves"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EnrollmentService {
    db: Database,
    policy: Arc<AccessPolicy>,
}

impl EnrollmentService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>) -> Self {
        Self { db, policy }
    }

    /// Enroll a student directly into a seat.
    ///
    /// The capacity check, duplicate check and insert run in one transaction
    /// holding the offering's row lock, so concurrent calls never overfill it.
    #[instrument(skip(self, actor))]
    pub async fn enroll(
        &self,
        actor: Option<&Actor>,
        student_id: UserId,
        offering_id: OfferingId,
    ) -> Result<Enrollment, AppError> {
        let actor = guard(&self.policy, actor, Permission::EnrollInCourses)?;
        ensure_may_enroll(actor, student_id)?;

        let mut tx = self.db.begin("enroll").await?;
        let result = async {
            let student = require_principal_in(tx.conn(), student_id).await?;
            ensure_student(&student)?;

            let offering = lock_offering_in(tx.conn(), offering_id).await?;
            ensure_seat_in(tx.conn(), &offering, student_id).await?;

            let enrollment = sqlx::query_as::<_, Enrollment>(
                r#"INSERT INTO enrollments (student_id, offering_id, period_id, status)
                   VALUES ($1, $2, $3, 'active')
                   RETURNING id, student_id, offering_id, period_id, status, enrolled_at, updated_at"#,
            )
            .bind(student_id)
            .bind(offering_id)
            .bind(offering.period_id)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE_ACTIVE))?;

            Ok::<_, AppError>((enrollment, offering))
        }
        .await;

        let (enrollment, offering) = tx.finish(result).await?;
        expresarte_observability::track_enrollment_created(offering.subject.code());
        info!(enrollment_id = %enrollment.id, "student enrolled");
        Ok(enrollment)
    }

    /// File a pending enrollment request. Pending requests take no seat.
    #[instrument(skip(self, actor))]
    pub async fn request_enrollment(
        &self,
        actor: Option<&Actor>,
        student_id: UserId,
        offering_id: OfferingId,
    ) -> Result<Enrollment, AppError> {
        let actor = guard(&self.policy, actor, Permission::EnrollInCourses)?;
        ensure_may_enroll(actor, student_id)?;

        let mut tx = self.db.begin("request_enrollment").await?;
        let result = async {
            let student = require_principal_in(tx.conn(), student_id).await?;
            ensure_student(&student)?;
            let offering = lock_offering_in(tx.conn(), offering_id).await?;

            let open: bool = sqlx::query_scalar(
                r#"SELECT EXISTS(
                       SELECT 1 FROM enrollments
                       WHERE student_id = $1 AND offering_id = $2 AND status = ANY($3)
                   )"#,
            )
            .bind(student_id)
            .bind(offering_id)
            .bind(&EnrollmentStatus::OPEN[..])
            .fetch_one(tx.conn())
            .await?;
            if open {
                return Err(AppError::conflict(anyhow!(
                    "Student already has an open enrollment in this offering"
                )));
            }

            let enrollment = sqlx::query_as::<_, Enrollment>(
                r#"INSERT INTO enrollments (student_id, offering_id, period_id, status)
                   VALUES ($1, $2, $3, 'pending')
                   RETURNING id, student_id, offering_id, period_id, status, enrolled_at, updated_at"#,
            )
            .bind(student_id)
            .bind(offering_id)
            .bind(offering.period_id)
            .fetch_one(tx.conn())
            .await?;
            Ok(enrollment)
        }
        .await;

        let enrollment = tx.finish(result).await?;
        info!(enrollment_id = %enrollment.id, "enrollment requested");
        Ok(enrollment)
    }

    /// Move an enrollment along its lifecycle.
    ///
    /// `new_status` is parsed here so unknown names surface as validation
    /// errors. A move into `active` re-checks capacity and duplicates under
    /// the offering lock.
    #[instrument(skip(self, actor))]
    pub async fn change_status(
        &self,
        actor: Option<&Actor>,
        enrollment_id: EnrollmentId,
        new_status: &str,
    ) -> Result<Enrollment, AppError> {
        guard(&self.policy, actor, Permission::ManageEnrollments)?;
        let next: EnrollmentStatus = new_status.parse()?;

        let mut tx = self.db.begin("change_enrollment_status").await?;
        let result = async {
            let current = find_enrollment_in(tx.conn(), enrollment_id, true).await?;
            if !current.status.can_transition_to(next) {
                return Err(AppError::validation(anyhow!(
                    "Cannot move an enrollment from {} to {}",
                    current.status,
                    next
                )));
            }

            if next.occupies_seat() {
                let offering = lock_offering_in(tx.conn(), current.offering_id).await?;
                ensure_seat_in(tx.conn(), &offering, current.student_id).await?;
            }

            sqlx::query_as::<_, Enrollment>(
                r#"UPDATE enrollments
                   SET status = $2, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, student_id, offering_id, period_id, status, enrolled_at, updated_at"#,
            )
            .bind(enrollment_id)
            .bind(next)
            .fetch_one(tx.conn())
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE_ACTIVE))
        }
        .await;

        let enrollment = tx.finish(result).await?;
        info!(enrollment_id = %enrollment_id, status = %enrollment.status, "enrollment status changed");
        Ok(enrollment)
    }

    /// Hard delete. Grades recorded for the student are left in place.
    #[instrument(skip(self, actor))]
    pub async fn remove_enrollment(&self, actor: Option<&Actor>, enrollment_id: EnrollmentId) -> Result<(), AppError> {
        guard(&self.policy, actor, Permission::ManageEnrollments)?;

        let removed = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(enrollment_id)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found(anyhow!("Enrollment {} not found", enrollment_id)));
        }
        info!(enrollment_id = %enrollment_id, "enrollment removed");
        Ok(())
    }

    #[instrument(skip(self, actor))]
    pub async fn get_enrollment(&self, actor: Option<&Actor>, enrollment_id: EnrollmentId) -> Result<Enrollment, AppError> {
        guard(&self.policy, actor, Permission::ViewCourses)?;
        let mut conn = self.db.pool().acquire().await?;
        find_enrollment_in(&mut conn, enrollment_id, false).await
    }
}
