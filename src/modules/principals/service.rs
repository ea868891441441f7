use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use expresarte_auth::{AccessPolicy, Actor, Permission, Role};
use expresarte_config::BootstrapConfig;
use expresarte_core::{AppError, hash_password};
use expresarte_db::{Database, PgConnection, conflict_on_unique};
use expresarte_models::UserId;
use expresarte_models::principals::{
    CreatePrincipalDto, Principal, PrincipalProfile, UpdateProfileDto, ensure_birth_date,
};
use tracing::{info, instrument};

use crate::access::guard;
use crate::validation::{non_blank, validate_dto};

/// Load a principal by id on the caller's connection.
pub(crate) async fn require_principal_in(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Principal, AppError> {
    sqlx::query_as::<_, Principal>(
        r#"SELECT id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at
           FROM principals
           WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Principal {} not found", id)))
}

/// An active principal holding the student role.
pub(crate) fn ensure_student(principal: &Principal) -> Result<(), AppError> {
    if principal.role != Role::Student {
        return Err(AppError::validation(anyhow!(
            "{} is a {}, not a student",
            principal.full_name(),
            principal.role
        )));
    }
    if !principal.is_active {
        return Err(AppError::validation(anyhow!(
            "Student {} is deactivated",
            principal.full_name()
        )));
    }
    Ok(())
}

/// An active principal of teacher rank or higher.
pub(crate) fn ensure_can_teach(principal: &Principal) -> Result<(), AppError> {
    if !principal.role.can_teach() {
        return Err(AppError::validation(anyhow!(
            "{} holds role {} and cannot teach",
            principal.full_name(),
            principal.role
        )));
    }
    if !principal.is_active {
        return Err(AppError::validation(anyhow!(
            "Teacher {} is deactivated",
            principal.full_name()
        )));
    }
    Ok(())
}

/// Nobody may hand out, or act on, a role above their own.
fn ensure_not_outranked(actor: &Actor, role: Role) -> Result<(), AppError> {
    if role.outranks(actor.role) {
        return Err(AppError::forbidden(anyhow!(
            "A {} cannot manage {} accounts",
            actor.role,
            role
        )));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim the optional text fields, reject blanks and a birth date in the future.
fn clean_profile(profile: PrincipalProfile) -> Result<PrincipalProfile, AppError> {
    let optional =
        |value: Option<String>, field: &str| value.map(|v| non_blank(&v, field)).transpose();

    ensure_birth_date(profile.birth_date, Utc::now().date_naive())?;
    Ok(PrincipalProfile {
        middle_name: optional(profile.middle_name, "middle name")?,
        second_last_name: optional(profile.second_last_name, "second last name")?,
        national_id: optional(profile.national_id, "national id")?,
        ..profile
    })
}

async fn insert_principal_in(
    conn: &mut PgConnection,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: Option<String>,
    role: Role,
    profile: &PrincipalProfile,
) -> Result<Principal, AppError> {
    sqlx::query_as::<_, Principal>(
        r#"INSERT INTO principals
               (first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                national_id, birth_date, sex)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at"#,
    )
    .bind(first_name)
    .bind(&profile.middle_name)
    .bind(last_name)
    .bind(&profile.second_last_name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(&profile.national_id)
    .bind(profile.birth_date)
    .bind(profile.sex)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "A principal with this email already exists"))
}

#[derive(Clone)]
pub struct PrincipalService {
    db: Database,
    policy: Arc<AccessPolicy>,
}

impl PrincipalService {
    pub fn new(db: Database, policy: Arc<AccessPolicy>) -> Self {
        Self { db, policy }
    }

    #[instrument(skip(self, actor, dto), fields(role = %dto.role))]
    pub async fn create_principal(
        &self,
        actor: Option<&Actor>,
        dto: CreatePrincipalDto,
    ) -> Result<Principal, AppError> {
        let actor = guard(&self.policy, actor, Permission::CreateUsers)?;
        validate_dto(&dto)?;
        ensure_not_outranked(actor, dto.role)?;

        let first_name = non_blank(&dto.first_name, "first name")?;
        let last_name = non_blank(&dto.last_name, "last name")?;
        let profile = clean_profile(dto.profile)?;
        let password_hash = dto.password.as_deref().map(hash_password).transpose()?;

        let mut conn = self.db.pool().acquire().await?;
        let principal = insert_principal_in(
            &mut conn,
            &first_name,
            &last_name,
            &normalize_email(&dto.email),
            password_hash,
            dto.role,
            &profile,
        )
        .await?;

        expresarte_observability::track_principal_created(principal.role.as_str());
        info!(principal_id = %principal.id, role = %principal.role, "principal created");
        Ok(principal)
    }

    #[instrument(skip(self, actor))]
    pub async fn change_role(
        &self,
        actor: Option<&Actor>,
        id: UserId,
        role: Role,
    ) -> Result<Principal, AppError> {
        let actor = guard(&self.policy, actor, Permission::EditUsers)?;
        ensure_not_outranked(actor, role)?;

        let mut tx = self.db.begin("change_role").await?;
        let result = async {
            let current = require_principal_in(tx.conn(), id).await?;
            ensure_not_outranked(actor, current.role)?;

            let updated = sqlx::query_as::<_, Principal>(
                r#"UPDATE principals
                   SET role = $2, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at"#,
            )
            .bind(id)
            .bind(role)
            .fetch_one(tx.conn())
            .await?;

            info!(principal_id = %id, from = %current.role, to = %role, "role changed");
            Ok::<_, AppError>(updated)
        }
        .await;
        tx.finish(result).await
    }

    /// Partial profile edit. The target must not outrank the actor.
    #[instrument(skip(self, actor, dto))]
    pub async fn update_profile(
        &self,
        actor: Option<&Actor>,
        id: UserId,
        dto: UpdateProfileDto,
    ) -> Result<Principal, AppError> {
        let actor = guard(&self.policy, actor, Permission::EditUsers)?;
        validate_dto(&dto)?;

        let first_name = dto
            .first_name
            .as_deref()
            .map(|v| non_blank(v, "first name"))
            .transpose()?;
        let last_name = dto
            .last_name
            .as_deref()
            .map(|v| non_blank(v, "last name"))
            .transpose()?;
        let profile = clean_profile(dto.profile)?;

        let mut tx = self.db.begin("update_profile").await?;
        let result = async {
            let current = require_principal_in(tx.conn(), id).await?;
            ensure_not_outranked(actor, current.role)?;

            let updated = sqlx::query_as::<_, Principal>(
                r#"UPDATE principals
                   SET first_name = COALESCE($2, first_name),
                       middle_name = COALESCE($3, middle_name),
                       last_name = COALESCE($4, last_name),
                       second_last_name = COALESCE($5, second_last_name),
                       national_id = COALESCE($6, national_id),
                       birth_date = COALESCE($7, birth_date),
                       sex = COALESCE($8, sex),
                       updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at"#,
            )
            .bind(id)
            .bind(first_name)
            .bind(&profile.middle_name)
            .bind(last_name)
            .bind(&profile.second_last_name)
            .bind(&profile.national_id)
            .bind(profile.birth_date)
            .bind(profile.sex)
            .fetch_one(tx.conn())
            .await?;
            Ok::<_, AppError>(updated)
        }
        .await;
        tx.finish(result).await
    }

    /// Soft delete. Deactivating an already inactive principal is a no-op.
    #[instrument(skip(self, actor))]
    pub async fn deactivate(&self, actor: Option<&Actor>, id: UserId) -> Result<Principal, AppError> {
        let actor = guard(&self.policy, actor, Permission::DeleteUsers)?;

        let mut tx = self.db.begin("deactivate_principal").await?;
        let result = async {
            let current = require_principal_in(tx.conn(), id).await?;
            ensure_not_outranked(actor, current.role)?;
            if !current.is_active {
                return Ok(current);
            }

            let updated = sqlx::query_as::<_, Principal>(
                r#"UPDATE principals
                   SET is_active = FALSE, updated_at = NOW()
                   WHERE id = $1
                   RETURNING id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at"#,
            )
            .bind(id)
            .fetch_one(tx.conn())
            .await?;

            info!(principal_id = %id, "principal deactivated");
            Ok::<_, AppError>(updated)
        }
        .await;
        tx.finish(result).await
    }

    #[instrument(skip(self, actor))]
    pub async fn get_principal(&self, actor: Option<&Actor>, id: UserId) -> Result<Principal, AppError> {
        guard(&self.policy, actor, Permission::ViewUsers)?;
        let mut conn = self.db.pool().acquire().await?;
        require_principal_in(&mut conn, id).await
    }

    /// Resolve the actor for a signed-in principal by email.
    ///
    /// This is caller resolution, not a guarded operation: it runs before any
    /// actor exists. Unknown emails are `NotFound`.
    #[instrument(skip(self))]
    pub async fn resolve_actor(&self, email: &str) -> Result<Actor, AppError> {
        let principal = sqlx::query_as::<_, Principal>(
            r#"SELECT id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at
               FROM principals
               WHERE LOWER(email) = $1"#,
        )
        .bind(normalize_email(email))
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("No principal with email {}", email.trim())))?;

        Ok(principal.to_actor())
    }

    /// Create the first super admin from `config`, or return the existing one.
    ///
    /// Runs without an actor; concurrent callers are serialised with an
    /// advisory lock so at most one account is created.
    #[instrument(skip(self, config), fields(email = %config.email))]
    pub async fn bootstrap_super_admin(&self, config: &BootstrapConfig) -> Result<Principal, AppError> {
        let mut tx = self.db.begin("bootstrap_super_admin").await?;
        let result = async {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext('expresarte.bootstrap_super_admin'))")
                .execute(tx.conn())
                .await?;

            let existing = sqlx::query_as::<_, Principal>(
                r#"SELECT id, first_name, middle_name, last_name, second_last_name, email, password_hash, role,
                  is_active, national_id, birth_date, sex, created_at, updated_at
                   FROM principals
                   WHERE role = 'super_admin'
                   ORDER BY created_at
                   LIMIT 1"#,
            )
            .fetch_optional(tx.conn())
            .await?;

            if let Some(existing) = existing {
                info!(principal_id = %existing.id, "super admin already present, nothing to do");
                return Ok(existing);
            }

            if config.password.len() < 8 {
                return Err(AppError::validation(anyhow!(
                    "ADMIN_PASSWORD must be at least 8 characters"
                )));
            }

            let principal = insert_principal_in(
                tx.conn(),
                config.first_name.trim(),
                config.last_name.trim(),
                &normalize_email(&config.email),
                Some(hash_password(&config.password)?),
                Role::SuperAdmin,
                &PrincipalProfile::default(),
            )
            .await?;

            info!(principal_id = %principal.id, "super admin created");
            Ok::<_, AppError>(principal)
        }
        .await;
        tx.finish(result).await
    }
}
