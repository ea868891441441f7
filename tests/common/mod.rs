#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use expresarte::AppState;
use expresarte::expresarte_auth::{AccessPolicy, Actor, Role};
use expresarte::expresarte_config::AcademicConfig;
use expresarte::expresarte_db::Database;
use expresarte::expresarte_models::UserId;
use expresarte::expresarte_models::offerings::Offering;
use expresarte::expresarte_models::periods::AcademicPeriod;
use expresarte::expresarte_models::principals::Principal;
use expresarte::expresarte_models::subjects::Subject;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use sqlx::PgPool;
use uuid::Uuid;

pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(
        Database::new(pool),
        Arc::new(AccessPolicy::standard()),
        &AcademicConfig::default(),
    )
}

pub fn generate_unique_email() -> String {
    format!("user-{}@expresarte.test", Uuid::new_v4())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Insert a principal directly, bypassing authorization.
pub async fn create_test_principal(pool: &PgPool, role: Role) -> Principal {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    sqlx::query_as::<_, Principal>(
        r#"INSERT INTO principals (first_name, last_name, email, role)
           VALUES ($1, $2, $3, $4)
           RETURNING id, first_name, middle_name, last_name, second_last_name, email, password_hash,
                     role, is_active, national_id, birth_date, sex, created_at, updated_at"#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(generate_unique_email())
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A stored principal of `role` and the actor acting as them.
pub async fn create_test_actor(pool: &PgPool, role: Role) -> (Principal, Actor) {
    let principal = create_test_principal(pool, role).await;
    let actor = principal.to_actor();
    (principal, actor)
}

pub async fn create_test_period(pool: &PgPool, name: &str) -> AcademicPeriod {
    sqlx::query_as::<_, AcademicPeriod>(
        r#"INSERT INTO academic_periods (name, start_date, end_date)
           VALUES ($1, $2, $3)
           RETURNING id, name, start_date, end_date, is_active, created_at, updated_at"#,
    )
    .bind(name)
    .bind(date(2025, 1, 13))
    .bind(date(2025, 7, 18))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_offering(
    pool: &PgPool,
    period: &AcademicPeriod,
    subject: Subject,
    group_label: &str,
    capacity: i32,
    teacher_id: Option<UserId>,
) -> Offering {
    sqlx::query_as::<_, Offering>(
        r#"INSERT INTO offerings (subject, period_id, group_label, teacher_id, capacity)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING id, subject, period_id, group_label, teacher_id, capacity, created_at, updated_at"#,
    )
    .bind(subject)
    .bind(period.id)
    .bind(group_label)
    .bind(teacher_id)
    .bind(capacity)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_active(pool: &PgPool, offering: &Offering) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE offering_id = $1 AND status = 'active'")
        .bind(offering.id)
        .fetch_one(pool)
        .await
        .unwrap()
}
