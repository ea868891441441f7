mod common;

use common::{count_rows, create_test_actor, create_test_offering, create_test_period, date, test_state};
use expresarte::expresarte_auth::Role;
use expresarte::expresarte_core::ErrorKind;
use expresarte::expresarte_models::periods::{CreatePeriodDto, UpdatePeriodDto};
use expresarte::expresarte_models::subjects::Subject;
use sqlx::PgPool;

fn period_dto(name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> CreatePeriodDto {
    CreatePeriodDto {
        name: name.to_string(),
        start_date: date(start.0, start.1, start.2),
        end_date: date(end.0, end.1, end.2),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_period(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let period = state
        .periods
        .create_period(Some(&admin), period_dto("2025-I", (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap();

    assert_eq!(period.name, "2025-I");
    assert!(period.is_active);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_period_name_conflicts_and_keeps_original(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let first = state
        .periods
        .create_period(Some(&admin), period_dto("2025-II", (2025, 7, 1), (2025, 12, 15)))
        .await
        .unwrap();

    let err = state
        .periods
        .create_period(Some(&admin), period_dto("2025-II", (2025, 1, 1), (2025, 6, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let stored = state.periods.get_period(Some(&admin), first.id).await.unwrap();
    assert_eq!(stored.start_date, date(2025, 7, 1));
    assert_eq!(stored.end_date, date(2025, 12, 15));
    assert_eq!(count_rows(&pool, "academic_periods").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_create_period(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, student) = create_test_actor(&pool, Role::Student).await;

    let err = state
        .periods
        .create_period(Some(&student), period_dto("2025-I", (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PermissionDenied);
    assert_eq!(count_rows(&pool, "academic_periods").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_academic_cannot_manage_periods(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, academic) = create_test_actor(&pool, Role::Academic).await;

    let err = state
        .periods
        .create_period(Some(&academic), period_dto("2025-I", (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_period_requires_actor(pool: PgPool) {
    let state = test_state(pool.clone());

    let err = state
        .periods
        .create_period(None, period_dto("2025-I", (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_period_rejects_bad_input(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let reversed = state
        .periods
        .create_period(Some(&admin), period_dto("2025-I", (2025, 7, 18), (2025, 1, 13)))
        .await
        .unwrap_err();
    assert_eq!(reversed.kind, ErrorKind::Validation);

    let blank = state
        .periods
        .create_period(Some(&admin), period_dto("   ", (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap_err();
    assert_eq!(blank.kind, ErrorKind::Validation);

    let long = state
        .periods
        .create_period(Some(&admin), period_dto(&"P".repeat(51), (2025, 1, 13), (2025, 7, 18)))
        .await
        .unwrap_err();
    assert_eq!(long.kind, ErrorKind::Validation);

    assert_eq!(count_rows(&pool, "academic_periods").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_period(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let period = create_test_period(&pool, "2025-I").await;
    create_test_period(&pool, "2025-II").await;

    let updated = state
        .periods
        .update_period(
            Some(&admin),
            period.id,
            UpdatePeriodDto {
                end_date: Some(date(2025, 7, 31)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "2025-I");
    assert_eq!(updated.end_date, date(2025, 7, 31));

    let before_start = state
        .periods
        .update_period(
            Some(&admin),
            period.id,
            UpdatePeriodDto {
                end_date: Some(date(2024, 12, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(before_start.kind, ErrorKind::Validation);

    let renamed = state
        .periods
        .update_period(
            Some(&admin),
            period.id,
            UpdatePeriodDto {
                name: Some("2025-II".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(renamed.kind, ErrorKind::Conflict);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_set_period_active(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::SuperAdmin).await;
    let period = create_test_period(&pool, "2025-I").await;

    let closed = state
        .periods
        .set_period_active(Some(&admin), period.id, false)
        .await
        .unwrap();
    assert!(!closed.is_active);

    let missing = state
        .periods
        .set_period_active(Some(&admin), Default::default(), true)
        .await
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_period_with_offerings_is_rejected(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let period = create_test_period(&pool, "2025-I").await;
    create_test_offering(&pool, &period, Subject::Cuatro, "A", 10, None).await;

    let err = state
        .periods
        .delete_period(Some(&admin), period.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(count_rows(&pool, "academic_periods").await, 1);
    assert_eq!(count_rows(&pool, "offerings").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_empty_period(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let period = create_test_period(&pool, "2025-I").await;

    state.periods.delete_period(Some(&admin), period.id).await.unwrap();
    assert_eq!(count_rows(&pool, "academic_periods").await, 0);

    let again = state
        .periods
        .delete_period(Some(&admin), period.id)
        .await
        .unwrap_err();
    assert_eq!(again.kind, ErrorKind::NotFound);
}
