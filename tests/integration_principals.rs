mod common;

use common::{
    count_rows, create_test_actor, create_test_principal, date, generate_unique_email, test_state,
};
use expresarte::expresarte_auth::Role;
use expresarte::expresarte_config::BootstrapConfig;
use expresarte::expresarte_core::{ErrorKind, verify_password};
use expresarte::expresarte_models::principals::{
    CreatePrincipalDto, PrincipalProfile, Sex, UpdateProfileDto,
};
use sqlx::PgPool;

fn new_principal(role: Role, password: Option<&str>) -> CreatePrincipalDto {
    CreatePrincipalDto {
        first_name: "Ana".to_string(),
        last_name: "Rodríguez".to_string(),
        email: generate_unique_email(),
        password: password.map(str::to_string),
        role,
        profile: PrincipalProfile::default(),
    }
}

fn bootstrap_config(email: &str) -> BootstrapConfig {
    BootstrapConfig {
        first_name: "Super".to_string(),
        last_name: "Admin".to_string(),
        email: email.to_string(),
        password: "change-me-now".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_principal_hashes_password(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let teacher = state
        .principals
        .create_principal(Some(&admin), new_principal(Role::Teacher, Some("tocar-guitarra")))
        .await
        .unwrap();
    assert_eq!(teacher.role, Role::Teacher);
    assert!(teacher.is_active);

    let hash = teacher.password_hash.as_deref().unwrap();
    assert_ne!(hash, "tocar-guitarra");
    assert!(verify_password("tocar-guitarra", hash).unwrap());

    let student = state
        .principals
        .create_principal(Some(&admin), new_principal(Role::Student, None))
        .await
        .unwrap();
    assert!(student.password_hash.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_principal_rejects_duplicate_email(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let dto = new_principal(Role::Student, None);
    let mut shouting = dto.clone();
    shouting.email = dto.email.to_uppercase();

    state.principals.create_principal(Some(&admin), dto).await.unwrap();
    let err = state
        .principals
        .create_principal(Some(&admin), shouting)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_principal_validation(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let before = count_rows(&pool, "principals").await;

    let mut bad_email = new_principal(Role::Student, None);
    bad_email.email = "not-an-email".to_string();
    let err = state.principals.create_principal(Some(&admin), bad_email).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let short_password = new_principal(Role::Teacher, Some("short"));
    let err = state
        .principals
        .create_principal(Some(&admin), short_password)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut blank = new_principal(Role::Student, None);
    blank.first_name = "   ".to_string();
    let err = state.principals.create_principal(Some(&admin), blank).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert_eq!(count_rows(&pool, "principals").await, before);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_role_hierarchy_limits_account_management(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let (_, academic) = create_test_actor(&pool, Role::Academic).await;

    let err = state
        .principals
        .create_principal(Some(&admin), new_principal(Role::SuperAdmin, Some("password123")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    state
        .principals
        .create_principal(Some(&admin), new_principal(Role::Admin, Some("password123")))
        .await
        .unwrap();

    let err = state
        .principals
        .create_principal(Some(&academic), new_principal(Role::Student, None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_role(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let (_, super_admin) = create_test_actor(&pool, Role::SuperAdmin).await;
    let student = create_test_principal(&pool, Role::Student).await;
    let boss = create_test_principal(&pool, Role::SuperAdmin).await;

    let promoted = state
        .principals
        .change_role(Some(&admin), student.id, Role::Teacher)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Teacher);

    let err = state
        .principals
        .change_role(Some(&admin), student.id, Role::SuperAdmin)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let err = state
        .principals
        .change_role(Some(&admin), boss.id, Role::Student)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    state
        .principals
        .change_role(Some(&super_admin), student.id, Role::Admin)
        .await
        .unwrap();

    let missing = state
        .principals
        .change_role(Some(&super_admin), Default::default(), Role::Teacher)
        .await
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_profile(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let student = create_test_principal(&pool, Role::Student).await;

    let updated = state
        .principals
        .update_profile(
            Some(&admin),
            student.id,
            UpdateProfileDto {
                first_name: Some("  Luisa ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name, "Luisa");
    assert_eq!(updated.last_name, student.last_name);

    let missing = state
        .principals
        .update_profile(Some(&admin), Default::default(), UpdateProfileDto::default())
        .await
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_profile_of_higher_rank_is_denied(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let super_admin = create_test_principal(&pool, Role::SuperAdmin).await;

    let err = state
        .principals
        .update_profile(
            Some(&admin),
            super_admin.id,
            UpdateProfileDto {
                first_name: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let stored = state.principals.get_principal(Some(&admin), super_admin.id).await.unwrap();
    assert_eq!(stored.first_name, super_admin.first_name);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_fields_round_trip(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;

    let created = state
        .principals
        .create_principal(
            Some(&admin),
            CreatePrincipalDto {
                profile: PrincipalProfile {
                    middle_name: Some(" María ".to_string()),
                    national_id: Some("001-1234567-8".to_string()),
                    birth_date: Some(date(2010, 5, 17)),
                    sex: Some(Sex::Female),
                    ..Default::default()
                },
                ..new_principal(Role::Student, None)
            },
        )
        .await
        .unwrap();
    assert_eq!(created.profile.middle_name.as_deref(), Some("María"));
    assert_eq!(created.profile.sex, Some(Sex::Female));
    assert_eq!(created.full_name(), "Ana María Rodríguez");

    let updated = state
        .principals
        .update_profile(
            Some(&admin),
            created.id,
            UpdateProfileDto {
                profile: PrincipalProfile {
                    second_last_name: Some("Peña".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name(), "Ana María Rodríguez Peña");
    assert_eq!(updated.profile.national_id.as_deref(), Some("001-1234567-8"));
    assert_eq!(updated.profile.birth_date, Some(date(2010, 5, 17)));

    let future = state
        .principals
        .update_profile(
            Some(&admin),
            created.id,
            UpdateProfileDto {
                profile: PrincipalProfile {
                    birth_date: Some(date(2999, 1, 1)),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(future.kind, ErrorKind::Validation);

    let blank = state
        .principals
        .update_profile(
            Some(&admin),
            created.id,
            UpdateProfileDto {
                profile: PrincipalProfile {
                    national_id: Some("   ".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(blank.kind, ErrorKind::Validation);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deactivate_is_idempotent_and_revokes_access(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, super_admin) = create_test_actor(&pool, Role::SuperAdmin).await;
    let (admin, _) = create_test_actor(&pool, Role::Admin).await;

    let first = state.principals.deactivate(Some(&super_admin), admin.id).await.unwrap();
    assert!(!first.is_active);
    let second = state.principals.deactivate(Some(&super_admin), admin.id).await.unwrap();
    assert!(!second.is_active);
    assert_eq!(first.updated_at, second.updated_at);

    // actors resolved after deactivation carry the flag
    let stale = state
        .principals
        .get_principal(Some(&super_admin), admin.id)
        .await
        .unwrap()
        .to_actor();
    let err = state
        .principals
        .get_principal(Some(&stale), admin.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    assert_eq!(count_rows(&pool, "principals").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_super_admin_deactivates(pool: PgPool) {
    let state = test_state(pool.clone());
    let (_, admin) = create_test_actor(&pool, Role::Admin).await;
    let student = create_test_principal(&pool, Role::Student).await;

    let err = state.principals.deactivate(Some(&admin), student.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let err = state.principals.deactivate(None, student.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bootstrap_super_admin_is_idempotent(pool: PgPool) {
    let state = test_state(pool.clone());

    let created = state
        .principals
        .bootstrap_super_admin(&bootstrap_config("Director@Expresarte.test"))
        .await
        .unwrap();
    assert_eq!(created.role, Role::SuperAdmin);
    assert_eq!(created.email, "director@expresarte.test");

    let again = state
        .principals
        .bootstrap_super_admin(&bootstrap_config("someone-else@expresarte.test"))
        .await
        .unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(count_rows(&pool, "principals").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bootstrap_rejects_weak_password(pool: PgPool) {
    let state = test_state(pool.clone());
    let mut config = bootstrap_config("director@expresarte.test");
    config.password = "1234".to_string();

    let err = state.principals.bootstrap_super_admin(&config).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(count_rows(&pool, "principals").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_actor_by_email(pool: PgPool) {
    let state = test_state(pool.clone());
    let teacher = create_test_principal(&pool, Role::Teacher).await;

    let actor = state
        .principals
        .resolve_actor(&format!("  {} ", teacher.email.to_uppercase()))
        .await
        .unwrap();
    assert!(actor.is(teacher.id.as_uuid()));
    assert_eq!(actor.role, Role::Teacher);
    assert!(actor.is_active);

    let err = state
        .principals
        .resolve_actor("nobody@expresarte.test")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
