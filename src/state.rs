use std::sync::Arc;

use expresarte_auth::AccessPolicy;
use expresarte_config::{AcademicConfig, DatabaseConfig};
use expresarte_core::AppError;
use expresarte_db::Database;

use crate::modules::enrollments::EnrollmentService;
use crate::modules::grades::GradeService;
use crate::modules::offerings::OfferingService;
use crate::modules::periods::PeriodService;
use crate::modules::principals::PrincipalService;
use crate::modules::teacher_subjects::TeacherSubjectService;

/// Every service, wired to one database handle and one access policy.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub policy: Arc<AccessPolicy>,
    pub principals: PrincipalService,
    pub periods: PeriodService,
    pub offerings: OfferingService,
    pub teacher_subjects: TeacherSubjectService,
    pub enrollments: EnrollmentService,
    pub grades: GradeService,
}

impl AppState {
    pub fn new(db: Database, policy: Arc<AccessPolicy>, academic: &AcademicConfig) -> Self {
        Self {
            principals: PrincipalService::new(db.clone(), policy.clone()),
            periods: PeriodService::new(db.clone(), policy.clone()),
            offerings: OfferingService::new(
                db.clone(),
                policy.clone(),
                academic.default_offering_capacity,
            ),
            teacher_subjects: TeacherSubjectService::new(db.clone(), policy.clone()),
            enrollments: EnrollmentService::new(db.clone(), policy.clone()),
            grades: GradeService::new(db.clone(), policy.clone()),
            db,
            policy,
        }
    }
}

/// Build the state from the environment with the standard access policy.
pub async fn init_app_state() -> Result<AppState, AppError> {
    let db_config = DatabaseConfig::from_env()?;
    let db = Database::connect(&db_config).await?;

    Ok(AppState::new(
        db,
        Arc::new(AccessPolicy::standard()),
        &AcademicConfig::from_env(),
    ))
}
