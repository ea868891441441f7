//! Authorization engine.
//!
//! An [`AccessPolicy`] holds the role → permission map. It is built once at
//! startup and shared read-only (usually behind an `Arc`).
//!
//! A role is granted a permission when either
//!
//! 1. the permission is listed explicitly for the role, or
//! 2. the permission is listed for any role the given role outranks.
//!
//! So a role inherits everything its subordinates can do without the map having
//! to repeat it, and the decision is monotonic in rank.

use std::collections::{HashMap, HashSet};

use expresarte_core::AppError;
use tracing::{error, warn};

use crate::actor::Actor;
use crate::permissions::Permission;
use crate::roles::Role;

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl AccessPolicy {
    /// Build a policy from an explicit map. Roles absent from the map are
    /// treated as misconfigured and denied everything.
    pub fn new(grants: HashMap<Role, HashSet<Permission>>) -> Self {
        Self { grants }
    }

    /// The academy's standard role map.
    pub fn standard() -> Self {
        use Permission::*;

        let mut grants = HashMap::new();
        grants.insert(Role::SuperAdmin, Permission::ALL.into_iter().collect());
        grants.insert(
            Role::Admin,
            HashSet::from([
                CreateUsers,
                EditUsers,
                ViewUsers,
                CreateCourses,
                EditCourses,
                ViewCourses,
                CreateSongs,
                EditSongs,
                ViewSongs,
                AssignSongs,
                EditGrades,
                ViewGrades,
                ManageAcademicPeriods,
                GenerateReports,
            ]),
        );
        grants.insert(
            Role::Academic,
            HashSet::from([
                ViewUsers,
                CreateCourses,
                EditCourses,
                ViewCourses,
                CreateSongs,
                EditSongs,
                ViewSongs,
                AssignSongs,
                EditGrades,
                ViewGrades,
                ManageEnrollments,
            ]),
        );
        grants.insert(
            Role::Teacher,
            HashSet::from([ViewCourses, ViewSongs, EditGrades, ViewGrades]),
        );
        grants.insert(
            Role::Student,
            HashSet::from([ViewCourses, ViewSongs, ViewGrades, EnrollInCourses]),
        );

        Self { grants }
    }

    pub fn explicit_permissions(&self, role: Role) -> Option<&HashSet<Permission>> {
        self.grants.get(&role)
    }

    /// Decide whether `role` holds `permission`.
    pub fn authorize(&self, role: Role, permission: Permission) -> bool {
        let Some(explicit) = self.grants.get(&role) else {
            error!(
                role = %role,
                permission = %permission,
                "role has no entry in the access policy, denying"
            );
            return false;
        };

        if explicit.contains(&permission) {
            return true;
        }

        self.grants
            .iter()
            .any(|(other, perms)| role.outranks(*other) && perms.contains(&permission))
    }

    /// Every permission `role` ends up with after inheritance.
    pub fn effective_permissions(&self, role: Role) -> HashSet<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.authorize(role, *p))
            .collect()
    }

    /// Gate an operation on a single permission.
    ///
    /// - no actor: [`ErrorKind::Unauthenticated`](expresarte_core::ErrorKind::Unauthenticated)
    /// - deactivated actor or missing permission:
    ///   [`ErrorKind::PermissionDenied`](expresarte_core::ErrorKind::PermissionDenied)
    pub fn require(&self, actor: Option<&Actor>, permission: Permission) -> Result<(), AppError> {
        self.require_any(actor, &[permission])
    }

    /// Gate an operation on any one of several permissions.
    pub fn require_any(
        &self,
        actor: Option<&Actor>,
        permissions: &[Permission],
    ) -> Result<(), AppError> {
        let actor = actor.ok_or_else(AppError::unauthenticated)?;

        if !actor.is_active {
            warn!(actor_id = %actor.id, "deactivated principal attempted an operation");
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Account is deactivated"
            )));
        }

        if permissions.iter().any(|p| self.authorize(actor.role, *p)) {
            return Ok(());
        }

        let required: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
        warn!(
            actor_id = %actor.id,
            role = %actor.role,
            required = ?required,
            "permission denied"
        );

        Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required permission: {}, but role {} does not hold it",
            required.join(" or "),
            actor.role
        )))
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
