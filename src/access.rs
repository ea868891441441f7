//! Authorization gate used at the top of every service operation.

use expresarte_auth::{AccessPolicy, Actor, Permission};
use expresarte_core::{AppError, ErrorKind};

/// Require `permission` and hand back the (now known to be present) actor.
pub fn guard<'a>(
    policy: &AccessPolicy,
    actor: Option<&'a Actor>,
    permission: Permission,
) -> Result<&'a Actor, AppError> {
    guard_any(policy, actor, &[permission])
}

/// Like [`guard`], granting when any one of `permissions` is held.
pub fn guard_any<'a>(
    policy: &AccessPolicy,
    actor: Option<&'a Actor>,
    permissions: &[Permission],
) -> Result<&'a Actor, AppError> {
    if let Err(err) = policy.require_any(actor, permissions) {
        if err.kind == ErrorKind::PermissionDenied {
            expresarte_observability::track_authorization_denied(&denial_label(permissions));
        }
        return Err(err);
    }

    actor.ok_or_else(AppError::unauthenticated)
}

/// One metric label per denied check, however many permissions it accepted.
fn denial_label(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join("|")
}
