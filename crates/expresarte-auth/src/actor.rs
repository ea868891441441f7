use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// The principal on whose behalf an operation runs.
///
/// Resolved by the caller (session, token, CLI bootstrap) and handed to the
/// services as `Option<&Actor>`; `None` means nobody is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub is_active: bool,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            is_active: true,
        }
    }

    pub fn is(&self, id: &Uuid) -> bool {
        &self.id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_matches_only_own_id() {
        let id = Uuid::new_v4();
        let actor = Actor::new(id, Role::Student);

        assert!(actor.is(&id));
        assert!(!actor.is(&Uuid::new_v4()));
        assert!(actor.is_active);
    }
}
