//! # Expresarte Auth
//!
//! Role hierarchy, permission catalog and the [`AccessPolicy`] that decides
//! whether an [`Actor`] may perform an operation.
//!
//! ```ignore
//! use expresarte_auth::{AccessPolicy, Actor, Permission, Role};
//!
//! let policy = AccessPolicy::standard();
//! assert!(policy.authorize(Role::Admin, Permission::ViewCourses));
//! ```

pub mod actor;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use actor::Actor;
pub use permissions::Permission;
pub use policy::AccessPolicy;
pub use roles::Role;
