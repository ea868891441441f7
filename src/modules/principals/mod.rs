//! Principal management: account creation, role changes, profile edits,
//! deactivation and the first super admin bootstrap.

pub mod service;

pub use service::PrincipalService;
