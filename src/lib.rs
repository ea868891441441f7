//! # Expresarte
//!
//! Administration core for a music academy: principals with roles, academic
//! periods, subject offerings, teacher assignments, enrollment and grading.
//!
//! Every operation takes the acting principal as `Option<&Actor>`, checks it
//! against the shared [`AccessPolicy`](expresarte_auth::AccessPolicy), then
//! applies its own invariants inside one database transaction.
//!
//! ```text
//! src/
//! ├── access.rs       # permission gate shared by all services
//! ├── validation.rs   # DTO validation helpers
//! ├── state.rs        # AppState wiring
//! └── modules/
//!     ├── principals/        # accounts, roles, deactivation, bootstrap
//!     ├── periods/           # academic periods
//!     ├── offerings/         # offerings and capacity
//!     ├── teacher_subjects/  # teacher qualifications
//!     ├── enrollments/       # seat allocation and lifecycle
//!     └── grades/            # grade recording
//! ```
//!
//! ## Role Hierarchy
//!
//! ```text
//! super_admin > admin > academic > teacher > student
//! ```
//!
//! A role holds its own permissions plus everything held by the roles below it.

pub mod access;
pub mod modules;
pub mod state;
pub mod validation;

pub use expresarte_auth;
pub use expresarte_config;
pub use expresarte_core;
pub use expresarte_db;
pub use expresarte_models;

pub use state::{AppState, init_app_state};
