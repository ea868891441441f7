//! # Expresarte Core
//!
//! Foundational types shared by every Expresarte crate:
//!
//! - [`errors`]: the [`AppError`] / [`ErrorKind`] failure taxonomy
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use expresarte_core::{AppError, ErrorKind};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Offering not found"));
//! assert_eq!(error.kind, ErrorKind::NotFound);
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, ErrorKind};
pub use password::{hash_password, verify_password};
