//! Credentials for the first super admin, created on an empty install.
//!
//! - `ADMIN_FIRST_NAME` (default: `Super`)
//! - `ADMIN_LAST_NAME` (default: `Admin`)
//! - `ADMIN_EMAIL` (required)
//! - `ADMIN_PASSWORD` (required)

use anyhow::Context;

use crate::{env_lookup, load_dotenv};

#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BootstrapConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        Ok(Self {
            first_name: lookup("ADMIN_FIRST_NAME").unwrap_or_else(|| "Super".to_string()),
            last_name: lookup("ADMIN_LAST_NAME").unwrap_or_else(|| "Admin".to_string()),
            email: required("ADMIN_EMAIL")?,
            password: required("ADMIN_PASSWORD")?,
        })
    }
}
