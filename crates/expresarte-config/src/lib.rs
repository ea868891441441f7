//! # Expresarte Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`database`]: connection pool settings
//! - [`academic`]: academy-wide defaults (offering capacity)
//! - [`bootstrap`]: credentials for the first super admin
//! - [`logging`]: log level, log directory and OpenTelemetry export
//!
//! Every `from_env()` reads the process environment after loading `.env` (if
//! present). Each also has a `from_lookup()` twin taking any key → value
//! function so parsing can be exercised without touching global state.
//!
//! # Example
//!
//! ```ignore
//! use expresarte_config::{AcademicConfig, DatabaseConfig};
//!
//! let db = DatabaseConfig::from_env()?;
//! let academic = AcademicConfig::from_env();
//! ```

pub mod academic;
pub mod bootstrap;
pub mod database;
pub mod logging;

pub use academic::AcademicConfig;
pub use bootstrap::BootstrapConfig;
pub use database::DatabaseConfig;
pub use logging::LoggingConfig;

/// Load `.env` into the process environment. Missing files are ignored.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a value or fall back to `default` when it is absent or malformed.
pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    pub fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }
}
