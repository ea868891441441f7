//! Academy-wide defaults.
//!
//! - `DEFAULT_OFFERING_CAPACITY`: seats given to an offering created without an
//!   explicit capacity (default: 20, must be positive)

use crate::{env_lookup, load_dotenv, parse_or};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcademicConfig {
    pub default_offering_capacity: i32,
}

impl Default for AcademicConfig {
    fn default() -> Self {
        Self {
            default_offering_capacity: Self::DEFAULT_OFFERING_CAPACITY,
        }
    }
}

impl AcademicConfig {
    pub const DEFAULT_OFFERING_CAPACITY: i32 = 20;

    #[must_use]
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let capacity = parse_or(
            &lookup,
            "DEFAULT_OFFERING_CAPACITY",
            Self::DEFAULT_OFFERING_CAPACITY,
        );

        Self {
            default_offering_capacity: if capacity > 0 {
                capacity
            } else {
                Self::DEFAULT_OFFERING_CAPACITY
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lookup_from;

    #[test]
    fn test_default_capacity() {
        assert_eq!(AcademicConfig::default().default_offering_capacity, 20);
        assert_eq!(AcademicConfig::from_lookup(lookup_from(&[])), AcademicConfig::default());
    }

    #[test]
    fn test_override_capacity() {
        let config = AcademicConfig::from_lookup(lookup_from(&[("DEFAULT_OFFERING_CAPACITY", "35")]));
        assert_eq!(config.default_offering_capacity, 35);
    }

    #[test]
    fn test_non_positive_capacity_falls_back() {
        let config = AcademicConfig::from_lookup(lookup_from(&[("DEFAULT_OFFERING_CAPACITY", "-3")]));
        assert_eq!(config.default_offering_capacity, 20);
    }
}
