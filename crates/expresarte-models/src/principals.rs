//! Principals: every account in the academy, whatever its role.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use expresarte_auth::{Actor, Role};
use expresarte_core::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sex")]
pub enum Sex {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
    #[serde(rename = "N/A")]
    #[sqlx(rename = "N/A")]
    NotApplicable,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::NotApplicable];

    pub const fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sex::ALL
            .into_iter()
            .find(|sex| sex.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::validation(anyhow::anyhow!("Invalid sex: {}", s)))
    }
}

/// Optional personal data. Minors often have no national id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct PrincipalProfile {
    #[validate(length(min = 1, max = 50, message = "middle name must be 1-50 characters"))]
    pub middle_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "second last name must be 1-50 characters"))]
    pub second_last_name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "national id must be 1-20 characters"))]
    pub national_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
}

/// A birth date must not lie after `today`.
pub fn ensure_birth_date(birth_date: Option<NaiveDate>, today: NaiveDate) -> Result<(), AppError> {
    match birth_date {
        Some(date) if date > today => Err(AppError::validation(anyhow::anyhow!(
            "Birth date {} is in the future",
            date
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Principal {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: PrincipalProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Given names, then surnames, skipping the optional ones that are unset.
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.profile.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.profile.second_last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Completed years on `today`, when the birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.profile
            .birth_date
            .and_then(|birth| today.years_since(birth))
    }

    pub fn to_actor(&self) -> Actor {
        Actor {
            id: self.id.into_inner(),
            role: self.role,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrincipalDto {
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    /// Students are often created without credentials.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Role,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: PrincipalProfile,
}

/// Partial edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: PrincipalProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreatePrincipalDto {
        CreatePrincipalDto {
            first_name: "Ana".into(),
            last_name: "Rivas".into(),
            email: "ana.rivas@expresarte.org".into(),
            password: Some("cuatro2025".into()),
            role: Role::Student,
            profile: PrincipalProfile::default(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(dto().validate().is_ok());
        assert!(CreatePrincipalDto { password: None, ..dto() }.validate().is_ok());
        assert!(CreatePrincipalDto { email: "ana".into(), ..dto() }.validate().is_err());
        assert!(CreatePrincipalDto { first_name: "".into(), ..dto() }.validate().is_err());
        assert!(
            CreatePrincipalDto { password: Some("short".into()), ..dto() }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_profile_fields_are_validated() {
        let long_id = CreatePrincipalDto {
            profile: PrincipalProfile {
                national_id: Some("V".repeat(21)),
                ..Default::default()
            },
            ..dto()
        };
        assert!(long_id.validate().is_err());

        let full = CreatePrincipalDto {
            profile: PrincipalProfile {
                middle_name: Some("Lucía".into()),
                second_last_name: Some("Pérez".into()),
                national_id: Some("V-12345678".into()),
                birth_date: Some(date(2010, 3, 14)),
                sex: Some(Sex::Female),
            },
            ..dto()
        };
        assert!(full.validate().is_ok());

        let blank_middle = UpdateProfileDto {
            profile: PrincipalProfile {
                middle_name: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(blank_middle.validate().is_err());
    }

    #[test]
    fn test_update_dto_allows_partial() {
        assert!(UpdateProfileDto::default().validate().is_ok());
        let blank = UpdateProfileDto {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_birth_date_not_in_future() {
        let today = date(2025, 6, 1);
        assert!(ensure_birth_date(None, today).is_ok());
        assert!(ensure_birth_date(Some(today), today).is_ok());
        assert!(ensure_birth_date(Some(date(2025, 6, 2)), today).is_err());
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!("n/a".parse::<Sex>().unwrap(), Sex::NotApplicable);
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert!("X".parse::<Sex>().is_err());
        assert_eq!(serde_json::to_string(&Sex::NotApplicable).unwrap(), "\"N/A\"");
    }

    #[test]
    fn test_profile_deserializes_flat() {
        let dto: CreatePrincipalDto = serde_json::from_value(serde_json::json!({
            "first_name": "Ana",
            "last_name": "Rivas",
            "email": "ana@expresarte.org",
            "role": "student",
            "sex": "F",
            "birth_date": "2012-09-01"
        }))
        .unwrap();
        assert_eq!(dto.profile.sex, Some(Sex::Female));
        assert_eq!(dto.profile.birth_date, Some(date(2012, 9, 1)));
        assert!(dto.profile.national_id.is_none());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let now = Utc::now();
        let principal = Principal {
            id: UserId::new(),
            first_name: "Luis".into(),
            last_name: "Mora".into(),
            email: "luis@expresarte.org".into(),
            password_hash: Some("$2b$12$hash".into()),
            role: Role::Teacher,
            is_active: true,
            profile: PrincipalProfile {
                second_last_name: Some("Díaz".into()),
                birth_date: Some(date(1990, 8, 20)),
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&principal).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["second_last_name"], "Díaz");

        let actor = principal.to_actor();
        assert_eq!(actor.id, principal.id.into_inner());
        assert_eq!(actor.role, Role::Teacher);
        assert_eq!(principal.full_name(), "Luis Mora Díaz");
        assert_eq!(principal.age_on(date(2025, 8, 19)), Some(34));
        assert_eq!(principal.age_on(date(2025, 8, 20)), Some(35));
    }
}
