//! The academy's closed subject catalog ("cátedras").

use std::fmt;
use std::str::FromStr;

use expresarte_core::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Instrument,
    LanguageCourse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subject")]
pub enum Subject {
    #[serde(rename = "bass")]
    #[sqlx(rename = "bass")]
    Bass,
    #[serde(rename = "drums")]
    #[sqlx(rename = "drums")]
    Drums,
    #[serde(rename = "voice")]
    #[sqlx(rename = "voice")]
    Voice,
    #[serde(rename = "cuatro")]
    #[sqlx(rename = "cuatro")]
    Cuatro,
    #[serde(rename = "guitar")]
    #[sqlx(rename = "guitar")]
    Guitar,
    #[serde(rename = "electric_guitar")]
    #[sqlx(rename = "electric_guitar")]
    ElectricGuitar,
    #[serde(rename = "minor_percussion")]
    #[sqlx(rename = "minor_percussion")]
    MinorPercussion,
    #[serde(rename = "keyboard")]
    #[sqlx(rename = "keyboard")]
    Keyboard,
    #[serde(rename = "violin")]
    #[sqlx(rename = "violin")]
    Violin,
    #[serde(rename = "language_initial")]
    #[sqlx(rename = "language_initial")]
    LanguageInitial,
    #[serde(rename = "language_intermediate")]
    #[sqlx(rename = "language_intermediate")]
    LanguageIntermediate,
    #[serde(rename = "language_i")]
    #[sqlx(rename = "language_i")]
    LanguageI,
    #[serde(rename = "language_ii")]
    #[sqlx(rename = "language_ii")]
    LanguageII,
}

impl Subject {
    pub const ALL: [Subject; 13] = [
        Subject::Bass,
        Subject::Drums,
        Subject::Voice,
        Subject::Cuatro,
        Subject::Guitar,
        Subject::ElectricGuitar,
        Subject::MinorPercussion,
        Subject::Keyboard,
        Subject::Violin,
        Subject::LanguageInitial,
        Subject::LanguageIntermediate,
        Subject::LanguageI,
        Subject::LanguageII,
    ];

    /// Storage and wire name.
    pub const fn code(self) -> &'static str {
        match self {
            Subject::Bass => "bass",
            Subject::Drums => "drums",
            Subject::Voice => "voice",
            Subject::Cuatro => "cuatro",
            Subject::Guitar => "guitar",
            Subject::ElectricGuitar => "electric_guitar",
            Subject::MinorPercussion => "minor_percussion",
            Subject::Keyboard => "keyboard",
            Subject::Violin => "violin",
            Subject::LanguageInitial => "language_initial",
            Subject::LanguageIntermediate => "language_intermediate",
            Subject::LanguageI => "language_i",
            Subject::LanguageII => "language_ii",
        }
    }

    /// Name shown to students and staff.
    pub const fn label(self) -> &'static str {
        match self {
            Subject::Bass => "Bajo",
            Subject::Drums => "Batería",
            Subject::Voice => "Canto",
            Subject::Cuatro => "Cuatro",
            Subject::Guitar => "Guitarra",
            Subject::ElectricGuitar => "Guitarra Eléctrica",
            Subject::MinorPercussion => "Percusión Menor",
            Subject::Keyboard => "Teclado",
            Subject::Violin => "Violín",
            Subject::LanguageInitial => "Lenguaje Inicial",
            Subject::LanguageIntermediate => "Lenguaje Intermedio",
            Subject::LanguageI => "Lenguaje I",
            Subject::LanguageII => "Lenguaje II",
        }
    }

    pub const fn kind(self) -> SubjectKind {
        match self {
            Subject::LanguageInitial
            | Subject::LanguageIntermediate
            | Subject::LanguageI
            | Subject::LanguageII => SubjectKind::LanguageCourse,
            _ => SubjectKind::Instrument,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the code (`electric_guitar`) or the display label
/// (`Guitarra Eléctrica`).
impl FromStr for Subject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.code() == s || subject.label() == s)
            .ok_or_else(|| AppError::validation(anyhow::anyhow!("Unknown subject: {}", s)))
    }
}
