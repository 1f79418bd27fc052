//! Audience difficulty presets.
//!
//! A difficulty only shapes the prompt sent to the generator; nothing else in
//! the course logic branches on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string names no known difficulty level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown difficulty '{0}': expected one of 'child', 'teenager', 'undergrad', 'professional'")]
pub struct UnknownDifficulty(pub String);

/// Target audience for a generated course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DifficultyLevel {
    /// Explain like I'm five.
    Child,
    /// High school level.
    Teenager,
    /// University level (default).
    #[default]
    Undergrad,
    /// Working practitioner.
    Professional,
}

impl DifficultyLevel {
    /// All levels, from simplest to most advanced.
    pub const ALL: [Self; 4] = [
        Self::Child,
        Self::Teenager,
        Self::Undergrad,
        Self::Professional,
    ];

    /// Human-readable audience label, as embedded in prompts and JSON.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Child => "5 Year Old (ELI5)",
            Self::Teenager => "High School Student",
            Self::Undergrad => "Undergraduate Student",
            Self::Professional => "Industry Professional",
        }
    }

    /// Short machine key used on the command line.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Teenager => "teenager",
            Self::Undergrad => "undergrad",
            Self::Professional => "professional",
        }
    }

    /// Parses either the label or the short key, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.key() == needle || level.label().to_lowercase() == needle)
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DifficultyLevel {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for DifficultyLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for DifficultyLevel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}
