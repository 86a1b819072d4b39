use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("unknown gender: {0} (expected male or female)")]
    UnknownGender(String),

    #[error("unknown age range: {0} (expected under18, 19-25, 26-50 or over51)")]
    UnknownAgeRange(String),
}

/// Respondent gender as accepted by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(ProfileError::UnknownGender(s.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bracket picked by the respondent.
///
/// The scoring service takes a single age, so each bracket is sent as a
/// representative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeRange {
    Under18,
    From19To25,
    From26To50,
    Over51,
}

impl AgeRange {
    pub const ALL: [AgeRange; 4] = [
        AgeRange::Under18,
        AgeRange::From19To25,
        AgeRange::From26To50,
        AgeRange::Over51,
    ];

    #[must_use]
    pub fn representative_age(self) -> u8 {
        match self {
            AgeRange::Under18 => 15,
            AgeRange::From19To25 => 22,
            AgeRange::From26To50 => 38,
            AgeRange::Over51 => 55,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgeRange::Under18 => "under18",
            AgeRange::From19To25 => "19-25",
            AgeRange::From26To50 => "26-50",
            AgeRange::Over51 => "over51",
        }
    }
}

impl FromStr for AgeRange {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AgeRange::ALL
            .into_iter()
            .find(|range| range.as_str() == wanted)
            .ok_or_else(|| ProfileError::UnknownAgeRange(s.to_string()))
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
