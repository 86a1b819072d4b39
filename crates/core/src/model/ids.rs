use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::{Uuid, Variant};

/// Length of the canonical hyphenated textual form (8-4-4-4-12).
const HYPHENATED_LEN: usize = 36;

/// Byte offsets of the four hyphens in the canonical form.
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors produced while validating an attempt identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptIdError {
    #[error("attempt id is missing")]
    Missing,

    #[error("attempt id is not a canonical version-4 UUID: {raw}")]
    Malformed { raw: String },
}

//
// ─── ATTEMPT ID ────────────────────────────────────────────────────────────────
//

/// Identifier of one questionnaire attempt.
///
/// Only the canonical hyphenated form of a version-4 UUID with the RFC 4122
/// variant (`xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx`) is accepted. Hex digits may
/// be upper or lower case; braces, URNs and the 32-digit simple form are rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns `AttemptIdError::Missing` for blank input and
    /// `AttemptIdError::Malformed` for anything that is not a canonical UUIDv4.
    pub fn parse(raw: &str) -> Result<Self, AttemptIdError> {
        if raw.trim().is_empty() {
            return Err(AttemptIdError::Missing);
        }

        let malformed = || AttemptIdError::Malformed {
            raw: raw.to_string(),
        };

        let bytes = raw.as_bytes();
        if bytes.len() != HYPHENATED_LEN {
            return Err(malformed());
        }
        for (idx, byte) in bytes.iter().enumerate() {
            let expect_hyphen = HYPHEN_POSITIONS.contains(&idx);
            let ok = if expect_hyphen {
                *byte == b'-'
            } else {
                byte.is_ascii_hexdigit()
            };
            if !ok {
                return Err(malformed());
            }
        }

        let uuid = Uuid::parse_str(raw).map_err(|_| malformed())?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(malformed());
        }

        Ok(Self(uuid))
    }

    /// Parses an optional raw value, treating `None` as a missing id.
    ///
    /// # Errors
    ///
    /// Same as [`AttemptId::parse`].
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, AttemptIdError> {
        raw.map_or(Err(AttemptIdError::Missing), Self::parse)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0.hyphenated())
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for AttemptId {
    type Err = AttemptIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AttemptId {
    type Error = AttemptIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AttemptId> for String {
    fn from(value: AttemptId) -> Self {
        value.to_string()
    }
}

//
// ─── QUESTION ID ───────────────────────────────────────────────────────────────
//

/// Identifier of a question inside the question bank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u32);

impl QuestionId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "3f2b8c1e-9a4d-4e6f-8b2a-1c3d5e7f9a0b";

    #[test]
    fn accepts_canonical_v4() {
        let id = AttemptId::parse(VALID).unwrap();
        assert_eq!(id.to_string(), VALID);
    }

    #[test]
    fn accepts_uppercase_hex_and_normalizes_display() {
        let id = AttemptId::parse(&VALID.to_uppercase()).unwrap();
        assert_eq!(id.to_string(), VALID);
    }

    #[test]
    fn accepts_every_rfc_variant_nibble() {
        for nibble in ['8', '9', 'a', 'b', 'A', 'B'] {
            let raw = format!("3f2b8c1e-9a4d-4e6f-{nibble}b2a-1c3d5e7f9a0b");
            assert!(AttemptId::parse(&raw).is_ok(), "variant {nibble}");
        }
    }

    #[test]
    fn rejects_not_a_uuid() {
        assert_eq!(
            AttemptId::parse("not-a-uuid"),
            Err(AttemptIdError::Malformed {
                raw: "not-a-uuid".into()
            })
        );
    }

    #[test]
    fn rejects_blank_and_missing() {
        assert_eq!(AttemptId::parse("   "), Err(AttemptIdError::Missing));
        assert_eq!(AttemptId::parse_optional(None), Err(AttemptIdError::Missing));
    }

    #[test]
    fn rejects_other_versions() {
        // version 1
        assert!(AttemptId::parse("3f2b8c1e-9a4d-1e6f-8b2a-1c3d5e7f9a0b").is_err());
        // version 7
        assert!(AttemptId::parse("3f2b8c1e-9a4d-7e6f-8b2a-1c3d5e7f9a0b").is_err());
    }

    #[test]
    fn rejects_non_rfc_variant() {
        assert!(AttemptId::parse("3f2b8c1e-9a4d-4e6f-cb2a-1c3d5e7f9a0b").is_err());
        assert!(AttemptId::parse("3f2b8c1e-9a4d-4e6f-7b2a-1c3d5e7f9a0b").is_err());
    }

    #[test]
    fn rejects_non_canonical_forms() {
        let simple = VALID.replace('-', "");
        assert!(AttemptId::parse(&simple).is_err());
        assert!(AttemptId::parse(&format!("{{{VALID}}}")).is_err());
        assert!(AttemptId::parse(&format!("urn:uuid:{VALID}")).is_err());
        assert!(AttemptId::parse(&format!(" {VALID}")).is_err());
        assert!(AttemptId::parse("3f2b8c1e-9a4d-4e6f-8b2a-1c3d5e7f9a0g").is_err());
    }

    #[test]
    fn try_from_string_validates() {
        let ok = AttemptId::try_from(VALID.to_string()).unwrap();
        assert_eq!(String::from(ok), VALID);
        assert!(AttemptId::try_from("nope".to_string()).is_err());
    }

    #[test]
    fn question_id_display() {
        assert_eq!(QuestionId::new(42).to_string(), "42");
    }
}
