use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RatingError {
    #[error("rating {0} is outside the range 1-10")]
    OutOfRange(i64),
}

//
// ─── RATING ────────────────────────────────────────────────────────────────────
//

/// How strongly a statement describes the respondent.
///
/// `1` means "not like me at all", `10` means "exactly like me".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` unless `1 <= raw <= 10`.
    pub fn new(raw: i64) -> Result<Self, RatingError> {
        match u8::try_from(raw) {
            Ok(value) if (Self::MIN..=Self::MAX).contains(&value) => Ok(Self(value)),
            _ => Err(RatingError::OutOfRange(raw)),
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Every valid rating in ascending order, as shown on a rating scale.
    pub fn scale() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl fmt::Debug for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rating({})", self.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_one_through_ten() {
        for raw in -3_i64..=14 {
            let result = Rating::new(raw);
            if (1..=10).contains(&raw) {
                assert_eq!(result.unwrap().value() as i64, raw);
            } else {
                assert_eq!(result, Err(RatingError::OutOfRange(raw)));
            }
        }
    }

    #[test]
    fn rejects_values_that_overflow_u8() {
        assert!(Rating::new(266).is_err());
        assert!(Rating::new(i64::MIN).is_err());
    }

    #[test]
    fn scale_lists_ten_ratings() {
        let values: Vec<u8> = Rating::scale().map(|r| r.value()).collect();
        assert_eq!(values, (1..=10).collect::<Vec<_>>());
    }
}
