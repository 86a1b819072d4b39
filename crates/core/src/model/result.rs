use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use thiserror::Error;

use crate::model::ids::AttemptId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Ways a scored result can violate its shape.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("result contains no personality types")]
    NoTypes,

    #[error("tie flag is {is_tie} but {count} personality type(s) were returned")]
    TieFlagMismatch { is_tie: bool, count: usize },

    #[error("tied types do not share the top score ({top} vs {other})")]
    UnevenTie { top: f64, other: f64 },

    #[error("score {0} is not a finite number")]
    NonFiniteScore(f64),
}

//
// ─── PERSONALITY TYPE ──────────────────────────────────────────────────────────
//

/// One personality type matched by the scoring service.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalityType {
    pub id: String,
    pub type_code: String,
    pub type_name: String,
    pub title: String,
    pub theme_sentence: String,
    pub description: String,
    pub description_points: Vec<String>,
    pub strength_keywords: Vec<String>,
    pub weakness_keywords: Vec<String>,
    pub calculated_score: f64,
}

/// Score descending, then type code ascending.
fn display_order(a: &PersonalityType, b: &PersonalityType) -> Ordering {
    b.calculated_score
        .total_cmp(&a.calculated_score)
        .then_with(|| a.type_code.cmp(&b.type_code))
}

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// Scored outcome of a submitted attempt.
///
/// Always holds at least one type. When `is_tie` is set every listed type shares the
/// top score; otherwise exactly one type is listed.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    attempt_id: AttemptId,
    completed_at: DateTime<Utc>,
    max_score: f64,
    personality_types: Vec<PersonalityType>,
    is_tie: bool,
    total_questions_answered: u32,
}

impl TestResult {
    /// Builds a result and checks the tie invariant.
    ///
    /// Types are reordered by descending score with `type_code` as a stable tiebreak.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` when no types are present, a score is not finite, or the
    /// tie flag disagrees with the listed types.
    pub fn new(
        attempt_id: AttemptId,
        completed_at: DateTime<Utc>,
        max_score: f64,
        mut personality_types: Vec<PersonalityType>,
        is_tie: bool,
        total_questions_answered: u32,
    ) -> Result<Self, ResultError> {
        if personality_types.is_empty() {
            return Err(ResultError::NoTypes);
        }
        if let Some(bad) = personality_types
            .iter()
            .map(|t| t.calculated_score)
            .chain(std::iter::once(max_score))
            .find(|score| !score.is_finite())
        {
            return Err(ResultError::NonFiniteScore(bad));
        }

        let count = personality_types.len();
        if is_tie != (count > 1) {
            return Err(ResultError::TieFlagMismatch { is_tie, count });
        }

        personality_types.sort_by(display_order);
        let top = personality_types[0].calculated_score;
        if let Some(other) = personality_types
            .iter()
            .map(|t| t.calculated_score)
            .find(|score| *score != top)
        {
            return Err(ResultError::UnevenTie { top, other });
        }

        Ok(Self {
            attempt_id,
            completed_at,
            max_score,
            personality_types,
            is_tie,
            total_questions_answered,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    #[must_use]
    pub fn is_tie(&self) -> bool {
        self.is_tie
    }

    #[must_use]
    pub fn total_questions_answered(&self) -> u32 {
        self.total_questions_answered
    }

    /// All matched types in display order.
    #[must_use]
    pub fn personality_types(&self) -> &[PersonalityType] {
        &self.personality_types
    }

    /// The type that leads the result. For a tie this is the first in display order.
    #[must_use]
    pub fn primary(&self) -> &PersonalityType {
        &self.personality_types[0]
    }

    /// Types that share the top score, in display order. Each one gets equal weight
    /// when rendered.
    #[must_use]
    pub fn headline(&self) -> &[PersonalityType] {
        &self.personality_types
    }

    /// `score` as a percentage of the maximum, rounded down, clamped to 0-100.
    #[must_use]
    pub fn percent_of_max(&self, score: f64) -> u8 {
        if self.max_score <= 0.0 {
            return 0;
        }
        let pct = (score / self.max_score * 100.0).clamp(0.0, 100.0);
        // clamped to 0..=100 above
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = pct.floor() as u8;
        pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn attempt() -> AttemptId {
        AttemptId::parse("0b8e2f8a-5c1d-4a7e-9f3b-2d4c6e8a0b1c").unwrap()
    }

    fn ty(code: &str, score: f64) -> PersonalityType {
        PersonalityType {
            id: format!("id-{code}"),
            type_code: code.to_string(),
            type_name: format!("Type {code}"),
            title: String::new(),
            theme_sentence: format!("{code} theme"),
            description: String::new(),
            description_points: Vec::new(),
            strength_keywords: Vec::new(),
            weakness_keywords: Vec::new(),
            calculated_score: score,
        }
    }

    #[test]
    fn two_way_tie_at_42_of_50() {
        let result = TestResult::new(
            attempt(),
            fixed_now(),
            50.0,
            vec![ty("T7", 42.0), ty("T2", 42.0)],
            true,
            24,
        )
        .unwrap();

        assert!(result.is_tie());
        assert_eq!(result.personality_types().len(), 2);
        assert!(
            result
                .personality_types()
                .iter()
                .all(|t| t.calculated_score == 42.0)
        );
        let codes: Vec<&str> = result
            .headline()
            .iter()
            .map(|t| t.type_code.as_str())
            .collect();
        assert_eq!(codes, vec!["T2", "T7"]);
        assert_eq!(result.percent_of_max(42.0), 84);
    }

    #[test]
    fn single_type_is_not_a_tie() {
        let result = TestResult::new(
            attempt(),
            fixed_now(),
            50.0,
            vec![ty("A", 31.0)],
            false,
            24,
        )
        .unwrap();
        assert!(!result.is_tie());
        assert_eq!(result.primary().type_code, "A");
    }

    #[test]
    fn tie_flag_must_match_type_count() {
        let err = TestResult::new(attempt(), fixed_now(), 50.0, vec![ty("A", 3.0)], true, 3)
            .unwrap_err();
        assert_eq!(
            err,
            ResultError::TieFlagMismatch {
                is_tie: true,
                count: 1
            }
        );

        let err = TestResult::new(
            attempt(),
            fixed_now(),
            50.0,
            vec![ty("A", 3.0), ty("B", 3.0)],
            false,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::TieFlagMismatch { .. }));
    }

    #[test]
    fn tied_types_must_share_the_top_score() {
        let err = TestResult::new(
            attempt(),
            fixed_now(),
            50.0,
            vec![ty("A", 40.0), ty("B", 42.0)],
            true,
            3,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResultError::UnevenTie {
                top: 42.0,
                other: 40.0
            }
        );
    }

    #[test]
    fn empty_and_non_finite_results_are_rejected() {
        assert_eq!(
            TestResult::new(attempt(), fixed_now(), 50.0, Vec::new(), false, 0),
            Err(ResultError::NoTypes)
        );
        let err = TestResult::new(
            attempt(),
            fixed_now(),
            50.0,
            vec![ty("A", f64::NAN)],
            false,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::NonFiniteScore(_)));
    }

    #[test]
    fn percent_is_clamped() {
        let result = TestResult::new(
            attempt(),
            fixed_now(),
            0.0,
            vec![ty("A", 1.0)],
            false,
            1,
        )
        .unwrap();
        assert_eq!(result.percent_of_max(1.0), 0);
    }
}
