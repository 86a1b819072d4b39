use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;
use crate::model::rating::{Rating, RatingError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error("question {0} is not part of this attempt")]
    UnknownQuestion(QuestionId),
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// Ratings recorded for one attempt, restricted to the loaded question set.
///
/// A question has either no rating or exactly one; writing again replaces the
/// previous value. Rejected writes leave the sheet untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    known: BTreeSet<QuestionId>,
    ratings: BTreeMap<QuestionId, Rating>,
}

impl AnswerSheet {
    /// Creates an empty sheet accepting answers for `questions` only.
    #[must_use]
    pub fn for_questions(questions: &[Question]) -> Self {
        Self {
            known: questions.iter().map(Question::id).collect(),
            ratings: BTreeMap::new(),
        }
    }

    /// Records `score` for `question_id`, replacing any earlier rating.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Rating` when the score is outside 1-10 and
    /// `AnswerError::UnknownQuestion` when the id was not loaded.
    pub fn set(&mut self, question_id: QuestionId, score: i64) -> Result<Rating, AnswerError> {
        let rating = Rating::new(score)?;
        if !self.known.contains(&question_id) {
            return Err(AnswerError::UnknownQuestion(question_id));
        }
        self.ratings.insert(question_id, rating);
        Ok(rating)
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<Rating> {
        self.ratings.get(&question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.ratings.contains_key(&question_id)
    }

    /// Number of questions that have a rating.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.ratings.len()
    }

    /// Number of questions this sheet accepts answers for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.known.len()
    }

    /// True when every loaded question has a rating.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.known.is_empty() && self.ratings.len() == self.known.len()
    }

    #[must_use]
    pub fn ratings(&self) -> &BTreeMap<QuestionId, Rating> {
        &self.ratings
    }

    pub fn clear(&mut self) {
        self.known.clear();
        self.ratings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: u32) -> Vec<Question> {
        (1..=n)
            .map(|id| Question::new(QuestionId::new(id), format!("Q{id}")))
            .collect()
    }

    #[test]
    fn overwrites_previous_rating() {
        let mut sheet = AnswerSheet::for_questions(&questions(3));
        sheet.set(QuestionId::new(1), 4).unwrap();
        sheet.set(QuestionId::new(1), 9).unwrap();
        assert_eq!(sheet.get(QuestionId::new(1)).unwrap().value(), 9);
        assert_eq!(sheet.answered(), 1);
    }

    #[test]
    fn out_of_range_write_leaves_sheet_unchanged() {
        let mut sheet = AnswerSheet::for_questions(&questions(3));
        sheet.set(QuestionId::new(2), 6).unwrap();
        let before = sheet.clone();

        for bad in [0, 11, -1, 100] {
            let err = sheet.set(QuestionId::new(2), bad).unwrap_err();
            assert_eq!(err, AnswerError::Rating(RatingError::OutOfRange(bad)));
        }
        assert_eq!(sheet, before);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut sheet = AnswerSheet::for_questions(&questions(3));
        let err = sheet.set(QuestionId::new(99), 5).unwrap_err();
        assert_eq!(err, AnswerError::UnknownQuestion(QuestionId::new(99)));
        assert_eq!(sheet.answered(), 0);
    }

    #[test]
    fn completeness_tracks_all_questions() {
        let mut sheet = AnswerSheet::for_questions(&questions(2));
        assert!(!sheet.is_complete());
        sheet.set(QuestionId::new(1), 1).unwrap();
        sheet.set(QuestionId::new(2), 10).unwrap();
        assert!(sheet.is_complete());
    }

    #[test]
    fn empty_sheet_is_never_complete() {
        assert!(!AnswerSheet::default().is_complete());
    }
}
