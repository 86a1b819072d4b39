use std::ops::Range;
use thiserror::Error;

use crate::model::answers::AnswerSheet;
use crate::model::question::Question;

/// Number of questions shown together on one page.
pub const PAGE_SIZE: usize = 3;

/// Number of pages needed for `question_count` questions.
#[must_use]
pub fn page_count(question_count: usize) -> usize {
    question_count.div_ceil(PAGE_SIZE)
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PageError {
    #[error("the question set is empty")]
    NoQuestions,

    #[error("page {index} is out of range (0..{total})")]
    OutOfRange { index: usize, total: usize },
}

//
// ─── PAGES ─────────────────────────────────────────────────────────────────────
//

/// The ordered question set split into fixed-size pages.
///
/// Pages are derived on demand from the question order, so they stay stable for as
/// long as the question list does. Only the last page may be short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPages {
    questions: Vec<Question>,
}

impl QuestionPages {
    /// # Errors
    ///
    /// Returns `PageError::NoQuestions` for an empty question list.
    pub fn new(questions: Vec<Question>) -> Result<Self, PageError> {
        if questions.is_empty() {
            return Err(PageError::NoQuestions);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        page_count(self.questions.len())
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.total_pages().saturating_sub(1)
    }

    /// Positions (into the full list) covered by page `index`.
    ///
    /// # Errors
    ///
    /// Returns `PageError::OutOfRange` if `index >= total_pages()`.
    pub fn bounds(&self, index: usize) -> Result<Range<usize>, PageError> {
        let total = self.total_pages();
        if index >= total {
            return Err(PageError::OutOfRange { index, total });
        }
        let start = index * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(self.questions.len());
        Ok(start..end)
    }

    /// Questions shown on page `index`.
    ///
    /// # Errors
    ///
    /// Returns `PageError::OutOfRange` if `index >= total_pages()`.
    pub fn page(&self, index: usize) -> Result<&[Question], PageError> {
        let range = self.bounds(index)?;
        Ok(&self.questions[range])
    }

    /// True when every question on page `index` has a rating in `answers`.
    ///
    /// # Errors
    ///
    /// Returns `PageError::OutOfRange` if `index >= total_pages()`.
    pub fn is_page_complete(&self, index: usize, answers: &AnswerSheet) -> Result<bool, PageError> {
        Ok(self
            .page(index)?
            .iter()
            .all(|question| answers.is_answered(question.id())))
    }

    /// First page that still has an unanswered question, if any.
    #[must_use]
    pub fn first_incomplete_page(&self, answers: &AnswerSheet) -> Option<usize> {
        self.questions
            .iter()
            .position(|question| !answers.is_answered(question.id()))
            .map(|pos| pos / PAGE_SIZE)
    }
}
