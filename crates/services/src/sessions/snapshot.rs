use octa_core::model::{AttemptId, QuestionId, Rating, SubmissionState};

use super::state::SessionPhase;

/// Presentation-agnostic copy of a session at one point in time.
///
/// Carries no formatting beyond the 1-based page label; the UI decides how to
/// render the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub attempt_id: Option<AttemptId>,
    /// Zero-based.
    pub current_page: usize,
    pub total_pages: usize,
    pub questions: Vec<QuestionView>,
    pub answered: usize,
    pub total_questions: usize,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub page_complete: bool,
    pub submission: SubmissionState,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// `"3 / 8"` style label, empty before questions are loaded.
    #[must_use]
    pub fn page_label(&self) -> String {
        if self.total_pages == 0 {
            return String::new();
        }
        format!("{} / {}", self.current_page + 1, self.total_pages)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.phase == SessionPhase::Submitting
    }

    /// True when the submit action should be offered.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::Ready
            && self.is_last_page
            && self.page_complete
            && self.submission.accepts_submission()
    }
}

/// One question on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    /// 1-based position in the whole questionnaire.
    pub number: usize,
    pub text: String,
    pub rating: Option<Rating>,
}
