use std::collections::BTreeSet;
use std::sync::Arc;

use octa_core::model::{AttemptId, Question};

use crate::api::ScoringApi;
use crate::error::SessionError;

/// Fetches the ordered question list of an attempt.
#[derive(Clone)]
pub struct QuestionLoader {
    api: Arc<dyn ScoringApi>,
}

impl QuestionLoader {
    #[must_use]
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self { api }
    }

    /// Loads the questions in service order. Makes exactly one request.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for unknown or expired attempts,
    /// `SessionError::Transient` when the service cannot be reached, and
    /// `SessionError::Rejected` when the list repeats a question id.
    pub async fn load(&self, attempt_id: AttemptId) -> Result<Vec<Question>, SessionError> {
        let questions = self.api.questions(attempt_id).await?;

        let mut seen = BTreeSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id())) {
            return Err(SessionError::Rejected {
                message: format!("question {} appears more than once", dup.id()),
            });
        }

        tracing::debug!(%attempt_id, count = questions.len(), "questions loaded");
        Ok(questions)
    }
}
