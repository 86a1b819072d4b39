use std::sync::Arc;

use octa_core::model::{AgeRange, AttemptId, Gender};

use crate::api::{ScoringApi, StartRequest};
use crate::error::SessionError;

/// Creates new attempts from the respondent's profile.
#[derive(Clone)]
pub struct StartService {
    api: Arc<dyn ScoringApi>,
}

impl StartService {
    #[must_use]
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self { api }
    }

    /// Starts an attempt. The age bracket is sent as its representative age.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Rejected` when the service refuses the profile or
    /// answers without a valid attempt id, and `SessionError::Transient` when it
    /// cannot be reached. Never retried.
    pub async fn start(
        &self,
        gender: Gender,
        age_range: AgeRange,
    ) -> Result<AttemptId, SessionError> {
        let attempt_id = self
            .api
            .start_attempt(StartRequest { gender, age_range })
            .await?;
        tracing::info!(%attempt_id, %gender, %age_range, "attempt started");
        Ok(attempt_id)
    }
}
