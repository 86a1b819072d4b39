use std::sync::Arc;

use octa_core::model::{AttemptId, TestResult};

use crate::api::ScoringApi;
use crate::error::SessionError;
use crate::retry::{RetryPolicy, retry_transient};

/// Reads scored results, retrying transient failures with a fixed delay.
#[derive(Clone)]
pub struct ResultService {
    api: Arc<dyn ScoringApi>,
    retry: RetryPolicy,
}

impl ResultService {
    #[must_use]
    pub fn new(api: Arc<dyn ScoringApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Validates `raw_attempt_id` before fetching.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAttempt` without any request for a bad id,
    /// otherwise the same errors as [`ResultService::fetch_for`].
    pub async fn fetch(&self, raw_attempt_id: &str) -> Result<TestResult, SessionError> {
        let attempt_id = AttemptId::parse(raw_attempt_id)?;
        self.fetch_for(attempt_id).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for attempts that were never submitted,
    /// and `SessionError::Transient` once the retry budget is spent.
    pub async fn fetch_for(&self, attempt_id: AttemptId) -> Result<TestResult, SessionError> {
        let api = self.api.as_ref();
        let result = retry_transient(self.retry, move || api.result(attempt_id))
            .await
            .map_err(SessionError::from)?;

        tracing::info!(
            %attempt_id,
            types = result.personality_types().len(),
            is_tie = result.is_tie(),
            "result loaded"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::api::{Endpoint, InMemoryScoringApi};
    use crate::error::{ApiError, ErrorKind};

    #[tokio::test]
    async fn malformed_id_is_rejected_locally() {
        let api = InMemoryScoringApi::default();
        let service = ResultService::new(Arc::new(api.clone()), RetryPolicy::none());

        let err = service.fetch("123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(api.calls(Endpoint::Result), 0);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let api = InMemoryScoringApi::default();
        let service = ResultService::new(
            Arc::new(api.clone()),
            RetryPolicy::fixed(2, Duration::from_millis(1)),
        );

        let err = service
            .fetch("e4eaaaf2-d142-41e9-b4a2-4a9c1b0e7c61")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(api.calls(Endpoint::Result), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_surfaced_after_retries() {
        let api = InMemoryScoringApi::default();
        for _ in 0..3 {
            api.fail_next(
                Endpoint::Result,
                ApiError::Unavailable {
                    message: "503".into(),
                },
            );
        }
        let service = ResultService::new(
            Arc::new(api.clone()),
            RetryPolicy::fixed(2, Duration::from_millis(1)),
        );

        let err = service
            .fetch("e4eaaaf2-d142-41e9-b4a2-4a9c1b0e7c61")
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(api.calls(Endpoint::Result), 3);
    }
}
