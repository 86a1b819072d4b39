//! Port to the external scoring service and its adapters.

mod http;
mod memory;
mod wire;

use std::collections::BTreeMap;

use async_trait::async_trait;
use octa_core::model::{AgeRange, AttemptId, Gender, Question, QuestionId, Rating, TestResult};

use crate::error::ApiError;

pub use http::HttpScoringClient;
pub use memory::{Endpoint, InMemoryScoringApi};

/// Respondent profile sent when creating an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartRequest {
    pub gender: Gender,
    pub age_range: AgeRange,
}

/// Contract of the scoring service consumed by the attempt client.
///
/// Implementations never retry on their own; retry policy belongs to the caller.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// Create a new attempt for the given respondent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the service rejects the profile or cannot be reached.
    async fn start_attempt(&self, request: StartRequest) -> Result<AttemptId, ApiError>;

    /// Fetch the ordered question list of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown or expired attempts.
    async fn questions(&self, attempt_id: AttemptId) -> Result<Vec<Question>, ApiError>;

    /// Hand in the full answer set of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the service refuses the answers or cannot be reached.
    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &BTreeMap<QuestionId, Rating>,
    ) -> Result<(), ApiError>;

    /// Fetch the scored result of a submitted attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the attempt was never submitted.
    async fn result(&self, attempt_id: AttemptId) -> Result<TestResult, ApiError>;
}
