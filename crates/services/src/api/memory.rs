use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use octa_core::model::{AttemptId, Question, QuestionId, Rating, TestResult};

use super::{ScoringApi, StartRequest};
use crate::error::ApiError;

/// Operations of the scoring API, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    Questions,
    Submit,
    Result,
}

#[derive(Debug, Default)]
struct AttemptRecord {
    answers: Option<BTreeMap<QuestionId, Rating>>,
    result: Option<TestResult>,
}

#[derive(Debug, Default)]
struct MemoryState {
    question_bank: Vec<Question>,
    attempts: HashMap<AttemptId, AttemptRecord>,
    scripted_failures: VecDeque<(Endpoint, ApiError)>,
    calls: HashMap<Endpoint, usize>,
}

/// In-memory scoring service for tests and prototyping.
///
/// Every attempt is served the same question bank. Results are never computed;
/// they are planted with [`InMemoryScoringApi::set_result`].
#[derive(Clone, Default)]
pub struct InMemoryScoringApi {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryScoringApi {
    #[must_use]
    pub fn with_questions(question_bank: Vec<Question>) -> Self {
        let api = Self::default();
        api.lock().question_bank = question_bank;
        api
    }

    /// Make `attempt_id` known as if it had been started.
    pub fn register_attempt(&self, attempt_id: AttemptId) {
        self.lock().attempts.entry(attempt_id).or_default();
    }

    /// Plant the result returned for its attempt.
    pub fn set_result(&self, result: TestResult) {
        let attempt_id = result.attempt_id();
        self.lock()
            .attempts
            .entry(attempt_id)
            .or_default()
            .result = Some(result);
    }

    /// Fail the next call to `endpoint` with `error`. Failures queue in order.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.lock().scripted_failures.push_back((endpoint, error));
    }

    /// Number of calls received by `endpoint`.
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Answers accepted for `attempt_id`, if it was submitted.
    #[must_use]
    pub fn submitted_answers(&self, attempt_id: AttemptId) -> Option<BTreeMap<QuestionId, Rating>> {
        self.lock()
            .attempts
            .get(&attempt_id)
            .and_then(|record| record.answers.clone())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // state is plain data; a panic elsewhere cannot leave it half-written
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Records the call and pops a scripted failure aimed at `endpoint`, if any.
    fn enter(&self, endpoint: Endpoint) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let mut state = self.lock();
        *state.calls.entry(endpoint).or_insert(0) += 1;
        if let Some(pos) = state
            .scripted_failures
            .iter()
            .position(|(target, _)| *target == endpoint)
        {
            if let Some((_, error)) = state.scripted_failures.remove(pos) {
                return Err(error);
            }
        }
        Ok(state)
    }
}

fn unknown_attempt(attempt_id: AttemptId) -> ApiError {
    ApiError::NotFound {
        message: format!("attempt {attempt_id} does not exist or has expired"),
    }
}

#[async_trait]
impl ScoringApi for InMemoryScoringApi {
    async fn start_attempt(&self, _request: StartRequest) -> Result<AttemptId, ApiError> {
        tokio::task::yield_now().await;
        let mut state = self.enter(Endpoint::Start)?;
        let attempt_id =
            AttemptId::parse(&Uuid::new_v4().to_string()).map_err(|e| ApiError::Malformed {
                message: e.to_string(),
            })?;
        state.attempts.insert(attempt_id, AttemptRecord::default());
        Ok(attempt_id)
    }

    async fn questions(&self, attempt_id: AttemptId) -> Result<Vec<Question>, ApiError> {
        tokio::task::yield_now().await;
        let state = self.enter(Endpoint::Questions)?;
        if !state.attempts.contains_key(&attempt_id) {
            return Err(unknown_attempt(attempt_id));
        }
        Ok(state.question_bank.clone())
    }

    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &BTreeMap<QuestionId, Rating>,
    ) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        let mut state = self.enter(Endpoint::Submit)?;
        let missing = state
            .question_bank
            .iter()
            .filter(|q| !answers.contains_key(&q.id()))
            .count();
        let record = state
            .attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| unknown_attempt(attempt_id))?;
        if record.answers.is_some() {
            return Err(ApiError::Rejected {
                message: "answers were already submitted".to_string(),
            });
        }
        if missing > 0 {
            return Err(ApiError::Rejected {
                message: format!("{missing} question(s) left unanswered"),
            });
        }
        record.answers = Some(answers.clone());
        Ok(())
    }

    async fn result(&self, attempt_id: AttemptId) -> Result<TestResult, ApiError> {
        tokio::task::yield_now().await;
        let state = self.enter(Endpoint::Result)?;
        state
            .attempts
            .get(&attempt_id)
            .and_then(|record| record.result.clone())
            .ok_or_else(|| ApiError::NotFound {
                message: format!("no result for attempt {attempt_id}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octa_core::model::{AgeRange, Gender, PersonalityType};
    use octa_core::time::fixed_now;

    fn bank() -> Vec<Question> {
        (1..=2)
            .map(|id| Question::new(QuestionId::new(id), format!("Q{id}")))
            .collect()
    }

    #[tokio::test]
    async fn started_attempts_serve_the_bank() {
        let api = InMemoryScoringApi::with_questions(bank());
        let id = api
            .start_attempt(StartRequest {
                gender: Gender::Male,
                age_range: AgeRange::Over51,
            })
            .await
            .unwrap();
        assert_eq!(api.questions(id).await.unwrap().len(), 2);
        assert_eq!(api.calls(Endpoint::Questions), 1);
    }

    #[tokio::test]
    async fn scripted_failures_hit_their_endpoint_once() {
        let api = InMemoryScoringApi::with_questions(bank());
        let id = AttemptId::parse("5b1e7c3a-2d4f-4a8b-9c6d-0e1f2a3b4c5d").unwrap();
        api.register_attempt(id);
        api.fail_next(
            Endpoint::Questions,
            ApiError::Unavailable {
                message: "down".into(),
            },
        );

        assert!(api.questions(id).await.unwrap_err().is_transient());
        assert!(api.questions(id).await.is_ok());
        assert_eq!(api.calls(Endpoint::Questions), 2);
    }

    #[tokio::test]
    async fn incomplete_answer_sets_are_refused() {
        let api = InMemoryScoringApi::with_questions(bank());
        let id = AttemptId::parse("5b1e7c3a-2d4f-4a8b-9c6d-0e1f2a3b4c5d").unwrap();
        api.register_attempt(id);

        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::new(1), Rating::new(3).unwrap());
        let err = api.submit_answers(id, &answers).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
        assert!(api.submitted_answers(id).is_none());
    }

    #[tokio::test]
    async fn planted_result_is_served_for_its_attempt_only() {
        let api = InMemoryScoringApi::with_questions(bank());
        let id = AttemptId::parse("5b1e7c3a-2d4f-4a8b-9c6d-0e1f2a3b4c5d").unwrap();
        let other = AttemptId::parse("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        let personality = PersonalityType {
            id: "p1".into(),
            type_code: "ANCHOR".into(),
            type_name: "The Anchor".into(),
            title: String::new(),
            theme_sentence: String::new(),
            description: String::new(),
            description_points: Vec::new(),
            strength_keywords: Vec::new(),
            weakness_keywords: Vec::new(),
            calculated_score: 12.0,
        };
        let result = TestResult::new(
            id,
            fixed_now(),
            20.0,
            vec![personality],
            false,
            2,
        )
        .unwrap();
        api.set_result(result.clone());

        assert_eq!(api.result(id).await.unwrap(), result);
        assert!(matches!(
            api.result(other).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
        assert_eq!(api.calls(Endpoint::Result), 2);
    }
}
