use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use octa_core::Clock;
use octa_core::model::{AttemptId, QuestionId, Rating};

use super::gate;
use super::loader::QuestionLoader;
use super::snapshot::SessionSnapshot;
use super::state::{AttemptSession, SessionPhase, SubmissionPreview};
use crate::api::ScoringApi;
use crate::error::SessionError;

/// Outcome of a submit request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Answers were accepted; show the result for this attempt.
    Submitted { attempt_id: AttemptId },
    /// The respondent did not confirm; nothing was sent.
    Declined,
}

/// Drives one attempt session against the scoring service.
///
/// Methods take `&self`; the session lock is only held between awaits, so a
/// second call made while a request is pending sees the in-flight state.
pub struct AttemptController {
    api: Arc<dyn ScoringApi>,
    loader: QuestionLoader,
    session: Mutex<AttemptSession>,
}

impl AttemptController {
    #[must_use]
    pub fn new(api: Arc<dyn ScoringApi>, clock: Clock) -> Self {
        Self {
            loader: QuestionLoader::new(Arc::clone(&api)),
            api,
            session: Mutex::new(AttemptSession::new(clock)),
        }
    }

    /// Validates the attempt id and loads its questions. Returns the page count.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAttempt` without any request for a bad id,
    /// otherwise the load error. `StateConflict::StaleResponse` means the session
    /// was reset or reopened while loading.
    pub async fn open(&self, raw_attempt_id: Option<&str>) -> Result<usize, SessionError> {
        let ticket = self.session().begin_load(raw_attempt_id)?;
        let outcome = self.loader.load(ticket.attempt_id()).await;
        self.session().finish_load(ticket, outcome)
    }

    /// Loads the questions of the current attempt again after a failure.
    ///
    /// # Errors
    ///
    /// Same as [`AttemptController::open`], plus a `StateConflict` when there is
    /// nothing to retry.
    pub async fn retry_load(&self) -> Result<usize, SessionError> {
        let ticket = self.session().retry_load()?;
        let outcome = self.loader.load(ticket.attempt_id()).await;
        self.session().finish_load(ticket, outcome)
    }

    /// Drops the attempt. Responses to requests still in flight are ignored.
    pub fn reset(&self) {
        self.session().reset();
    }

    /// # Errors
    ///
    /// See [`AttemptSession::set_answer`].
    pub fn set_answer(&self, question_id: QuestionId, score: i64) -> Result<Rating, SessionError> {
        self.session().set_answer(question_id, score)
    }

    /// # Errors
    ///
    /// See [`AttemptSession::next_page`].
    pub fn next_page(&self) -> Result<usize, SessionError> {
        self.session().next_page()
    }

    /// # Errors
    ///
    /// See [`AttemptSession::prev_page`].
    pub fn prev_page(&self) -> Result<usize, SessionError> {
        self.session().prev_page()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session().phase()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session().snapshot()
    }

    /// Runs `f` against the session state. Do not block inside `f`.
    pub fn with_session<R>(&self, f: impl FnOnce(&AttemptSession) -> R) -> R {
        f(&self.session())
    }

    /// Submits the answers once `confirm` agrees to the preview.
    ///
    /// Makes at most one request and never retries it. While a submission is in
    /// flight, further calls fail with `StateConflict::SubmissionInFlight`
    /// without reaching the network.
    ///
    /// # Errors
    ///
    /// Returns a `StateConflict` when submission is not allowed right now, or the
    /// service error; after a transient or rejected failure the respondent may
    /// submit again.
    pub async fn submit<F>(&self, confirm: F) -> Result<SubmitOutcome, SessionError>
    where
        F: FnOnce(&SubmissionPreview) -> bool,
    {
        let preview = self.session().check_submittable()?;
        if !confirm(&preview) {
            tracing::debug!(attempt_id = %preview.attempt_id, "submission declined");
            return Ok(SubmitOutcome::Declined);
        }

        let ticket = self.session().begin_submission()?;
        let outcome = gate::relay(self.api.as_ref(), &ticket).await;
        let attempt_id = self.session().finish_submission(&ticket, outcome)?;
        Ok(SubmitOutcome::Submitted { attempt_id })
    }

    fn session(&self) -> MutexGuard<'_, AttemptSession> {
        // every transition leaves the session consistent before returning
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
