use std::collections::BTreeMap;

use octa_core::model::{AttemptId, QuestionId, Rating, SubmissionState};

use crate::api::ScoringApi;
use crate::error::{SessionError, StateConflict};

//
// ─── GATE ──────────────────────────────────────────────────────────────────────
//

/// Lets at most one submission request out per attempt.
///
/// `begin` is the only way into `Submitting`; while a request is in flight every
/// further `begin` is refused without touching the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionGate {
    state: SubmissionState,
    requests_issued: u32,
}

impl SubmissionGate {
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Number of submission requests this gate has let through.
    #[must_use]
    pub fn requests_issued(&self) -> u32 {
        self.requests_issued
    }

    /// Checks that a submission could start, without starting it.
    ///
    /// # Errors
    ///
    /// Returns the `StateConflict` matching the current submission state.
    pub fn check(&self) -> Result<(), StateConflict> {
        match self.state {
            SubmissionState::NotSubmitted => Ok(()),
            SubmissionState::Submitting => Err(StateConflict::SubmissionInFlight),
            SubmissionState::Submitted => Err(StateConflict::AlreadySubmitted),
            SubmissionState::Failed => Err(StateConflict::SubmissionClosed),
        }
    }

    /// Moves to `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns a `StateConflict` unless the state is `NotSubmitted`.
    pub fn begin(&mut self) -> Result<(), StateConflict> {
        self.check()?;
        self.state = SubmissionState::Submitting;
        self.requests_issued += 1;
        Ok(())
    }

    pub fn succeed(&mut self) {
        self.state = SubmissionState::Submitted;
    }

    /// Reopens the gate after a failure that may be retried.
    pub fn fail(&mut self) {
        self.state = SubmissionState::NotSubmitted;
    }

    /// Shuts the gate for good; the attempt cannot be submitted anymore.
    pub fn close(&mut self) {
        self.state = SubmissionState::Failed;
    }
}

//
// ─── TICKET ────────────────────────────────────────────────────────────────────
//

/// Everything needed to send one submission, captured when the gate opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub(crate) epoch: u64,
    pub(crate) attempt_id: AttemptId,
    pub(crate) answers: BTreeMap<QuestionId, Rating>,
}

impl SubmissionTicket {
    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, Rating> {
        &self.answers
    }
}

/// Sends the ticket's answers once. Never retries.
pub(crate) async fn relay(
    api: &dyn ScoringApi,
    ticket: &SubmissionTicket,
) -> Result<(), SessionError> {
    api.submit_answers(ticket.attempt_id, &ticket.answers)
        .await
        .map_err(SessionError::from)
}
