use chrono::{DateTime, Utc};
use std::fmt;

use octa_core::Clock;
use octa_core::model::{
    AnswerSheet, AttemptId, Question, QuestionId, QuestionPages, Rating, SubmissionState,
};

use super::gate::{SubmissionGate, SubmissionTicket};
use super::snapshot::{QuestionView, SessionSnapshot};
use crate::error::{ErrorKind, SessionError, StateConflict};

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Coarse lifecycle of an attempt session, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    Submitting,
    Submitted,
    /// Questions could not be loaded, or the service no longer knows the attempt.
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Loading => "loading",
            SessionPhase::Ready => "ready",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Submitted => "submitted",
            SessionPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

//
// ─── TICKETS ───────────────────────────────────────────────────────────────────
//

/// Identifies one question load; its outcome is only applied while it is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    attempt_id: AttemptId,
}

impl LoadTicket {
    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }
}

/// What is about to be submitted, shown to the respondent for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPreview {
    pub attempt_id: AttemptId,
    pub answered: usize,
    pub total: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one questionnaire attempt.
///
/// All transitions are synchronous. Network work happens outside, between a
/// `begin_*` call that hands out a ticket and the matching `finish_*` call that
/// applies the outcome. `reset` bumps an epoch so outcomes of requests started
/// before it are dropped.
#[derive(Debug, Clone)]
pub struct AttemptSession {
    clock: Clock,
    epoch: u64,
    attempt_id: Option<AttemptId>,
    loading: bool,
    pages: Option<QuestionPages>,
    answers: AnswerSheet,
    current_page: usize,
    gate: SubmissionGate,
    last_error: Option<SessionError>,
    loaded_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
}

impl Default for AttemptSession {
    fn default() -> Self {
        Self::new(Clock::default())
    }
}

impl AttemptSession {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            epoch: 0,
            attempt_id: None,
            loading: false,
            pages: None,
            answers: AnswerSheet::default(),
            current_page: 0,
            gate: SubmissionGate::default(),
            last_error: None,
            loaded_at: None,
            submitted_at: None,
        }
    }

    // ─── lifecycle ───

    /// Validates `raw` and, if it is a valid id, discards the current attempt
    /// in favour of it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAttempt` for a missing or malformed id. Only
    /// `last_error` changes; the current attempt keeps its answers and page.
    pub fn begin_load(&mut self, raw: Option<&str>) -> Result<LoadTicket, SessionError> {
        let attempt_id = match AttemptId::parse_optional(raw) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err, "refusing to open attempt");
                return Err(self.record(err.into()));
            }
        };

        self.reset();
        self.attempt_id = Some(attempt_id);
        self.loading = true;
        tracing::info!(%attempt_id, "attempt opened");
        Ok(LoadTicket {
            epoch: self.epoch,
            attempt_id,
        })
    }

    /// Starts loading the same attempt again after a failed load.
    ///
    /// # Errors
    ///
    /// Returns a `StateConflict` when no attempt is active, a load is pending, or
    /// questions are already loaded.
    pub fn retry_load(&mut self) -> Result<LoadTicket, SessionError> {
        let check = self.retryable();
        let attempt_id = self.guard(check)?;
        self.epoch = self.epoch.wrapping_add(1);
        self.loading = true;
        self.last_error = None;
        tracing::info!(%attempt_id, "retrying question load");
        Ok(LoadTicket {
            epoch: self.epoch,
            attempt_id,
        })
    }

    /// Applies the outcome of a question load and returns the page count.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict::StaleResponse` (state untouched) when `ticket` is
    /// no longer current, the load error itself, or `SessionError::Rejected` for
    /// an empty question list.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<Vec<Question>, SessionError>,
    ) -> Result<usize, SessionError> {
        let current = self.loading
            && self.epoch == ticket.epoch
            && self.attempt_id == Some(ticket.attempt_id);
        if !current {
            tracing::debug!(attempt_id = %ticket.attempt_id, "dropping stale question list");
            return Err(StateConflict::StaleResponse.into());
        }
        self.loading = false;

        let questions = match outcome {
            Ok(questions) => questions,
            Err(err) => {
                tracing::warn!(
                    attempt_id = %ticket.attempt_id,
                    error = %err,
                    "question load failed"
                );
                return Err(self.record(err));
            }
        };
        let Ok(pages) = QuestionPages::new(questions) else {
            tracing::warn!(attempt_id = %ticket.attempt_id, "attempt has no questions");
            return Err(self.record(SessionError::Rejected {
                message: "this test has no questions".to_string(),
            }));
        };

        let total_pages = pages.total_pages();
        self.answers = AnswerSheet::for_questions(pages.questions());
        self.current_page = 0;
        self.pages = Some(pages);
        self.loaded_at = Some(self.clock.now());
        self.last_error = None;
        tracing::info!(attempt_id = %ticket.attempt_id, pages = total_pages, "questions ready");
        Ok(total_pages)
    }

    /// Back to `Uninitialized`: answers, pages and submission state are dropped.
    pub fn reset(&mut self) {
        let clock = self.clock;
        let epoch = self.epoch.wrapping_add(1);
        *self = Self::new(clock);
        self.epoch = epoch;
    }

    // ─── answering & paging ───

    /// Records a rating for a question of the loaded set. Never changes page.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidAnswer` for an out-of-range score or unknown
    /// question, and a `StateConflict` when answers cannot be edited right now.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        score: i64,
    ) -> Result<Rating, SessionError> {
        let check = self.editable();
        self.guard(check)?;
        match self.answers.set(question_id, score) {
            Ok(rating) => {
                self.last_error = None;
                Ok(rating)
            }
            Err(err) => Err(self.record(err.into())),
        }
    }

    /// Moves to the next page and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict::PageIncomplete` or `StateConflict::LastPage`; the
    /// page does not change.
    pub fn next_page(&mut self) -> Result<usize, SessionError> {
        let check = self.advanceable();
        self.guard(check)?;
        self.current_page += 1;
        self.last_error = None;
        Ok(self.current_page)
    }

    /// Moves to the previous page; on the first page this does nothing.
    ///
    /// # Errors
    ///
    /// Returns a `StateConflict` when questions are not loaded or a submission
    /// has started.
    pub fn prev_page(&mut self) -> Result<usize, SessionError> {
        let check = self.loaded().map(|_| ()).and_then(|()| self.gate.check());
        self.guard(check)?;
        self.current_page = self.current_page.saturating_sub(1);
        Ok(self.current_page)
    }

    /// # Errors
    ///
    /// Returns a `StateConflict` before questions are loaded and
    /// `SessionError::Page` for an index outside the page range.
    pub fn page(&self, index: usize) -> Result<&[Question], SessionError> {
        Ok(self.loaded()?.page(index)?)
    }

    /// # Errors
    ///
    /// Same as [`AttemptSession::page`].
    pub fn is_page_complete(&self, index: usize) -> Result<bool, SessionError> {
        Ok(self.loaded()?.is_page_complete(index, &self.answers)?)
    }

    /// Questions on the current page; empty before loading.
    #[must_use]
    pub fn current_questions(&self) -> &[Question] {
        self.pages
            .as_ref()
            .and_then(|pages| pages.page(self.current_page).ok())
            .unwrap_or(&[])
    }

    // ─── submission ───

    /// Checks every submission precondition without changing anything.
    ///
    /// # Errors
    ///
    /// Returns the first `StateConflict` that blocks submission.
    pub fn check_submittable(&self) -> Result<SubmissionPreview, SessionError> {
        let pages = self.loaded()?;
        self.gate.check()?;
        let attempt_id = self.attempt_id.ok_or(StateConflict::NoActiveAttempt)?;
        if self.current_page != pages.last_index() {
            return Err(StateConflict::NotOnLastPage.into());
        }
        if let Some(page) = pages.first_incomplete_page(&self.answers) {
            return Err(StateConflict::PageIncomplete { page }.into());
        }
        Ok(SubmissionPreview {
            attempt_id,
            answered: self.answers.answered(),
            total: self.answers.total(),
        })
    }

    /// Closes the gate behind a new submission and captures what to send.
    ///
    /// # Errors
    ///
    /// Same as [`AttemptSession::check_submittable`].
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, SessionError> {
        let preview = match self.check_submittable() {
            Ok(preview) => preview,
            Err(err) => return Err(self.record(err)),
        };
        let opened = self.gate.begin();
        self.guard(opened)?;
        self.last_error = None;
        tracing::info!(
            attempt_id = %preview.attempt_id,
            answers = preview.answered,
            "submitting answers"
        );
        Ok(SubmissionTicket {
            epoch: self.epoch,
            attempt_id: preview.attempt_id,
            answers: self.answers.ratings().clone(),
        })
    }

    /// Applies the outcome of a submission request.
    ///
    /// On success the attempt id to show the result for is returned. A `NotFound`
    /// outcome closes the attempt for good; any other failure reopens the gate.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict::StaleResponse` (state untouched) for an outdated
    /// ticket, otherwise the submission error.
    pub fn finish_submission(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<(), SessionError>,
    ) -> Result<AttemptId, SessionError> {
        let current = self.epoch == ticket.epoch
            && self.attempt_id == Some(ticket.attempt_id)
            && self.gate.state() == SubmissionState::Submitting;
        if !current {
            tracing::debug!(attempt_id = %ticket.attempt_id, "dropping stale submission outcome");
            return Err(StateConflict::StaleResponse.into());
        }

        match outcome {
            Ok(()) => {
                self.gate.succeed();
                self.submitted_at = Some(self.clock.now());
                self.last_error = None;
                tracing::info!(attempt_id = %ticket.attempt_id, "answers accepted");
                Ok(ticket.attempt_id)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.gate.close();
                tracing::warn!(
                    attempt_id = %ticket.attempt_id,
                    error = %err,
                    "attempt gone during submission"
                );
                Err(self.record(err))
            }
            Err(err) => {
                self.gate.fail();
                tracing::warn!(attempt_id = %ticket.attempt_id, error = %err, "submission failed");
                Err(self.record(err))
            }
        }
    }

    // ─── queries ───

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.attempt_id.is_none() {
            return SessionPhase::Uninitialized;
        }
        if self.loading {
            return SessionPhase::Loading;
        }
        if self.pages.is_none() {
            return SessionPhase::Failed;
        }
        match self.gate.state() {
            SubmissionState::NotSubmitted => SessionPhase::Ready,
            SubmissionState::Submitting => SessionPhase::Submitting,
            SubmissionState::Submitted => SessionPhase::Submitted,
            SubmissionState::Failed => SessionPhase::Failed,
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Zero until questions are loaded.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pages.as_ref().map_or(0, QuestionPages::total_pages)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.pages
            .as_ref()
            .map(QuestionPages::questions)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn submission_state(&self) -> SubmissionState {
        self.gate.state()
    }

    /// Submission requests issued for the current attempt.
    #[must_use]
    pub fn submission_requests(&self) -> u32 {
        self.gate.requests_issued()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let (questions, is_last_page, page_complete) = match &self.pages {
            Some(pages) => {
                let first = pages
                    .bounds(self.current_page)
                    .map_or(0, |range| range.start);
                let views = self
                    .current_questions()
                    .iter()
                    .enumerate()
                    .map(|(offset, q)| QuestionView {
                        id: q.id(),
                        number: first + offset + 1,
                        text: q.text().to_string(),
                        rating: self.answers.get(q.id()),
                    })
                    .collect();
                let complete = pages
                    .is_page_complete(self.current_page, &self.answers)
                    .unwrap_or(false);
                (views, self.current_page == pages.last_index(), complete)
            }
            None => (Vec::new(), false, false),
        };

        SessionSnapshot {
            phase: self.phase(),
            attempt_id: self.attempt_id,
            current_page: self.current_page,
            total_pages: self.total_pages(),
            questions,
            answered: self.answers.answered(),
            total_questions: self.answers.total(),
            is_first_page: self.current_page == 0,
            is_last_page,
            page_complete,
            submission: self.gate.state(),
            last_error: self
                .last_error
                .as_ref()
                .map(SessionError::user_message),
        }
    }

    // ─── helpers ───

    fn record(&mut self, err: SessionError) -> SessionError {
        self.last_error = Some(err.clone());
        err
    }

    fn guard<T>(&mut self, check: Result<T, StateConflict>) -> Result<T, SessionError> {
        check.map_err(|conflict| self.record(conflict.into()))
    }

    fn loaded(&self) -> Result<&QuestionPages, StateConflict> {
        if self.attempt_id.is_none() {
            return Err(StateConflict::NoActiveAttempt);
        }
        if self.loading {
            return Err(StateConflict::Loading);
        }
        self.pages.as_ref().ok_or(StateConflict::NotReady)
    }

    fn editable(&self) -> Result<(), StateConflict> {
        self.loaded()?;
        match self.gate.state() {
            SubmissionState::NotSubmitted => Ok(()),
            SubmissionState::Submitting | SubmissionState::Submitted => {
                Err(StateConflict::AnswersLocked)
            }
            SubmissionState::Failed => Err(StateConflict::SubmissionClosed),
        }
    }

    fn advanceable(&self) -> Result<(), StateConflict> {
        let pages = self.loaded()?;
        self.gate.check()?;
        let complete = pages
            .is_page_complete(self.current_page, &self.answers)
            .unwrap_or(false);
        if !complete {
            return Err(StateConflict::PageIncomplete {
                page: self.current_page,
            });
        }
        if self.current_page >= pages.last_index() {
            return Err(StateConflict::LastPage);
        }
        Ok(())
    }

    fn retryable(&self) -> Result<AttemptId, StateConflict> {
        let attempt_id = self.attempt_id.ok_or(StateConflict::NoActiveAttempt)?;
        if self.loading {
            return Err(StateConflict::Loading);
        }
        if self.pages.is_some() {
            return Err(StateConflict::AlreadyLoaded);
        }
        Ok(attempt_id)
    }
}
