//! Shared error types for the services crate.

use thiserror::Error;

use octa_core::model::{AnswerError, AttemptIdError, PageError};

/// Failures reported by a scoring API adapter.
///
/// Transport details are folded into these variants so nothing above the adapter
/// sees a raw `reqwest::Error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("request rejected: {message}")]
    Rejected { message: String },
    #[error("scoring service unavailable: {message}")]
    Unavailable { message: String },
    #[error("unexpected response from scoring service: {message}")]
    Malformed { message: String },
}

impl ApiError {
    /// True for failures worth retrying (timeouts, connection errors, 5xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Unavailable { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Malformed {
                message: err.to_string(),
            }
        } else {
            ApiError::Unavailable {
                message: err.to_string(),
            }
        }
    }
}

/// Requests that are valid on their own but not in the session's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateConflict {
    #[error("no attempt is active")]
    NoActiveAttempt,
    #[error("questions are still loading")]
    Loading,
    #[error("questions have not been loaded")]
    NotReady,
    #[error("questions are already loaded")]
    AlreadyLoaded,
    #[error("answer every question on page {} before continuing", .page + 1)]
    PageIncomplete { page: usize },
    #[error("already on the last page")]
    LastPage,
    #[error("answers can only be submitted from the last page")]
    NotOnLastPage,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("answers were already submitted")]
    AlreadySubmitted,
    #[error("this attempt can no longer be submitted")]
    SubmissionClosed,
    #[error("answers cannot be changed after submitting")]
    AnswersLocked,
    #[error("response belongs to an attempt that is no longer active")]
    StaleResponse,
}

/// Broad category of a `SessionError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transient,
    Rejected,
    Conflict,
}

/// Errors surfaced to the presentation layer by session, result and start services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    InvalidAttempt(#[from] AttemptIdError),
    #[error(transparent)]
    InvalidAnswer(#[from] AnswerError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    Transient { message: String },
    #[error("{message}")]
    Rejected { message: String },
    #[error(transparent)]
    Conflict(#[from] StateConflict),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidAttempt(_)
            | SessionError::InvalidAnswer(_)
            | SessionError::Page(_) => ErrorKind::Validation,
            SessionError::NotFound { .. } => ErrorKind::NotFound,
            SessionError::Transient { .. } => ErrorKind::Transient,
            SessionError::Rejected { .. } => ErrorKind::Rejected,
            SessionError::Conflict(_) => ErrorKind::Conflict,
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// True when the user should be sent back to create a new attempt.
    #[must_use]
    pub fn redirects_to_start(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidAttempt(_)
                | SessionError::NotFound { .. }
                | SessionError::Conflict(StateConflict::SubmissionClosed)
        )
    }

    /// Message suitable for showing to the respondent as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidAttempt(_) => {
                "This test link is not valid. Please start a new test.".to_string()
            }
            SessionError::NotFound { .. } => {
                "This test could not be found or has expired. Please start a new test."
                    .to_string()
            }
            SessionError::Transient { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            SessionError::Rejected { message } if message.trim().is_empty() => {
                "The server could not process the request.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { message } => SessionError::NotFound { message },
            ApiError::Unavailable { message } => SessionError::Transient { message },
            ApiError::Rejected { message } => SessionError::Rejected { message },
            ApiError::Malformed { message } => SessionError::Rejected {
                message: format!("unexpected server response: {message}"),
            },
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("{var} is not a valid number: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Errors emitted by a share target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShareError {
    #[error("sharing is not available right now")]
    Unavailable,
    #[error("could not build share link: {0}")]
    InvalidLink(String),
    #[error("sharing failed: {0}")]
    Failed(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_onto_session_taxonomy() {
        let not_found: SessionError = ApiError::NotFound {
            message: "gone".into(),
        }
        .into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert!(not_found.redirects_to_start());

        let transient: SessionError = ApiError::Unavailable {
            message: "timeout".into(),
        }
        .into();
        assert!(transient.is_transient());

        let malformed: SessionError = ApiError::Malformed {
            message: "bad json".into(),
        }
        .into();
        assert_eq!(malformed.kind(), ErrorKind::Rejected);
        assert!(malformed.to_string().contains("bad json"));
    }

    #[test]
    fn page_incomplete_message_is_one_based() {
        let err = SessionError::from(StateConflict::PageIncomplete { page: 0 });
        assert_eq!(
            err.user_message(),
            "answer every question on page 1 before continuing"
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn every_error_has_a_readable_message() {
        let errors = [
            SessionError::from(AttemptIdError::Missing),
            SessionError::NotFound {
                message: String::new(),
            },
            SessionError::Transient {
                message: String::new(),
            },
            SessionError::Rejected {
                message: String::new(),
            },
            SessionError::from(StateConflict::SubmissionInFlight),
        ];
        for err in errors {
            assert!(!err.user_message().trim().is_empty(), "{err:?}");
        }
    }
}
