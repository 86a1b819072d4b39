use std::fmt;

/// Where an attempt stands with respect to handing its answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    NotSubmitted,
    /// A request is in flight; no second one may start.
    Submitting,
    /// The scoring service accepted the answers. Final.
    Submitted,
    /// The scoring service no longer knows the attempt. Final; a new attempt is needed.
    Failed,
}

impl SubmissionState {
    /// True when a new submission request may be issued from this state.
    #[must_use]
    pub fn accepts_submission(self) -> bool {
        matches!(self, SubmissionState::NotSubmitted)
    }

    /// True once the state can no longer change for this attempt.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, SubmissionState::Submitted | SubmissionState::Failed)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionState::NotSubmitted => "not submitted",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Failed => "failed",
        };
        f.write_str(label)
    }
}
