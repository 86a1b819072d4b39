use thiserror::Error;

use crate::model::{AnswerError, AttemptIdError, PageError, ProfileError, ResultError};

/// Any domain rule violation raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    AttemptId(#[from] AttemptIdError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Result(#[from] ResultError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerSheet, AttemptId, QuestionId};

    fn domain_step() -> Result<(), Error> {
        let _ = AttemptId::parse("7c9e6679-7425-40de-944b-e07fc1f90ae7")?;
        let mut sheet = AnswerSheet::default();
        sheet.set(QuestionId::new(1), 5)?;
        Ok(())
    }

    #[test]
    fn domain_errors_convert_into_aggregate() {
        let err = domain_step().unwrap_err();
        assert!(matches!(err, Error::Answer(AnswerError::UnknownQuestion(_))));
        assert_eq!(err.to_string(), "question 1 is not part of this attempt");
    }
}
