mod answers;
mod ids;
mod pages;
mod question;
mod rating;
mod result;
mod start;
mod submission;

pub use answers::{AnswerError, AnswerSheet};
pub use ids::{AttemptId, AttemptIdError, QuestionId};
pub use pages::{PAGE_SIZE, PageError, QuestionPages, page_count};
pub use question::Question;
pub use rating::{Rating, RatingError};
pub use result::{PersonalityType, ResultError, TestResult};
pub use start::{AgeRange, Gender, ProfileError};
pub use submission::SubmissionState;
