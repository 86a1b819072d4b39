mod controller;
mod gate;
mod loader;
mod snapshot;
mod state;

// Public API of the session subsystem.
pub use crate::error::{SessionError, StateConflict};
pub use controller::{AttemptController, SubmitOutcome};
pub use gate::{SubmissionGate, SubmissionTicket};
pub use loader::QuestionLoader;
pub use snapshot::{QuestionView, SessionSnapshot};
pub use state::{AttemptSession, LoadTicket, SessionPhase, SubmissionPreview};
