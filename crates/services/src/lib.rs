#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod results;
pub mod retry;
pub mod sessions;
pub mod share;
pub mod start_service;

pub use octa_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use config::{ScoringConfig, ShareConfig};
pub use error::{ApiError, AppServicesError, ConfigError, ErrorKind, SessionError, ShareError};
pub use results::ResultService;
pub use retry::RetryPolicy;
pub use share::{SharePayload, ShareTarget, share_result};
pub use start_service::StartService;

pub use sessions::{
    AttemptController, AttemptSession, SessionPhase, SessionSnapshot, SubmissionPreview,
    SubmitOutcome,
};
