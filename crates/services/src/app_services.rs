use std::sync::Arc;

use crate::Clock;
use crate::api::{HttpScoringClient, ScoringApi};
use crate::config::{ScoringConfig, ShareConfig};
use crate::error::AppServicesError;
use crate::results::ResultService;
use crate::sessions::AttemptController;
use crate::start_service::StartService;

/// Assembles app-facing services around one scoring API.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    api: Arc<dyn ScoringApi>,
    starter: Arc<StartService>,
    results: Arc<ResultService>,
    share_config: ShareConfig,
}

impl AppServices {
    /// Build services talking to the scoring service over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn from_config(
        scoring: &ScoringConfig,
        share_config: ShareConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let api: Arc<dyn ScoringApi> = Arc::new(HttpScoringClient::new(scoring)?);
        tracing::debug!(base_url = %scoring.base_url, "scoring client ready");
        Ok(Self::with_api(api, scoring, share_config, clock))
    }

    /// Build services from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Config` for invalid variables.
    pub fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let scoring = ScoringConfig::from_env()?;
        let share_config = ShareConfig::from_env()?;
        Self::from_config(&scoring, share_config, clock)
    }

    /// Build services around any `ScoringApi` (e.g. the in-memory one).
    #[must_use]
    pub fn with_api(
        api: Arc<dyn ScoringApi>,
        scoring: &ScoringConfig,
        share_config: ShareConfig,
        clock: Clock,
    ) -> Self {
        Self {
            clock,
            starter: Arc::new(StartService::new(Arc::clone(&api))),
            results: Arc::new(ResultService::new(Arc::clone(&api), scoring.result_retry)),
            api,
            share_config,
        }
    }

    /// A fresh controller for one attempt; each attempt gets its own session.
    #[must_use]
    pub fn new_attempt_controller(&self) -> AttemptController {
        AttemptController::new(Arc::clone(&self.api), self.clock)
    }

    #[must_use]
    pub fn starter(&self) -> Arc<StartService> {
        Arc::clone(&self.starter)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn share_config(&self) -> &ShareConfig {
        &self.share_config
    }
}
