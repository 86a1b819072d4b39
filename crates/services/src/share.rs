//! Share capability for result pages.
//!
//! The session controller never depends on this; the presentation layer injects a
//! [`ShareTarget`] and hands it a payload built from a loaded result.

use async_trait::async_trait;
use url::Url;

use octa_core::model::{AttemptId, TestResult};

use crate::config::ShareConfig;
use crate::error::ShareError;

/// A call-to-action attached to a shared card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareButton {
    pub title: String,
    pub link: Url,
}

/// Feed-style card describing a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub description: String,
    pub link: Url,
    pub buttons: Vec<ShareButton>,
}

impl SharePayload {
    /// Builds the card for `result`, headed by its first type in display order.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::InvalidLink` when the configured origin cannot be
    /// joined into result or start links.
    pub fn for_result(result: &TestResult, config: &ShareConfig) -> Result<Self, ShareError> {
        let first = result.primary();
        let result_link = result_url(config, result.attempt_id())?;
        let start_link = page_url(config, "start")?;

        Ok(Self {
            title: format!("[{}] My type: {}", config.site_name, first.type_name),
            description: first.theme_sentence.clone(),
            link: result_link.clone(),
            buttons: vec![
                ShareButton {
                    title: "See my full result".to_string(),
                    link: result_link,
                },
                ShareButton {
                    title: "Take the test".to_string(),
                    link: start_link,
                },
            ],
        })
    }
}

/// Public link to the result page of `attempt_id`.
///
/// # Errors
///
/// Returns `ShareError::InvalidLink` when the origin cannot carry a path.
pub fn result_url(config: &ShareConfig, attempt_id: AttemptId) -> Result<Url, ShareError> {
    page_url(config, &format!("result/{attempt_id}"))
}

fn page_url(config: &ShareConfig, path: &str) -> Result<Url, ShareError> {
    let raw = format!(
        "{}/{}",
        config.public_origin.as_str().trim_end_matches('/'),
        path
    );
    Url::parse(&raw).map_err(|e| ShareError::InvalidLink(format!("{raw}: {e}")))
}

/// Somewhere a result can be shared to (a messenger SDK, a clipboard, stdout).
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// False while the target is still initializing or unavailable.
    fn is_ready(&self) -> bool;

    /// # Errors
    ///
    /// Returns `ShareError::Failed` when the target refuses the payload.
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Builds the payload for `result` and hands it to `target`.
///
/// # Errors
///
/// Returns `ShareError::Unavailable` without building anything when the target
/// is not ready, otherwise any error from building or sharing.
pub async fn share_result(
    target: &dyn ShareTarget,
    result: &TestResult,
    config: &ShareConfig,
) -> Result<SharePayload, ShareError> {
    if !target.is_ready() {
        return Err(ShareError::Unavailable);
    }
    let payload = SharePayload::for_result(result, config)?;
    target.share(&payload).await?;
    tracing::info!(attempt_id = %result.attempt_id(), "result shared");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use octa_core::model::PersonalityType;
    use octa_core::time::fixed_now;

    const ATTEMPT: &str = "a3bb189e-8bf9-4888-9912-ace4e6543002";

    fn personality(code: &str, score: f64) -> PersonalityType {
        PersonalityType {
            id: format!("id-{code}"),
            type_code: code.to_string(),
            type_name: format!("The {code}"),
            title: String::new(),
            theme_sentence: format!("{code} sees the whole board"),
            description: String::new(),
            description_points: Vec::new(),
            strength_keywords: Vec::new(),
            weakness_keywords: Vec::new(),
            calculated_score: score,
        }
    }

    fn tie() -> TestResult {
        TestResult::new(
            AttemptId::parse(ATTEMPT).unwrap(),
            fixed_now(),
            50.0,
            vec![personality("STRATEGIST", 42.0), personality("ARCHITECT", 42.0)],
            true,
            24,
        )
        .unwrap()
    }

    fn config() -> ShareConfig {
        ShareConfig::new(
            Url::parse("https://octa.example.com/").unwrap(),
            "Octa",
        )
    }

    #[derive(Default)]
    struct Recorder {
        ready: bool,
        sent: Mutex<Vec<SharePayload>>,
    }

    #[async_trait]
    impl ShareTarget for Recorder {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    #[test]
    fn payload_uses_first_type_in_display_order() {
        let payload = SharePayload::for_result(&tie(), &config()).unwrap();
        assert_eq!(payload.title, "[Octa] My type: The ARCHITECT");
        assert_eq!(payload.description, "ARCHITECT sees the whole board");
        assert_eq!(
            payload.link.as_str(),
            format!("https://octa.example.com/result/{ATTEMPT}")
        );
        assert_eq!(
            payload.buttons[1].link.as_str(),
            "https://octa.example.com/start"
        );
    }

    #[tokio::test]
    async fn unready_target_is_not_called() {
        let target = Recorder::default();
        let err = share_result(&target, &tie(), &config()).await.unwrap_err();
        assert_eq!(err, ShareError::Unavailable);
        assert!(target.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ready_target_receives_payload() {
        let target = Recorder {
            ready: true,
            ..Recorder::default()
        };
        let payload = share_result(&target, &tie(), &config()).await.unwrap();
        assert_eq!(target.sent.lock().unwrap().as_slice(), &[payload]);
    }
}
