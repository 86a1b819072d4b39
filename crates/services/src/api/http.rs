use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use octa_core::model::{AttemptId, Question, QuestionId, Rating, TestResult};

use super::wire::{
    AckResponse, ErrorBody, QuestionDto, ResultEnvelope, StartAttemptBody, StartAttemptResponse,
};
use super::{ScoringApi, StartRequest};
use crate::config::ScoringConfig;
use crate::error::ApiError;

/// `ScoringApi` over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpScoringClient {
    client: Client,
    base_url: String,
}

impl HttpScoringClient {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: &ScoringConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ScoringApi for HttpScoringClient {
    async fn start_attempt(&self, request: StartRequest) -> Result<AttemptId, ApiError> {
        let body = StartAttemptBody {
            gender: request.gender,
            age: request.age_range.representative_age(),
        };
        let response = self
            .client
            .post(self.endpoint("attempts"))
            .json(&body)
            .send()
            .await?;
        let parsed: StartAttemptResponse = read_json(response).await?;
        parsed.into_attempt_id()
    }

    async fn questions(&self, attempt_id: AttemptId) -> Result<Vec<Question>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("attempts/{attempt_id}/questions")))
            .send()
            .await?;
        let questions: Vec<QuestionDto> = read_json(response).await?;
        Ok(questions.into_iter().map(Question::from).collect())
    }

    async fn submit_answers(
        &self,
        attempt_id: AttemptId,
        answers: &BTreeMap<QuestionId, Rating>,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("attempts/{attempt_id}/answers")))
            .json(answers)
            .send()
            .await?;
        let ack: AckResponse = read_json(response).await?;
        ack.into_result()
    }

    async fn result(&self, attempt_id: AttemptId) -> Result<TestResult, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("attempts/{attempt_id}/result")))
            .send()
            .await?;
        let envelope: ResultEnvelope = read_json(response).await?;
        envelope.into_result(attempt_id)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = ErrorBody::parse(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    tracing::debug!(status = status.as_u16(), %message, "scoring service returned an error");
    Err(classify(status, message))
}

fn classify(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ApiError::NotFound { message },
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ApiError::Unavailable { message }
        }
        s if s.is_server_error() => ApiError::Unavailable { message },
        _ => ApiError::Rejected { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn status_codes_are_classified() {
        let msg = || "m".to_string();
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, msg()),
            ApiError::NotFound { .. }
        ));
        assert!(classify(StatusCode::BAD_GATEWAY, msg()).is_transient());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, msg()).is_transient());
        assert!(matches!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, msg()),
            ApiError::Rejected { .. }
        ));
    }

    #[test]
    fn endpoints_join_without_double_slashes() {
        let config = ScoringConfig::new(Url::parse("http://localhost:3000/api/").unwrap());
        let client = HttpScoringClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/attempts"),
            "http://localhost:3000/api/attempts"
        );
    }
}
