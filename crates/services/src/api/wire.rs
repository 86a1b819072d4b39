//! JSON shapes exchanged with the scoring service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use octa_core::model::{AttemptId, Gender, PersonalityType, Question, QuestionId, TestResult};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub(crate) struct StartAttemptBody {
    pub gender: Gender,
    pub age: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartAttemptResponse {
    #[serde(default)]
    pub success: bool,
    pub attempt_id: Option<String>,
}

impl StartAttemptResponse {
    pub fn into_attempt_id(self) -> Result<AttemptId, ApiError> {
        let unexpected = || ApiError::Malformed {
            message: "start response did not carry a valid attempt id".to_string(),
        };
        if !self.success {
            return Err(unexpected());
        }
        let raw = self.attempt_id.ok_or_else(unexpected)?;
        AttemptId::parse(&raw).map_err(|_| unexpected())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: u32,
    pub question_text: String,
}

impl From<QuestionDto> for Question {
    fn from(dto: QuestionDto) -> Self {
        Question::new(QuestionId::new(dto.id), dto.question_text)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            return Ok(());
        }
        Err(ApiError::Rejected {
            message: self
                .error
                .or(self.message)
                .unwrap_or_else(|| "answers were not accepted".to_string()),
        })
    }
}

/// Body of any non-2xx response; services use either key.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .error
            .or(parsed.message)
            .filter(|msg| !msg.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultEnvelope {
    pub success: bool,
    pub data: Option<TestResultDto>,
    #[serde(default)]
    pub message: String,
}

impl ResultEnvelope {
    pub fn into_result(self, requested: AttemptId) -> Result<TestResult, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => data.into_domain(requested),
            (true, None) => Err(ApiError::Malformed {
                message: "result response carried no data".to_string(),
            }),
            (false, _) => Err(ApiError::Rejected {
                message: if self.message.trim().is_empty() {
                    "result is not available".to_string()
                } else {
                    self.message
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestResultDto {
    pub attempt_id: String,
    pub test_completed_at: DateTime<Utc>,
    pub max_score: f64,
    pub personality_types: Vec<PersonalityTypeDto>,
    pub is_tie: bool,
    pub total_questions_answered: u32,
}

impl TestResultDto {
    fn into_domain(self, requested: AttemptId) -> Result<TestResult, ApiError> {
        let attempt_id = AttemptId::parse(&self.attempt_id).map_err(|e| ApiError::Malformed {
            message: e.to_string(),
        })?;
        if attempt_id != requested {
            return Err(ApiError::Malformed {
                message: format!("result for {attempt_id} returned when {requested} was requested"),
            });
        }

        TestResult::new(
            attempt_id,
            self.test_completed_at,
            self.max_score,
            self.personality_types.into_iter().map(Into::into).collect(),
            self.is_tie,
            self.total_questions_answered,
        )
        .map_err(|e| ApiError::Malformed {
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonalityTypeDto {
    pub id: String,
    pub type_code: String,
    pub type_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub theme_sentence: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_points: Vec<String>,
    #[serde(default)]
    pub strength_keywords: Vec<String>,
    #[serde(default)]
    pub weakness_keywords: Vec<String>,
    pub calculated_score: f64,
}

impl From<PersonalityTypeDto> for PersonalityType {
    fn from(dto: PersonalityTypeDto) -> Self {
        PersonalityType {
            id: dto.id,
            type_code: dto.type_code,
            type_name: dto.type_name,
            title: dto.title,
            theme_sentence: dto.theme_sentence,
            description: dto.description,
            description_points: dto.description_points,
            strength_keywords: dto.strength_keywords,
            weakness_keywords: dto.weakness_keywords,
            calculated_score: dto.calculated_score,
        }
    }
}
