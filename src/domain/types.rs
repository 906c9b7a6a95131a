use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Database identifier of a persisted scenario.
pub type ScenarioId = i64;

/// A learned question/answer pair used for local matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    pub question: String,
    pub answer: String,
}

impl Scenario {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A scenario row as stored in `duck.scenario`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    pub scenario_id: ScenarioId,
    pub prompt: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ScenarioRecord> for Scenario {
    fn from(record: &ScenarioRecord) -> Self {
        Scenario::new(record.prompt.clone(), record.answer.clone())
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseSourceType {
    Local,
    Internet,
}

impl ResponseSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Internet => "internet",
        }
    }
}

/// Which public source a prompt should be looked up in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebSearchType {
    Wiki,
    Joke,
    Book,
    Other,
}

/// Request body for `POST /api/duckai`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
        }
    }
}

/// Reply produced by the responder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PromptResponse {
    pub reply: String,
    pub source: ResponseSourceType,
}

impl PromptResponse {
    pub fn new(reply: impl Into<String>, source: ResponseSourceType) -> Self {
        Self {
            reply: reply.into(),
            source,
        }
    }

    pub fn local(reply: impl Into<String>) -> Self {
        Self::new(reply, ResponseSourceType::Local)
    }

    pub fn internet(reply: impl Into<String>) -> Self {
        Self::new(reply, ResponseSourceType::Internet)
    }
}

/// One entry of the learn batch. Both fields are nullable on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PromptLearnRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl PromptLearnRequest {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            answer: Some(answer.into()),
        }
    }
}

/// Client credentials exchanged for an access token.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 128, message = "client_id must be 1-128 characters"))]
    pub client_id: String,
    #[validate(length(min = 1, max = 256, message = "client_secret must be 1-256 characters"))]
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Health check status for services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub scenarios_loaded: usize,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// An empty scenario set with a reachable database still answers
    /// prompts, but only through the web sources and fallback.
    pub fn new(database: HealthStatus, scenarios_loaded: usize) -> Self {
        let status = match (&database, scenarios_loaded) {
            (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
            (HealthStatus::Healthy, n) if n > 0 => HealthStatus::Healthy,
            _ => HealthStatus::Degraded,
        };

        Self {
            status,
            database,
            scenarios_loaded,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub r#type: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    pub error: ErrorDetail,
    pub retry_after: u64,
}
