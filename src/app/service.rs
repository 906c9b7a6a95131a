//! Scenario service.
//!
//! Reads, validates and stores learned question/answer scenarios through
//! the [`ScenarioRepository`] abstraction.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::{
    AppError, HealthResponse, HealthStatus, PromptLearnRequest, Scenario, ScenarioId,
    ScenarioRecord, ScenarioRepository,
};

/// Handles reading, writing and training scenario data.
///
/// # Example
///
/// ```ignore
/// let repo = Arc::new(PostgresClient::with_defaults(&database_url).await?);
/// let service = ScenarioService::new(repo);
///
/// let scenarios = service.load_scenarios().await?;
/// ```
pub struct ScenarioService {
    repository: Arc<dyn ScenarioRepository>,
}

impl ScenarioService {
    #[must_use]
    pub fn new(repository: Arc<dyn ScenarioRepository>) -> Self {
        Self { repository }
    }

    /// Loads every stored scenario as a matching unit, in storage order.
    #[instrument(skip(self))]
    pub async fn load_scenarios(&self) -> Result<Vec<Scenario>, AppError> {
        let records = self.repository.list_scenarios().await?;
        Ok(records.iter().map(Scenario::from).collect())
    }

    /// Validates and stores a scenario.
    ///
    /// Returns `Ok(false)` without touching the repository when the prompt
    /// or answer is missing or blank. Both are stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns an `AppError` if the repository write fails.
    #[instrument(skip(self, request))]
    pub async fn add_scenario(&self, request: &PromptLearnRequest) -> Result<bool, AppError> {
        let Some(scenario) = Self::normalize(request) else {
            return Ok(false);
        };

        let record = self
            .repository
            .create_scenario(&scenario.question, &scenario.answer)
            .await?;
        info!(scenario_id = record.scenario_id, "Scenario stored");
        Ok(true)
    }

    /// The trimmed scenario a learn request describes, if it is usable.
    pub fn normalize(request: &PromptLearnRequest) -> Option<Scenario> {
        let (Some(prompt), Some(answer)) = (&request.prompt, &request.answer) else {
            warn!(
                prompt = ?request.prompt,
                answer = ?request.answer,
                "Prompt or answer is missing"
            );
            return None;
        };

        let prompt = prompt.trim();
        let answer = answer.trim();
        if prompt.is_empty() || answer.is_empty() {
            warn!(prompt, answer, "Prompt or answer is empty after trimming");
            return None;
        }

        Some(Scenario::new(prompt, answer))
    }

    #[instrument(skip(self))]
    pub async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>, AppError> {
        self.repository.list_scenarios().await
    }

    #[instrument(skip(self))]
    pub async fn get_scenario(&self, id: ScenarioId) -> Result<Option<ScenarioRecord>, AppError> {
        self.repository.get_scenario(id).await
    }

    /// Reports database health alongside the size of the in-memory set.
    #[instrument(skip(self))]
    pub async fn health_check(&self, scenarios_loaded: usize) -> HealthResponse {
        let db_health = match self.repository.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = ?e, "Database health check failed");
                HealthStatus::Unhealthy
            }
        };

        HealthResponse::new(db_health, scenarios_loaded)
    }
}
