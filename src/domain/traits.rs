//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{ScenarioId, ScenarioRecord, WebSearchType};

/// Persistence for learned scenarios.
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// All stored scenarios, oldest first
    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>, AppError>;

    /// A single scenario by its database id
    async fn get_scenario(&self, id: ScenarioId) -> Result<Option<ScenarioRecord>, AppError>;

    /// Store a new scenario. Callers pass already trimmed, non-empty text.
    async fn create_scenario(&self, prompt: &str, answer: &str)
    -> Result<ScenarioRecord, AppError>;
}

/// Lookup of a prompt in a public web source.
///
/// Implementations never fail: an unreachable or empty source yields `None`
/// so the responder can fall through to its canned reply.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, prompt: &str, kind: WebSearchType) -> Option<String>;
}
