//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::domain::{ScenarioRepository, WebSearch};
use crate::infra::auth::JwtService;
use crate::infra::observability::PrometheusHandle;

use super::responder::ScenarioResponderEngine;
use super::service::ScenarioService;

/// Shared application state for the Axum web server.
///
/// All contained types are wrapped in `Arc` and implement `Send + Sync`,
/// making `AppState` safe to share across async tasks.
///
/// # Example
///
/// ```ignore
/// let repo = Arc::new(PostgresClient::with_defaults(&database_url).await?);
/// let search = Arc::new(WebSearchEngine::new(WebSearchConfig::default())?);
/// let state = AppState::new(repo, search).with_auth(jwt_service);
///
/// let router = create_router(Arc::new(state));
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Scenario persistence and validation.
    pub scenario_service: Arc<ScenarioService>,

    /// Prompt answering engine.
    pub responder: Arc<ScenarioResponderEngine>,

    /// Token issuing and verification. `None` leaves every route open.
    pub auth: Option<Arc<JwtService>>,

    /// Prometheus recorder handle for `GET /metrics`.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates the state, wiring the service and responder to the given
    /// repository and web search implementations.
    #[must_use]
    pub fn new(repository: Arc<dyn ScenarioRepository>, web_search: Arc<dyn WebSearch>) -> Self {
        let scenario_service = Arc::new(ScenarioService::new(repository));
        let responder = Arc::new(ScenarioResponderEngine::new(
            Arc::clone(&scenario_service),
            web_search,
        ));

        Self {
            scenario_service,
            responder,
            auth: None,
            metrics: None,
        }
    }

    /// Enables bearer-token protection of the write endpoints.
    #[must_use]
    pub fn with_auth(mut self, auth: JwtService) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Option<Arc<PrometheusHandle>>) -> Self {
        self.metrics = metrics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockScenarioRepository, MockWebSearch};

    #[test]
    fn test_app_state_creation() {
        let repo = Arc::new(MockScenarioRepository::new());
        let search = Arc::new(MockWebSearch::new());

        let state = AppState::new(repo, search);

        assert!(state.auth.is_none());
        assert!(state.metrics.is_none());
    }

    #[test]
    fn test_app_state_is_clone() {
        let repo = Arc::new(MockScenarioRepository::new());
        let search = Arc::new(MockWebSearch::new());

        let state = AppState::new(repo, search);
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.responder, &cloned.responder));
        assert!(Arc::ptr_eq(&state.scenario_service, &cloned.scenario_service));
    }
}
