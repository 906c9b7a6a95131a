//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of domain traits
//! that can be configured to simulate various scenarios including
//! success, failure, and edge cases.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{
    AppError, DatabaseError, ScenarioId, ScenarioRecord, ScenarioRepository, WebSearch,
    WebSearchType,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
    /// Delay in milliseconds added to `list_scenarios` after the rows are
    /// read, so a caller works from a snapshot that can go stale.
    pub latency_ms: Option<u64>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
            latency_ms: None,
        }
    }

    /// Adds simulated latency.
    #[must_use]
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }
}

/// In-memory scenario repository.
///
/// # Example
///
/// ```
/// use mkd_duck_ai::test_utils::{MockScenarioRepository, mocks::MockConfig};
///
/// let repo = MockScenarioRepository::new().with_scenario("Hello", "Hi there!");
/// let failing = MockScenarioRepository::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockScenarioRepository {
    storage: Arc<Mutex<Vec<ScenarioRecord>>>,
    next_id: AtomicI64,
    config: MockConfig,
    create_calls: AtomicU64,
    is_healthy: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockScenarioRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicI64::new(1),
            config,
            create_calls: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Seeds a stored scenario.
    #[must_use]
    pub fn with_scenario(self, prompt: &str, answer: &str) -> Self {
        self.insert(prompt, answer);
        self
    }

    /// Gets the number of `create_scenario` calls, including failed ones.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Makes only `create_scenario` fail, reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn get_all_scenarios(&self) -> Vec<ScenarioRecord> {
        self.storage.lock().unwrap().clone()
    }

    fn insert(&self, prompt: &str, answer: &str) -> ScenarioRecord {
        let record = ScenarioRecord {
            scenario_id: self.next_id.fetch_add(1, Ordering::Relaxed),
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        self.storage.lock().unwrap().push(record.clone());
        record
    }

    async fn simulate_latency(&self) {
        if let Some(ms) = self.config.latency_ms {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock database error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }
}

impl Default for MockScenarioRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScenarioRepository for MockScenarioRepository {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }

        self.check_should_fail()
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>, AppError> {
        self.check_should_fail()?;

        let snapshot = self.storage.lock().unwrap().clone();
        self.simulate_latency().await;
        Ok(snapshot)
    }

    async fn get_scenario(&self, id: ScenarioId) -> Result<Option<ScenarioRecord>, AppError> {
        self.check_should_fail()?;

        let storage = self.storage.lock().unwrap();
        Ok(storage.iter().find(|r| r.scenario_id == id).cloned())
    }

    async fn create_scenario(
        &self,
        prompt: &str,
        answer: &str,
    ) -> Result<ScenarioRecord, AppError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;

        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Query(
                "Mock write failure".to_string(),
            )));
        }

        Ok(self.insert(prompt, answer))
    }
}

/// Web search returning canned replies.
///
/// Lookups are keyed by the exact prompt and search type; anything not
/// registered yields `None`, like an unreachable source.
#[derive(Default)]
pub struct MockWebSearch {
    replies: Mutex<HashMap<(String, WebSearchType), String>>,
    calls: Mutex<Vec<(String, WebSearchType)>>,
}

impl MockWebSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reply(self, prompt: &str, kind: WebSearchType, reply: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert((prompt.to_string(), kind), reply.to_string());
        self
    }

    /// All searches performed so far, in order.
    pub fn get_calls(&self) -> Vec<(String, WebSearchType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    async fn search(&self, prompt: &str, kind: WebSearchType) -> Option<String> {
        self.calls.lock().unwrap().push((prompt.to_string(), kind));
        self.replies
            .lock()
            .unwrap()
            .get(&(prompt.to_string(), kind))
            .cloned()
    }
}
