//! The duck's responder: local scenario matching, web lookups and a
//! sarcastic fallback.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    AppError, PromptLearnRequest, PromptResponse, Scenario, WebSearch, WebSearchType,
};

use super::classifier;
use super::service::ScenarioService;
use super::similarity::{SIMILARITY_THRESHOLD, similarity};

/// Maximum number of prompts kept in the history.
pub const HISTORY_LIMIT: usize = 200;

pub const EMPTY_PROMPT_REPLY: &str = "You must speak for me to quack.";

const FALLBACK_ENDINGS: &[&str] = &[
    "Fascinating. Truly groundbreaking stuff.",
    "Are you sure about that?",
    "Wow. Incredible. I'm totally processing that correctly.",
    "Quack. (That's duck for 'whatever').",
    "I'll add that to my list of things to ignore.",
    "Let me just consult my imaginary friend on that one.",
    "Sounds important. I'll pretend to care.",
];

/// Answers prompts from the learned scenario set, then the web, then a
/// canned reply.
///
/// The scenario set is swapped wholesale on reload, so readers never see a
/// partially loaded list. Reloads and learns are serialised on `writer` so a
/// reload cannot replace the set with a snapshot older than a learned entry.
pub struct ScenarioResponderEngine {
    scenario_service: Arc<ScenarioService>,
    web_search: Arc<dyn WebSearch>,
    scenarios: RwLock<Arc<Vec<Scenario>>>,
    writer: Mutex<()>,
    history: Mutex<VecDeque<String>>,
}

impl ScenarioResponderEngine {
    #[must_use]
    pub fn new(scenario_service: Arc<ScenarioService>, web_search: Arc<dyn WebSearch>) -> Self {
        Self {
            scenario_service,
            web_search,
            scenarios: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(()),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    /// Loads the initial scenario set.
    pub async fn init(&self) -> Result<usize, AppError> {
        self.reload_scenarios().await
    }

    /// Replaces the in-memory scenario set with the stored one.
    ///
    /// On failure the previous set stays in place.
    #[instrument(skip(self))]
    pub async fn reload_scenarios(&self) -> Result<usize, AppError> {
        let _writer = self.writer.lock().await;
        let loaded = self.scenario_service.load_scenarios().await?;
        let count = loaded.len();
        *self.scenarios.write().await = Arc::new(loaded);

        metrics::gauge!("duckai_scenarios_loaded").set(count as f64);
        info!(count, "Reloaded scenarios");
        Ok(count)
    }

    /// Number of scenarios currently available for matching.
    pub async fn scenario_count(&self) -> usize {
        self.scenarios.read().await.len()
    }

    #[instrument(skip(self, prompt))]
    pub async fn generate_response(&self, prompt: &str) -> PromptResponse {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Self::record(PromptResponse::local(EMPTY_PROMPT_REPLY));
        }

        self.remember(trimmed).await;

        if let Some(best) = self.find_best_match(trimmed).await {
            debug!("Answered from a learned scenario");
            return Self::record(PromptResponse::local(best.answer));
        }

        let kind = self.classify_prompt(trimmed);
        if kind != WebSearchType::Other {
            if let Some(reply) = self.web_search.search(trimmed, kind).await {
                debug!(?kind, "Answered from the web");
                return Self::record(PromptResponse::internet(reply));
            }
        }

        Self::record(PromptResponse::local(Self::fallback_reply(trimmed)))
    }

    pub fn classify_prompt(&self, prompt: &str) -> WebSearchType {
        classifier::classify_prompt(prompt)
    }

    /// Stores one scenario and makes it matchable immediately.
    ///
    /// # Errors
    ///
    /// Returns an `AppError` if the repository write fails.
    #[instrument(skip(self, request))]
    pub async fn learn(&self, request: &PromptLearnRequest) -> Result<bool, AppError> {
        let _writer = self.writer.lock().await;
        if !self.scenario_service.add_scenario(request).await? {
            return Ok(false);
        }

        if let Some(scenario) = ScenarioService::normalize(request) {
            let mut guard = self.scenarios.write().await;
            let mut updated = Vec::with_capacity(guard.len() + 1);
            updated.extend(guard.iter().cloned());
            updated.push(scenario);
            *guard = Arc::new(updated);
        }

        metrics::counter!("duckai_scenarios_learned_total").increment(1);
        Ok(true)
    }

    /// Learns a batch and returns how many entries were stored.
    ///
    /// A failing entry does not abort the batch.
    #[instrument(skip(self, requests), fields(batch = requests.len()))]
    pub async fn learn_scenarios(&self, requests: &[PromptLearnRequest]) -> usize {
        let mut learned = 0;
        for request in requests {
            match self.learn(request).await {
                Ok(true) => learned += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to store scenario"),
            }
        }
        info!(learned, "Learned scenarios");
        learned
    }

    /// Snapshot of recent prompts, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.iter().cloned().collect()
    }

    async fn remember(&self, prompt: &str) {
        let mut history = self.history.lock().await;
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(prompt.to_string());
    }

    async fn find_best_match(&self, prompt: &str) -> Option<Scenario> {
        let prompt = prompt.to_lowercase();
        let scenarios = Arc::clone(&*self.scenarios.read().await);

        let mut best: Option<(&Scenario, f64)> = None;
        for scenario in scenarios.iter() {
            let score = similarity(&prompt, &scenario.question.to_lowercase());
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((scenario, score));
            }
        }

        best.filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
            .map(|(scenario, _)| scenario.clone())
    }

    fn fallback_reply(prompt: &str) -> String {
        let ending = FALLBACK_ENDINGS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FALLBACK_ENDINGS[0]);
        format!("You said: \"{prompt}\". {ending}")
    }

    fn record(response: PromptResponse) -> PromptResponse {
        metrics::counter!("duckai_responses_total", "source" => response.source.as_str())
            .increment(1);
        response
    }
}
