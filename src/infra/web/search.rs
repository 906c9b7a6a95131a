//! Web search client for Wikipedia, JokeAPI and Open Library.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::{AppError, ExternalServiceError, WebSearch, WebSearchType};

use super::format::{
    format_book, format_joke, format_wikipedia_summary, sanitize_prompt_for_books,
    sanitize_prompt_for_wiki,
};

/// Endpoints and HTTP settings for the web sources
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub user_agent: String,
    pub wikipedia_base_url: String,
    pub joke_url: String,
    pub openlibrary_search_url: String,
    pub openlibrary_cover_url: String,
    /// Minimum spacing between two Wikipedia requests
    pub min_interval: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("mkd-duck-ai/", env!("CARGO_PKG_VERSION")).to_string(),
            wikipedia_base_url: "https://en.wikipedia.org/api/rest_v1/page/summary/".to_string(),
            joke_url: "https://v2.jokeapi.dev/joke/Any?safe-mode".to_string(),
            openlibrary_search_url: "https://openlibrary.org/search.json?q=".to_string(),
            openlibrary_cover_url: "https://covers.openlibrary.org/b/id/".to_string(),
            min_interval: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(3000),
            read_timeout: Duration::from_millis(5000),
        }
    }
}

/// Fetches Markdown-ready answers from public APIs, with attribution.
pub struct WebSearchEngine {
    http_client: Client,
    config: WebSearchConfig,
    last_wiki_request: Mutex<Option<Instant>>,
}

impl WebSearchEngine {
    pub fn new(config: WebSearchConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| AppError::ExternalService(ExternalServiceError::from(e)))?;
        info!(user_agent = %config.user_agent, "Created web search client");
        Ok(Self {
            http_client,
            config,
            last_wiki_request: Mutex::new(None),
        })
    }

    pub fn with_defaults() -> Result<Self, AppError> {
        Self::new(WebSearchConfig::default())
    }

    /// GETs `url` and parses the body as JSON. Non-2xx is an error.
    async fn get_json(&self, url: &str) -> Result<Value, ExternalServiceError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalServiceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Waits until `min_interval` has passed since the previous Wikipedia
    /// request. Holding the lock while sleeping queues concurrent callers.
    async fn fetch_wikipedia_rate_limited(
        &self,
        topic: &str,
    ) -> Result<Option<String>, ExternalServiceError> {
        let mut last = self.last_wiki_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_interval {
                tokio::time::sleep(self.config.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
        drop(last);

        self.fetch_wikipedia_summary(topic).await
    }

    async fn fetch_wikipedia_summary(
        &self,
        topic: &str,
    ) -> Result<Option<String>, ExternalServiceError> {
        let url = format!(
            "{}{}",
            self.config.wikipedia_base_url,
            urlencoding::encode(topic)
        );
        let root = self.get_json(&url).await?;
        Ok(format_wikipedia_summary(topic, &root))
    }

    async fn fetch_joke(&self) -> Result<Option<String>, ExternalServiceError> {
        let root = self.get_json(&self.config.joke_url).await?;
        Ok(format_joke(&root))
    }

    async fn fetch_book(&self, query: &str) -> Result<Option<String>, ExternalServiceError> {
        let url = format!(
            "{}{}&limit=1",
            self.config.openlibrary_search_url,
            urlencoding::encode(query)
        );
        let root = self.get_json(&url).await?;
        Ok(format_book(&root, &self.config.openlibrary_cover_url))
    }
}

#[async_trait]
impl WebSearch for WebSearchEngine {
    #[instrument(skip(self))]
    async fn search(&self, prompt: &str, kind: WebSearchType) -> Option<String> {
        let result = match kind {
            WebSearchType::Wiki => {
                let topic = sanitize_prompt_for_wiki(prompt);
                if topic.is_empty() {
                    return None;
                }
                self.fetch_wikipedia_rate_limited(&topic).await
            }
            WebSearchType::Joke => self.fetch_joke().await,
            WebSearchType::Book => {
                let query = sanitize_prompt_for_books(prompt);
                if query.is_empty() {
                    return None;
                }
                self.fetch_book(&query).await
            }
            WebSearchType::Other => return None,
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = %e, ?kind, "Web search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, Uri, header},
        response::{IntoResponse, Response},
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex as StdMutex};

    type Seen = Arc<StdMutex<Vec<(String, String)>>>;

    /// Stands in for all three sources. Records the path, query and
    /// user agent of every request.
    async fn fake_source(State(seen): State<Seen>, uri: Uri, headers: HeaderMap) -> Response {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.lock().unwrap().push((uri.to_string(), user_agent));

        let path = uri.path();
        if path.starts_with("/wiki/Missingno") {
            return (StatusCode::NOT_FOUND, Json(json!({ "title": "Not found." }))).into_response();
        }
        if path.starts_with("/wiki/") {
            return Json(json!({ "extract": "A waterbird with a broad bill." })).into_response();
        }
        match path {
            "/joke" => Json(json!({
                "type": "twopart",
                "setup": "What do ducks watch?",
                "delivery": "Duck-umentaries."
            }))
            .into_response(),
            "/book" => Json(json!({
                "docs": [{ "title": "The Hobbit", "author_name": ["J.R.R. Tolkien"] }]
            }))
            .into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn local_engine(min_interval: Duration) -> (WebSearchEngine, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .fallback(fake_source)
            .with_state(Arc::clone(&seen));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let engine = WebSearchEngine::new(WebSearchConfig {
            user_agent: "DuckAI-Test".to_string(),
            wikipedia_base_url: format!("{base}/wiki/"),
            joke_url: format!("{base}/joke"),
            openlibrary_search_url: format!("{base}/book?q="),
            openlibrary_cover_url: format!("{base}/covers/"),
            min_interval,
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
        })
        .unwrap();
        (engine, seen)
    }

    /// Points every source at a closed local port so nothing leaves the host.
    fn offline_engine() -> WebSearchEngine {
        WebSearchEngine::new(WebSearchConfig {
            user_agent: "DuckAI-Test".to_string(),
            wikipedia_base_url: "http://127.0.0.1:9/wiki/".to_string(),
            joke_url: "http://127.0.0.1:9/joke".to_string(),
            openlibrary_search_url: "http://127.0.0.1:9/book?q=".to_string(),
            openlibrary_cover_url: "http://127.0.0.1:9/covers/".to_string(),
            min_interval: Duration::ZERO,
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = WebSearchConfig::default();
        assert!(config.user_agent.starts_with("mkd-duck-ai/"));
        assert_eq!(config.min_interval, Duration::from_secs(1));
        assert!(config.wikipedia_base_url.ends_with("/page/summary/"));
    }

    #[tokio::test]
    async fn test_blank_prompt_returns_none() {
        let engine = offline_engine();
        assert!(engine.search("   ", WebSearchType::Wiki).await.is_none());
        assert!(engine.search("", WebSearchType::Book).await.is_none());
    }

    #[tokio::test]
    async fn test_stopword_only_prompt_returns_none() {
        let engine = offline_engine();
        assert!(engine.search("What is the?", WebSearchType::Wiki).await.is_none());
    }

    #[tokio::test]
    async fn test_other_type_returns_none() {
        let engine = offline_engine();
        assert!(
            engine
                .search("Tell me something", WebSearchType::Other)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unreachable_sources_return_none() {
        let engine = offline_engine();
        assert!(engine.search("What is Rust?", WebSearchType::Wiki).await.is_none());
        assert!(engine.search("joke", WebSearchType::Joke).await.is_none());
        assert!(engine.search("Books by Tolkien", WebSearchType::Book).await.is_none());
    }

    #[tokio::test]
    async fn test_wikipedia_requests_are_spaced() {
        let mut config = WebSearchConfig {
            wikipedia_base_url: "http://127.0.0.1:9/wiki/".to_string(),
            connect_timeout: Duration::from_millis(100),
            read_timeout: Duration::from_millis(100),
            ..WebSearchConfig::default()
        };
        config.min_interval = Duration::from_millis(150);
        let engine = WebSearchEngine::new(config).unwrap();

        let start = Instant::now();
        engine.search("Ducks", WebSearchType::Wiki).await;
        engine.search("Geese", WebSearchType::Wiki).await;

        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_wikipedia_summary_fetched_with_encoded_title() {
        let (engine, seen) = local_engine(Duration::ZERO).await;

        let reply = engine
            .search("Tell me about the Eiffel tower (Paris)", WebSearchType::Wiki)
            .await;
        assert_eq!(
            reply.as_deref(),
            Some("A waterbird with a broad bill.<br>*(Information from Wikipedia, CC BY-SA 3.0)*")
        );

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(
                "/wiki/Eiffel_Tower_%28paris%29".to_string(),
                "DuckAI-Test".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_book_query_is_encoded_and_limited() {
        let (engine, seen) = local_engine(Duration::ZERO).await;

        let reply = engine.search("Books by Tolkien", WebSearchType::Book).await;
        assert_eq!(
            reply.as_deref(),
            Some(
                "### The Hobbit<br>**Author:** J.R.R. Tolkien\
                 <br>*(Information from Open Library, Free & Open API)*"
            )
        );

        let (uri, user_agent) = seen.lock().unwrap()[0].clone();
        assert_eq!(uri, "/book?q=by%20tolkien&limit=1");
        assert_eq!(user_agent, "DuckAI-Test");
    }

    #[tokio::test]
    async fn test_joke_fetched() {
        let (engine, _seen) = local_engine(Duration::ZERO).await;

        let reply = engine.search("Tell me a joke", WebSearchType::Joke).await;
        assert_eq!(
            reply.as_deref(),
            Some("What do ducks watch?<br>Duck-umentaries.")
        );
    }

    #[tokio::test]
    async fn test_non_success_status_returns_none() {
        let (engine, seen) = local_engine(Duration::ZERO).await;

        assert!(engine.search("What is Missingno?", WebSearchType::Wiki).await.is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_wikipedia_requests_are_serialised() {
        let min_interval = Duration::from_millis(150);
        let (engine, seen) = local_engine(min_interval).await;

        let start = Instant::now();
        let (first, second) = tokio::join!(
            engine.search("Ducks", WebSearchType::Wiki),
            engine.search("Geese", WebSearchType::Wiki)
        );

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(start.elapsed() >= min_interval);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
