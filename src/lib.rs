//! DuckAI backend
//!
//! A rubber duck chat responder. Prompts are answered from learned
//! scenarios when one is similar enough, otherwise from a public web
//! source picked by classifying the prompt, and finally with a canned
//! quip.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │  HTTP handlers, routing, JWT, rate limiting  │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │  Responder, classifier, scenario service,    │
//! │  reload worker                               │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │          Traits, types, errors               │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  PostgreSQL, web sources, tokens, telemetry  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mkd_duck_ai::api::create_router;
//! use mkd_duck_ai::app::AppState;
//! use mkd_duck_ai::infra::{PostgresClient, WebSearchEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
//!     let search = Arc::new(WebSearchEngine::with_defaults()?);
//!
//!     let state = Arc::new(AppState::new(db, search));
//!     state.responder.init().await?;
//!
//!     let router = create_router(state);
//!     axum::serve(listener, router).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
