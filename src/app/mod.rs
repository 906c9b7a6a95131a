//! Application layer containing business logic and shared state.

pub mod classifier;
pub mod responder;
pub mod service;
pub mod similarity;
pub mod state;
pub mod worker;

pub use classifier::classify_prompt;
pub use responder::ScenarioResponderEngine;
pub use service::ScenarioService;
pub use state::AppState;
pub use worker::{ScenarioReloadWorker, WorkerConfig, spawn_worker};
