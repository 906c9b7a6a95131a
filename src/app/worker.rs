//! Background worker that periodically reloads the scenario set.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use super::responder::ScenarioResponderEngine;

/// Configuration for the background worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interval between reloads
    pub reload_interval: Duration,
    /// Whether the worker is enabled
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reload_interval: Duration::from_secs(300),
            enabled: true,
        }
    }
}

/// Keeps the responder in sync with scenarios stored by other instances
/// or inserted directly into the database.
pub struct ScenarioReloadWorker {
    responder: Arc<ScenarioResponderEngine>,
    config: WorkerConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl ScenarioReloadWorker {
    pub fn new(
        responder: Arc<ScenarioResponderEngine>,
        config: WorkerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            responder,
            config,
            shutdown_rx,
        }
    }

    /// Run the worker loop
    pub async fn run(mut self) {
        if !self.config.enabled {
            info!("Scenario reload worker is disabled");
            return;
        }

        info!(
            reload_interval = ?self.config.reload_interval,
            "Starting scenario reload worker"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.reload_interval) => {
                    self.reload().await;
                }
                result = self.shutdown_rx.changed() => {
                    if result.is_err() || *self.shutdown_rx.borrow() {
                        info!("Scenario reload worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn reload(&self) {
        if let Err(e) = self.responder.reload_scenarios().await {
            error!(error = ?e, "Scheduled scenario reload failed, keeping previous set");
        }
    }
}

/// Spawn the background worker as a tokio task
pub fn spawn_worker(
    responder: Arc<ScenarioResponderEngine>,
    config: WorkerConfig,
) -> (tokio::task::JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = ScenarioReloadWorker::new(responder, config, shutdown_rx);
    let handle = tokio::spawn(worker.run());
    (handle, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ScenarioService;
    use crate::domain::ScenarioRepository;
    use crate::test_utils::{MockScenarioRepository, MockWebSearch};

    fn create_test_responder(
        repo: Arc<MockScenarioRepository>,
    ) -> Arc<ScenarioResponderEngine> {
        let service = Arc::new(ScenarioService::new(repo));
        Arc::new(ScenarioResponderEngine::new(
            service,
            Arc::new(MockWebSearch::new()),
        ))
    }

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.reload_interval, Duration::from_secs(300));
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_worker_disabled_returns_immediately() {
        let responder = create_test_responder(Arc::new(MockScenarioRepository::new()));
        let config = WorkerConfig {
            reload_interval: Duration::from_millis(100),
            enabled: false,
        };
        let (_tx, shutdown_rx) = watch::channel(false);
        let worker = ScenarioReloadWorker::new(responder, config, shutdown_rx);

        let result = tokio::time::timeout(Duration::from_millis(500), worker.run()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_worker_reloads_on_interval() {
        let repo = Arc::new(MockScenarioRepository::new());
        let responder = create_test_responder(repo.clone());
        assert_eq!(responder.scenario_count().await, 0);

        repo.create_scenario("Hello", "Hi there!").await.unwrap();

        let (handle, shutdown_tx) = spawn_worker(
            Arc::clone(&responder),
            WorkerConfig {
                reload_interval: Duration::from_millis(20),
                enabled: true,
            },
        );

        let mut reloaded = false;
        for _ in 0..50 {
            if responder.scenario_count().await == 1 {
                reloaded = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(reloaded, "worker should have reloaded the new scenario");

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_worker_shutdown_via_channel() {
        let responder = create_test_responder(Arc::new(MockScenarioRepository::new()));
        let config = WorkerConfig {
            reload_interval: Duration::from_secs(60),
            enabled: true,
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = ScenarioReloadWorker::new(responder, config, shutdown_rx);

        let handle = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(50)).await;

        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok(), "Worker should shutdown within 2 seconds");
    }

    #[tokio::test]
    async fn test_worker_survives_reload_errors() {
        let responder = create_test_responder(Arc::new(MockScenarioRepository::failing("down")));
        let (handle, shutdown_tx) = spawn_worker(
            responder,
            WorkerConfig {
                reload_interval: Duration::from_millis(10),
                enabled: true,
            },
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok());
    }
}
