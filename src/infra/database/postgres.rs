//! PostgreSQL scenario repository.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::domain::{
    AppError, DatabaseError, ScenarioId, ScenarioRecord, ScenarioRepository,
};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL database client with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client with default configuration
    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Apply the versioned scripts in `migrations/`
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn row_to_scenario(row: &sqlx::postgres::PgRow) -> Result<ScenarioRecord, AppError> {
        Ok(ScenarioRecord {
            scenario_id: row.try_get("scenario_db_id").map_err(DatabaseError::from)?,
            prompt: row.try_get("prompt").map_err(DatabaseError::from)?,
            answer: row.try_get("answer").map_err(DatabaseError::from)?,
            created_at: row.try_get("created_at").map_err(DatabaseError::from)?,
        })
    }
}

#[async_trait]
impl ScenarioRepository for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT s.scenario_db_id, s.prompt, s.answer, s.created_at
            FROM duck.scenario s
            ORDER BY s.scenario_db_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.iter().map(Self::row_to_scenario).collect()
    }

    #[instrument(skip(self))]
    async fn get_scenario(&self, id: ScenarioId) -> Result<Option<ScenarioRecord>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT s.scenario_db_id, s.prompt, s.answer, s.created_at
            FROM duck.scenario s
            WHERE s.scenario_db_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.as_ref().map(Self::row_to_scenario).transpose()
    }

    #[instrument(skip(self, prompt, answer))]
    async fn create_scenario(
        &self,
        prompt: &str,
        answer: &str,
    ) -> Result<ScenarioRecord, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO duck.scenario (prompt, answer)
            VALUES ($1, $2)
            RETURNING scenario_db_id, prompt, answer, created_at
            "#,
        )
        .bind(prompt)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Self::row_to_scenario(&row)
    }
}
