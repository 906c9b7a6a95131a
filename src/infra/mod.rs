//! Infrastructure layer implementations.

pub mod auth;
pub mod database;
pub mod observability;
pub mod web;

pub use auth::{Claims, ClientCredentials, JwtConfig, JwtService};
pub use database::{PostgresClient, PostgresConfig};
pub use observability::{LogFormat, PrometheusHandle, init_metrics_handle, init_tracing};
pub use web::{WebSearchConfig, WebSearchEngine};
