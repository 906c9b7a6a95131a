//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod keywords;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, DatabaseError, ExternalServiceError, ValidationError};
pub use traits::{ScenarioRepository, WebSearch};
pub use types::{
    ErrorDetail, ErrorResponse, HealthResponse, HealthStatus, PromptLearnRequest, PromptRequest,
    PromptResponse, RateLimitResponse, ResponseSourceType, Scenario, ScenarioId, ScenarioRecord,
    TokenRequest, TokenResponse, VersionResponse, WebSearchType,
};
