//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, Path, Request, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::error;
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AppError, DatabaseError, ErrorDetail, ErrorResponse, ExternalServiceError, HealthResponse,
    HealthStatus, PromptLearnRequest, PromptRequest, PromptResponse, RateLimitResponse,
    ResponseSourceType, ScenarioId, ScenarioRecord, TokenRequest, TokenResponse,
    ValidationError, VersionResponse,
};

/// `Json` whose rejections come back as a 400 with the standard error body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::InvalidFormat(rejection.body_text()))
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DuckAI API",
        description = "Rubber duck chat responder backed by learned scenarios and public web sources",
        license(
            name = "MIT"
        )
    ),
    paths(
        prompt_handler,
        learn_handler,
        list_scenarios_handler,
        get_scenario_handler,
        token_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
        version_handler,
    ),
    components(
        schemas(
            PromptRequest,
            PromptResponse,
            PromptLearnRequest,
            ResponseSourceType,
            ScenarioRecord,
            TokenRequest,
            TokenResponse,
            HealthResponse,
            HealthStatus,
            VersionResponse,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "duckai", description = "Chat with the duck"),
        (name = "scenarios", description = "Learned prompt and answer pairs"),
        (name = "auth", description = "Access tokens"),
        (name = "actuator", description = "Health and build information")
    )
)]
pub struct ApiDoc;

/// Ask the duck something
#[utoipa::path(
    post,
    path = "/api/duckai",
    tag = "duckai",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "The duck's reply", body = PromptResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn prompt_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<PromptRequest>,
) -> Json<PromptResponse> {
    let prompt = payload.prompt.as_deref().unwrap_or_default();
    Json(state.responder.generate_response(prompt).await)
}

/// Teach the duck a batch of prompt and answer pairs
#[utoipa::path(
    post,
    path = "/api/duckai/learn",
    tag = "duckai",
    request_body = Vec<PromptLearnRequest>,
    responses(
        (status = 200, description = "Number of scenarios stored", body = PromptResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn learn_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<Vec<PromptLearnRequest>>,
) -> Json<PromptResponse> {
    let learned = state.responder.learn_scenarios(&payload).await;
    Json(PromptResponse::local(format!(
        "Successfully learned {learned} scenarios."
    )))
}

/// List every stored scenario
#[utoipa::path(
    get,
    path = "/api/scenarios",
    tag = "scenarios",
    responses(
        (status = 200, description = "All scenarios", body = Vec<ScenarioRecord>),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn list_scenarios_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScenarioRecord>>, AppError> {
    let scenarios = state.scenario_service.list_scenarios().await?;
    Ok(Json(scenarios))
}

/// Get a single scenario by ID
#[utoipa::path(
    get,
    path = "/api/scenarios/{id}",
    tag = "scenarios",
    params(
        ("id" = i64, Path, description = "Scenario ID")
    ),
    responses(
        (status = 200, description = "Scenario found", body = ScenarioRecord),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse)
    )
)]
pub async fn get_scenario_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ScenarioId>,
) -> Result<Json<ScenarioRecord>, AppError> {
    let scenario = state
        .scenario_service
        .get_scenario(id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound(format!("scenario {id}"))))?;
    Ok(Json(scenario))
}

/// Exchange client credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid client credentials", body = ErrorResponse),
        (status = 501, description = "Token issuance not configured", body = ErrorResponse)
    )
)]
pub async fn token_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let auth = state
        .auth
        .as_ref()
        .ok_or_else(|| AppError::NotSupported("authentication is disabled".to_string()))?;
    Ok(Json(auth.exchange(&payload)?))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/api/actuator/health",
    tag = "actuator",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = state.responder.scenario_count().await;
    Json(state.scenario_service.health_check(loaded).await)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/api/actuator/health/live",
    tag = "actuator",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/api/actuator/health/ready",
    tag = "actuator",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let loaded = state.responder.scenario_count().await;
    let health = state.scenario_service.health_check(loaded).await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build version
#[utoipa::path(
    get,
    path = "/api/actuator/version",
    tag = "actuator",
    responses(
        (status = 200, description = "Crate version", body = VersionResponse)
    )
)]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus scrape endpoint. 404 when no recorder is installed.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.metrics.as_ref() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type) = match &self {
            AppError::Database(db_err) => match db_err {
                DatabaseError::Connection(_) | DatabaseError::PoolExhausted(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "database_error")
                }
                DatabaseError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                DatabaseError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
            AppError::ExternalService(ext_err) => match ext_err {
                ExternalServiceError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                _ => (StatusCode::BAD_GATEWAY, "external_service_error"),
            },
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::NotSupported(_) => (StatusCode::NOT_IMPLEMENTED, "not_supported"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(AppError::Validation(ValidationError::InvalidFormat(
                "prompt".into()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Authentication("bad token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Database(DatabaseError::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Database(DatabaseError::Duplicate("x".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Database(DatabaseError::Connection("down".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::NotSupported("off".into())),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(AppError::Config(ConfigError::MissingEnvVar("X".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/duckai",
            "/api/duckai/learn",
            "/api/scenarios",
            "/api/scenarios/{id}",
            "/api/auth/token",
            "/api/actuator/health",
            "/api/actuator/version",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
