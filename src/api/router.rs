//! HTTP routing configuration with rate limiting and OpenAPI documentation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use governor::{
    NotUntil, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::app::AppState;
use crate::domain::{ErrorDetail, ErrorResponse, RateLimitResponse};

use super::handlers::{
    get_scenario_handler, health_check_handler, learn_handler, list_scenarios_handler,
    liveness_handler, metrics_handler, openapi_handler, prompt_handler, readiness_handler,
    token_handler, version_handler,
};
use super::middleware::jwt_auth_middleware;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for the chat and scenario endpoints
    pub general_rps: u32,
    /// Burst size for the chat and scenario endpoints
    pub general_burst: u32,
    /// Requests per second for actuator endpoints
    pub health_rps: u32,
    /// Burst size for actuator endpoints
    pub health_burst: u32,
    /// Key clients by `X-Forwarded-For` / `X-Real-IP`. Only safe behind a
    /// proxy that overwrites those headers; otherwise the peer address is used.
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_rps: 10,
            general_burst: 20,
            health_rps: 100,
            health_burst: 100,
            trust_forwarded_headers: false,
        }
    }
}

type KeyedLimiter = RateLimiter<
    IpAddr,
    governor::state::keyed::DashMapStateStore<IpAddr>,
    DefaultClock,
>;

/// Shared rate limiter state (keyed by client IP)
pub struct RateLimitState {
    api_limiter: KeyedLimiter,
    health_limiter: KeyedLimiter,
    config: RateLimitConfig,
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        let api_quota = Quota::per_second(non_zero(config.general_rps))
            .allow_burst(non_zero(config.general_burst));
        let health_quota = Quota::per_second(non_zero(config.health_rps))
            .allow_burst(non_zero(config.health_burst));

        Self {
            api_limiter: RateLimiter::dashmap(api_quota),
            health_limiter: RateLimiter::dashmap(health_quota),
            config,
        }
    }
}

/// Extract client IP from request (X-Forwarded-For and X-Real-IP when trusted,
/// then ConnectInfo). Unknown clients share one bucket.
fn client_ip_from_request<B>(request: &Request<B>, trust_forwarded: bool) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    if trust_forwarded {
        if let Some(ip) = header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip")) {
            return ip;
        }
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Whole seconds until the bucket refills, never less than one.
fn retry_after_secs(not_until: &NotUntil<<DefaultClock as Clock>::Instant>) -> u64 {
    let wait = not_until.wait_time_from(DefaultClock::default().now());
    wait.as_secs().max(1)
}

/// Rate limit middleware for the chat and scenario endpoints
async fn rate_limit_api_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip =
        client_ip_from_request(&request, rate_limit.config.trust_forwarded_headers);
    let limit = HeaderValue::from(rate_limit.config.general_rps);

    match rate_limit.api_limiter.check_key(&client_ip) {
        Ok(_) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert("X-RateLimit-Limit", limit);
            response
        }
        Err(not_until) => {
            let retry_after = retry_after_secs(&not_until);
            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded. Please slow down your requests.".to_string(),
                },
                retry_after,
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit);
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

/// Rate limit middleware for actuator endpoints
async fn rate_limit_health_middleware(
    State(rate_limit): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let client_ip =
        client_ip_from_request(&request, rate_limit.config.trust_forwarded_headers);
    match rate_limit.health_limiter.check_key(&client_ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let body = ErrorResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response.headers_mut().insert(
                "Retry-After",
                HeaderValue::from(retry_after_secs(&not_until)),
            );
            response
        }
    }
}

fn build_router(app_state: Arc<AppState>, rate_limit: Option<Arc<RateLimitState>>) -> Router {
    let layers = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CorsLayer::permissive());

    let learn = post(learn_handler).route_layer(middleware::from_fn_with_state(
        Arc::clone(&app_state),
        jwt_auth_middleware,
    ));

    let mut api_routes = Router::new()
        .route("/api/duckai", post(prompt_handler))
        .route("/api/duckai/learn", learn)
        .route("/api/scenarios", get(list_scenarios_handler))
        .route("/api/scenarios/{id}", get(get_scenario_handler));

    let mut actuator_routes = Router::new()
        .route("/api/actuator/health", get(health_check_handler))
        .route("/api/actuator/health/live", get(liveness_handler))
        .route("/api/actuator/health/ready", get(readiness_handler))
        .route("/api/actuator/version", get(version_handler));

    if let Some(rate_limit) = rate_limit {
        api_routes = api_routes.layer(middleware::from_fn_with_state(
            Arc::clone(&rate_limit),
            rate_limit_api_middleware,
        ));
        actuator_routes = actuator_routes.layer(middleware::from_fn_with_state(
            rate_limit,
            rate_limit_health_middleware,
        ));
    }

    Router::new()
        .merge(api_routes)
        .merge(actuator_routes)
        .route("/api/auth/token", post(token_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .layer(layers)
        .with_state(app_state)
}

/// Create router without rate limiting
pub fn create_router(app_state: Arc<AppState>) -> Router {
    build_router(app_state, None)
}

/// Create router with per-IP rate limiting on the chat, scenario and
/// actuator endpoints
pub fn create_router_with_rate_limit(app_state: Arc<AppState>, config: RateLimitConfig) -> Router {
    build_router(app_state, Some(Arc::new(RateLimitState::new(config))))
}
