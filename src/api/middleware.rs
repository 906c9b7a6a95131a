//! HTTP middleware for API layer.

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, header},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::domain::AppError;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Bearer token authentication middleware.
///
/// Passes every request through when the state carries no `JwtService`.
/// Otherwise the token must verify; its claims are stored in the request
/// extensions for handlers that want the caller's identity.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let Some(auth) = state.auth.as_ref() else {
        return next.run(request).await;
    };

    let Some(token) = bearer_token(&request) else {
        warn!(path = %request.uri().path(), "Auth failed: missing bearer token");
        return AppError::Authentication("Missing bearer token".to_string()).into_response();
    };

    match auth.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Auth failed: invalid token");
            e.into_response()
        }
    }
}
