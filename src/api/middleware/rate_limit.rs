//! Per-client rate limiting middleware

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::super::state::AppState;
use super::super::types::ApiError;

/// Enforce the per-client request budget before the handler runs.
///
/// Clients are keyed by the first `X-Forwarded-For` entry when present
/// (the service normally sits behind a proxy), falling back to the peer
/// address and finally to a shared bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_id = extract_client_id(&request);

    match state.rate_limiter.check(&client_id).await {
        Ok(decision) if decision.allowed => {
            debug!(
                client_id = %client_id,
                remaining = decision.remaining,
                "request admitted"
            );
            next.run(request).await
        }
        Ok(_) => {
            debug!(client_id = %client_id, "request rejected by rate limiter");
            ApiError::rate_limited("Rate limit exceeded. Try again later.").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn extract_client_id(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
