//! Per-client throttling for the `/api` route group.
//!
//! The client key is the socket peer address. When the service runs behind
//! a trusted proxy (`TRUST_PROXY_HEADERS=true`), `X-Forwarded-For` and then
//! `X-Real-IP` take precedence.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;
use crate::throttle::Admission;

/// Determine the throttle key for a request.
///
/// Returns `None` when neither a trusted header nor the connection info
/// yields an address.
pub fn client_ip<B>(request: &Request<B>, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        let headers = request.headers();

        // Try X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }

        // Try X-Real-IP
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Admit or reject a request against the shared throttle.
///
/// # Errors
///
/// Returns `AppError::RateLimited` when the client is over its limit and
/// `AppError::Internal` when no client key can be determined.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&request, state.config().trust_proxy_headers) else {
        return Err(AppError::Internal(
            "unable to determine client address for throttling".to_owned(),
        ));
    };

    match state.throttle().admit(ip) {
        Admission::Allowed => Ok(next.run(request).await),
        Admission::Denied => {
            tracing::warn!(client = %ip, limit = state.throttle().limit(), "rate limit exceeded");
            Err(AppError::RateLimited)
        }
    }
}
