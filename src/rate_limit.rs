//! Rate limiting for signup and login.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

use crate::auth::extract_client_ip;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default credential submissions per minute per IP.
pub const DEFAULT_AUTH_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Requests whose client IP cannot be determined share this bucket.
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limiting configuration for credential endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for signup and login submissions
    pub auth: Arc<IpLimiter>,
    /// Whether to key on the first `X-Forwarded-For` hop
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    pub fn new(attempts_per_minute: NonZeroU32, trust_forwarded_for: bool) -> Self {
        Self {
            auth: Arc::new(RateLimiter::keyed(Quota::per_minute(attempts_per_minute))),
            trust_forwarded_for,
        }
    }
}

/// Middleware for rate limiting signup and login submissions.
pub async fn rate_limit_auth(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request, config.trust_forwarded_for)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    match config.auth.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(ip = %ip, "Credential submissions rate limited");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts. Please wait before trying again.",
            )
                .into_response()
        }
    }
}
