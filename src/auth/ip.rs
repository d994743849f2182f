//! Client IP extraction, used to key rate limits.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Extract the client IP address of a request.
///
/// With `trust_forwarded_for`, the first `X-Forwarded-For` hop wins (only safe
/// behind a proxy that overwrites the header). Otherwise the socket address
/// from `ConnectInfo` is used. Returns None if neither is available.
pub fn extract_client_ip(request: &Request, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        let first_hop = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = first_hop {
            return Some(ip.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}
