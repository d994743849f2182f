pub mod accounts;
pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod flash;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod roster;

use accounts::Authenticator;
use api::create_router;
use axum::{Router, response::Redirect, routing::get};
use db::{Database, Role};
use jwt::{JwtConfig, TokenLifetimes};
use rate_limit::RateLimitConfig;
use roster::Roster;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Lifetimes of access and refresh tokens
    pub token_lifetimes: TokenLifetimes,
    /// External IDs allowed to sign up, per role
    pub roster: Roster,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Whether to key rate limits on X-Forwarded-For (requires running behind a proxy)
    pub trust_forwarded_for: bool,
    /// Signup and login submissions allowed per minute per client IP
    pub auth_attempts_per_minute: NonZeroU32,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::with_lifetimes(
        &config.jwt_secret,
        config.token_lifetimes,
    ));

    let authenticator = Authenticator::new(config.db.clone(), Arc::new(config.roster.clone()));

    let rate_limit = Arc::new(RateLimitConfig::new(
        config.auth_attempts_per_minute,
        config.trust_forwarded_for,
    ));

    let portal = create_router(
        config.db.clone(),
        authenticator,
        jwt,
        config.secure_cookies,
        rate_limit,
    );

    Router::new()
        .route("/", get(Redirect::temporary(Role::Student.login_path())))
        .merge(portal)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
