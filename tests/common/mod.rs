#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use rollcall::{
    ServerConfig, create_app,
    db::{Database, Role},
    jwt::{JwtConfig, SessionIdentity, TokenClass, TokenLifetimes},
    roster::Roster,
};
use std::num::NonZeroU32;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-for-testing-purposes!";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

fn test_roster() -> Roster {
    Roster::new(
        ["S1001", "S1002", "S1003", "S1004", "S1005", "S1006", "S1007"],
        ["L2001", "L2002"],
    )
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(10_000).await
}

/// App whose signup and login routes accept `attempts` submissions per minute.
/// oneshot requests carry no peer address, so they all share one bucket.
pub async fn create_test_app_with_limit(attempts: u32) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        token_lifetimes: TokenLifetimes::default(),
        roster: test_roster(),
        secure_cookies: false,
        trust_forwarded_for: false,
        auth_attempts_per_minute: NonZeroU32::new(attempts).unwrap(),
    };
    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::new(JWT_SECRET),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn signup(&self, role: Role, external_id: &str, username: &str, password: &str) {
        let response = self
            .post_form(
                role.signup_path(),
                &format!(
                    "{}={}&username={}&password={}",
                    role.id_field(),
                    external_id,
                    username,
                    password
                ),
                None,
            )
            .await;
        assert_eq!(
            location(&response),
            format!("{}?flash=signup_successful", role.login_path())
        );
    }

    /// Log in and return the `(access, refresh)` token values.
    pub async fn login(&self, role: Role, external_id: &str, password: &str) -> (String, String) {
        let response = self
            .post_form(
                role.login_path(),
                &format!(
                    "{}={}&password={}",
                    role.id_field(),
                    external_id,
                    password
                ),
                None,
            )
            .await;
        assert_eq!(
            location(&response),
            format!("{}?flash=login_successful", role.dashboard_path())
        );
        (
            cookie_value(&response, "access_token_cookie").unwrap(),
            cookie_value(&response, "refresh_token_cookie").unwrap(),
        )
    }

    /// Sign up and log in. Returns the access token and the identity's ID.
    pub async fn session(&self, role: Role, external_id: &str) -> (String, i64) {
        self.signup(role, external_id, external_id, "pw1").await;
        let (access, _) = self.login(role, external_id, "pw1").await;
        let id = self.jwt.verify_and_decode(&access).unwrap().id;
        (access, id)
    }

    pub fn token(&self, id: i64, role: Role, class: TokenClass) -> String {
        self.jwt
            .mint(SessionIdentity { id, role }, class)
            .unwrap()
            .token
    }
}

pub fn access_cookie(token: &str) -> String {
    format!("access_token_cookie={}", token)
}

pub fn refresh_cookie(token: &str) -> String {
    format!("refresh_token_cookie={}", token)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Value of a cookie set by the response. Cleared cookies yield `Some("")`.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|cookie| {
        let pair = cookie.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
