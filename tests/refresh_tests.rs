mod common;

use axum::http::StatusCode;
use common::{
    access_cookie, body_json, cookie_value, create_test_app, refresh_cookie, set_cookies,
};
use rollcall::db::Role;
use rollcall::jwt::{SessionIdentity, TokenClass};

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let app = create_test_app().await;
    app.signup(Role::Lecturer, "L2001", "bob", "pw1").await;
    let (access, refresh) = app.login(Role::Lecturer, "L2001", "pw1").await;
    let original = app.jwt.verify_and_decode(&access).unwrap();

    let response = app
        .post_form("/refresh", "", Some(&refresh_cookie(&refresh)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    // Only the access cookie is replaced.
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("access_token_cookie="));
    assert!(cookies[0].contains("Path=/"));

    let new_access = cookie_value(&response, "access_token_cookie").unwrap();
    let assertion = app.jwt.verify_and_decode(&new_access).unwrap();
    assert_eq!(assertion.class, TokenClass::Access);
    assert_eq!(assertion.identity(), original.identity());

    let json = body_json(response).await;
    assert_eq!(json["msg"], "Access token refreshed");

    let response = app
        .get("/lecturer/dashboard", Some(&access_cookie(&new_access)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_repeatable_with_same_token() {
    let app = create_test_app().await;
    app.signup(Role::Student, "S1001", "alice", "pw1").await;
    let (_, refresh) = app.login(Role::Student, "S1001", "pw1").await;

    for _ in 0..3 {
        let response = app
            .post_form("/refresh", "", Some(&refresh_cookie(&refresh)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let access = cookie_value(&response, "access_token_cookie").unwrap();
        assert_eq!(
            app.jwt.verify_and_decode(&access).unwrap().role,
            Role::Student
        );
    }
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = create_test_app().await;

    let response = app.post_form("/refresh", "", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["error"], "Not authenticated");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = create_test_app().await;
    let (access, _) = app.session(Role::Student, "S1001").await;

    // In the refresh slot
    let response = app
        .post_form("/refresh", "", Some(&refresh_cookie(&access)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Or only in the access slot
    let response = app
        .post_form("/refresh", "", Some(&access_cookie(&access)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_expired_token() {
    let app = create_test_app().await;

    let expired = app
        .jwt
        .mint_at(
            SessionIdentity {
                id: 1,
                role: Role::Student,
            },
            TokenClass::Refresh,
            1_000,
        )
        .unwrap()
        .token;

    let response = app
        .post_form("/refresh", "", Some(&refresh_cookie(&expired)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_does_not_check_store() {
    let app = create_test_app().await;
    let (_, id) = app.session(Role::Student, "S1001").await;
    let refresh = app.token(id, Role::Student, TokenClass::Refresh);

    app.db.users().delete(id).await.unwrap();

    let response = app
        .post_form("/refresh", "", Some(&refresh_cookie(&refresh)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
