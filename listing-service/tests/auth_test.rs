mod common;

use common::{TestApp, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn register_then_login_returns_bearer_token() {
    let app = TestApp::spawn().await;
    let user = app.register("customer").await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role"], "customer");
    assert_eq!(body["user_id"], user.user_id.as_str());

    app.cleanup().await;
}

#[tokio::test]
async fn me_returns_user_without_password_hash() {
    let app = TestApp::spawn().await;
    let user = app.register("owner").await;

    let response = app.get("/api/auth/me", &user).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["role"], "owner");
    assert!(body.get("password_hash").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = TestApp::spawn().await;
    let user = app.register("vendor").await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "email": user.email.to_uppercase(),
            "password": TEST_PASSWORD,
            "name": "Again",
            "role": "vendor",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn admin_role_cannot_be_self_assigned() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "email": "sneaky@example.com",
            "password": TEST_PASSWORD,
            "name": "Sneaky",
            "role": "admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    let user = app.register("customer").await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": user.email, "password": "definitely-wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::spawn().await;

    let missing = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let garbage = app
        .client
        .get(app.url("/api/auth/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status().as_u16(), 401);

    app.cleanup().await;
}
