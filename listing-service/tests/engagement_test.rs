mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn favorites_are_a_set() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let user = app.register("customer").await;
    let property = app.create_property(&lister, "apartment").await;

    for _ in 0..2 {
        let response = app
            .post("/api/favorites", &user, json!({ "property_ids": [property] }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let favorites: Value = app.get("/api/favorites", &user).await.json().await.unwrap();
    assert_eq!(favorites["total"], 1);

    let removed = app
        .delete(&format!("/api/favorites/{}", property), &user)
        .await;
    assert_eq!(removed.status().as_u16(), 200);

    let again = app
        .delete(&format!("/api/favorites/{}", property), &user)
        .await;
    assert_eq!(again.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn favoriting_unknown_property_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.register("customer").await;

    let response = app
        .post("/api/favorites", &user, json!({ "property_ids": ["missing"] }))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn reports_require_an_existing_property() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let customer = app.register("customer").await;
    let property = app.create_property(&lister, "house").await;

    let missing = app
        .post(
            "/api/reports",
            &customer,
            json!({ "property_id": "missing", "reason": "fake" }),
        )
        .await;
    assert_eq!(missing.status().as_u16(), 404);

    let created = app
        .post(
            "/api/reports",
            &customer,
            json!({ "property_id": property, "reason": "fake listing" }),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let report: Value = created.json().await.unwrap();
    assert_eq!(report["status"], "open");

    app.cleanup().await;
}

#[tokio::test]
async fn profile_upsert_creates_then_updates() {
    let app = TestApp::spawn().await;
    let user = app.register("customer").await;

    assert_eq!(app.get("/api/profiles/me", &user).await.status().as_u16(), 404);

    let created = app
        .put("/api/profiles/me", &user, json!({ "first_name": "Asha" }))
        .await;
    assert_eq!(created.status().as_u16(), 200);

    let updated: Value = app
        .put(
            "/api/profiles/me",
            &user,
            json!({ "first_name": "Asha", "last_name": "Rao" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["last_name"], "Rao");
    assert_eq!(updated["status"], "active");

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_listing_clears_it_from_favorites() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let user = app.register("customer").await;
    let property = app.create_property(&lister, "apartment").await;

    app.post("/api/favorites", &user, json!({ "property_ids": [property] }))
        .await;
    let deleted = app
        .delete(&format!("/api/properties/{}", property), &lister)
        .await;
    assert_eq!(deleted.status().as_u16(), 200);

    let favorites: Value = app.get("/api/favorites", &user).await.json().await.unwrap();
    assert_eq!(favorites["total"], 0);

    app.cleanup().await;
}
