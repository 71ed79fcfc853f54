mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn changing_plan_records_one_history_entry() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let user = app.register("vendor").await;

    let basic = app.create_plan(&admin, "basic", 5).await;
    let premium = app.create_plan(&admin, "premium", 50).await;

    assert_eq!(app.subscribe(&user, &basic).await.status().as_u16(), 201);
    let original = app
        .db
        .user_subscriptions()
        .find_one(mongodb::bson::doc! { "_id": &user.user_id }, None)
        .await
        .unwrap()
        .unwrap();

    let changed = app.subscribe(&user, &premium).await;
    assert_eq!(changed.status().as_u16(), 200);
    let body: Value = changed.json().await.unwrap();
    assert_eq!(body["previous_subscription_id"], basic.as_str());
    assert_eq!(body["subscription"]["subscription_id"], premium.as_str());

    let history: Value = app
        .get("/api/subscriptions/me/history", &user)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["subscription_id"], basic.as_str());
    assert_eq!(history["items"][0]["change"], "replaced");

    let current = app
        .db
        .user_subscriptions()
        .find_one(mongodb::bson::doc! { "_id": &user.user_id }, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.subscription_id, premium);
    assert_eq!(current.created_on, original.created_on);
    assert!(current.updated_on >= original.updated_on);

    app.cleanup().await;
}

#[tokio::test]
async fn resubscribing_to_same_plan_is_a_no_op() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let user = app.register("customer").await;
    let plan = app.create_plan(&admin, "basic", 5).await;

    app.subscribe(&user, &plan).await;
    let again = app.subscribe(&user, &plan).await;
    assert_eq!(again.status().as_u16(), 200);
    let body: Value = again.json().await.unwrap();
    assert_eq!(body["message"], "Already subscribed to this plan");

    let history: Value = app
        .get("/api/subscriptions/me/history", &user)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history["total"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn unsubscribing_archives_and_removes_the_subscription() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let user = app.register("owner").await;
    let plan = app.create_plan(&admin, "basic", 5).await;
    app.subscribe(&user, &plan).await;

    let response = app.delete("/api/subscriptions/me", &user).await;
    assert_eq!(response.status().as_u16(), 200);
    let entry: Value = response.json().await.unwrap();
    assert_eq!(entry["change"], "deleted");

    let current = app.get("/api/subscriptions/me", &user).await;
    assert_eq!(current.status().as_u16(), 404);

    let again = app.delete("/api/subscriptions/me", &user).await;
    assert_eq!(again.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn subscribing_to_unknown_plan_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.register("customer").await;

    let response = app.subscribe(&user, "no-such-plan").await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn plan_management_is_admin_only() {
    let app = TestApp::spawn().await;
    let vendor = app.register("vendor").await;

    let response = app
        .post(
            "/api/subscription-plans",
            &vendor,
            json!({ "plan_type": "pirate", "limits": 1000 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let list = app.get("/api/subscription-plans", &vendor).await;
    assert_eq!(list.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_plan_type_is_conflict() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    app.create_plan(&admin, "gold", 10).await;

    let response = app
        .post(
            "/api/subscription-plans",
            &admin,
            json!({ "plan_type": "gold", "limits": 20 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn plan_in_use_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let user = app.register("customer").await;
    let plan = app.create_plan(&admin, "basic", 5).await;
    app.subscribe(&user, &plan).await;

    let path = format!("/api/subscription-plans/{}", plan);
    assert_eq!(app.delete(&path, &admin).await.status().as_u16(), 409);

    app.delete("/api/subscriptions/me", &user).await;
    assert_eq!(app.delete(&path, &admin).await.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn plan_identity_fields_cannot_be_updated() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let plan = app.create_plan(&admin, "basic", 5).await;
    let path = format!("/api/subscription-plans/{}", plan);

    let rejected = app
        .patch(&path, &admin, json!({ "plan_type": "renamed" }))
        .await;
    assert_eq!(rejected.status().as_u16(), 400);

    let updated = app.patch(&path, &admin, json!({ "limits": 9 })).await;
    assert_eq!(updated.status().as_u16(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["limits"], 9);
    assert_eq!(body["plan_type"], "basic");

    app.cleanup().await;
}
