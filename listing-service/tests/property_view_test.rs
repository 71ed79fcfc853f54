mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn views_are_counted_until_the_plan_limit() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let lister = app.register("owner").await;
    let viewer = app.register("customer").await;

    let plan = app.create_plan(&admin, "basic", 2).await;
    assert_eq!(app.subscribe(&viewer, &plan).await.status().as_u16(), 201);
    let property = app.create_property(&lister, "apartment").await;
    let path = format!("/api/properties/{}", property);

    for expected in 1..=2 {
        let response = app.get(&path, &viewer).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["usage"]["viewed_count"], expected);
        assert_eq!(body["usage"]["limit"], 2);
    }

    let rejected = app.get(&path, &viewer).await;
    assert_eq!(rejected.status().as_u16(), 403);

    let usage: Value = app
        .get("/api/subscriptions/me/usage", &viewer)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(usage["viewed_count"], 2);
    assert_eq!(usage["remaining"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn view_without_subscription_is_not_found() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let viewer = app.register("customer").await;
    let property = app.create_property(&lister, "house").await;

    let response = app
        .get(&format!("/api/properties/{}", property), &viewer)
        .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn plan_without_limits_is_a_server_error() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let lister = app.register("owner").await;
    let viewer = app.register("customer").await;

    let plan = app.create_plan(&admin, "broken", 5).await;
    app.db
        .subscription_plans()
        .update_one(
            mongodb::bson::doc! { "_id": &plan },
            mongodb::bson::doc! { "$unset": { "limits": "" } },
            None,
        )
        .await
        .unwrap();
    app.subscribe(&viewer, &plan).await;
    let property = app.create_property(&lister, "apartment").await;

    let response = app
        .get(&format!("/api/properties/{}", property), &viewer)
        .await;
    assert_eq!(response.status().as_u16(), 500);

    app.cleanup().await;
}

#[tokio::test]
async fn lister_views_are_not_metered() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let property = app.create_property(&lister, "land").await;

    let response = app
        .get(&format!("/api/properties/{}", property), &lister)
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("usage").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn missing_property_is_not_found_without_consuming_quota() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let viewer = app.register("customer").await;
    let plan = app.create_plan(&admin, "basic", 1).await;
    app.subscribe(&viewer, &plan).await;

    let response = app.get("/api/properties/does-not-exist", &viewer).await;
    assert_eq!(response.status().as_u16(), 404);

    let usage: Value = app
        .get("/api/subscriptions/me/usage", &viewer)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(usage["viewed_count"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn search_returns_summaries_without_metering() {
    let app = TestApp::spawn().await;
    let lister = app.register("owner").await;
    let viewer = app.register("customer").await;
    app.create_property(&lister, "apartment").await;
    app.create_property(&lister, "land").await;

    let response = app.get("/api/properties?kind=land", &viewer).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["kind"], "land");

    app.cleanup().await;
}

#[tokio::test]
async fn admins_are_metered_like_other_viewers() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let lister = app.register("owner").await;
    let property = app.create_property(&lister, "apartment").await;
    let path = format!("/api/properties/{}", property);

    let unsubscribed = app.get(&path, &admin).await;
    assert_eq!(unsubscribed.status().as_u16(), 404);

    let plan = app.create_plan(&admin, "staff", 1).await;
    assert_eq!(app.subscribe(&admin, &plan).await.status().as_u16(), 201);

    let allowed = app.get(&path, &admin).await;
    assert_eq!(allowed.status().as_u16(), 200);
    let body: Value = allowed.json().await.unwrap();
    assert_eq!(body["usage"]["viewed_count"], 1);

    assert_eq!(app.get(&path, &admin).await.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn every_viewing_role_can_subscribe_and_view() {
    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let lister = app.register("owner").await;
    let plan = app.create_plan(&admin, "basic", 5).await;
    let property = app.create_property(&lister, "house").await;
    let path = format!("/api/properties/{}", property);

    for role in ["vendor", "owner", "customer"] {
        let viewer = app.register(role).await;
        assert_eq!(app.subscribe(&viewer, &plan).await.status().as_u16(), 201);
        let response = app.get(&path, &viewer).await;
        assert_eq!(response.status().as_u16(), 200, "{} could not view", role);
    }

    let manager = app.register("property_manager").await;
    assert_eq!(app.get(&path, &manager).await.status().as_u16(), 403);
    assert_eq!(app.subscribe(&manager, &plan).await.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_views_stop_exactly_at_the_limit() {
    const LIMIT: i64 = 3;
    const REQUESTS: usize = 12;

    let app = TestApp::spawn().await;
    let admin = app.admin().await;
    let lister = app.register("owner").await;
    let viewer = app.register("customer").await;

    let plan = app.create_plan(&admin, "burst", LIMIT).await;
    app.subscribe(&viewer, &plan).await;
    let property = app.create_property(&lister, "apartment").await;
    let path = format!("/api/properties/{}", property);

    let responses =
        futures::future::join_all((0..REQUESTS).map(|_| app.get(&path, &viewer))).await;
    let statuses: Vec<u16> = responses.iter().map(|r| r.status().as_u16()).collect();

    let allowed = statuses.iter().filter(|s| **s == 200).count();
    let rejected = statuses.iter().filter(|s| **s == 403).count();
    assert_eq!(allowed, LIMIT as usize, "statuses: {:?}", statuses);
    assert_eq!(rejected, REQUESTS - LIMIT as usize, "statuses: {:?}", statuses);

    let log = app
        .db
        .access_logs()
        .find_one(mongodb::bson::doc! { "_id": &viewer.user_id }, None)
        .await
        .unwrap()
        .expect("access log written");
    assert_eq!(log.viewed_count, LIMIT);

    app.cleanup().await;
}
