//! Test helpers for listing-service integration tests.
//!
//! Each test spawns the full HTTP server against its own MongoDB database.

#![allow(dead_code)]

use listing_service::config::ListingConfig;
use listing_service::models::{Role, User};
use listing_service::services::{init_metrics, JwtService, MongoDb};
use listing_service::startup::Application;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "s3cure-Passw0rd";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
    pub storage_path: String,
    pub jwt: JwtService,
    pub client: Client,
}

/// A registered user and a bearer token for them.
pub struct TestUser {
    pub user_id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_metrics();

        let db_name = format!("listing_test_{}", Uuid::new_v4().simple());
        let storage_path = format!("target/test-storage-{}", Uuid::new_v4());

        let mut config = ListingConfig::from_env().expect("Failed to load configuration");
        config.common.port = 0;
        config.common.host = "127.0.0.1".to_string();
        config.mongodb.uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        config.mongodb.database = db_name.clone();
        config.storage.local_path = storage_path.clone();
        config.geocoding.api_key = None;
        config.rate_limit.auth_attempts = 1_000;

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let jwt = app.state().jwt.clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            storage_path,
            jwt,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user through the public API.
    pub async fn register(&self, role: &str) -> TestUser {
        let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": TEST_PASSWORD,
                "name": "Test User",
                "role": role,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201, "register {} failed", role);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        TestUser {
            user_id: body["user"]["user_id"].as_str().unwrap().to_string(),
            email,
            token: body["token"]["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Admins cannot self-register, so they are inserted directly.
    pub async fn admin(&self) -> TestUser {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        let user = User::new(
            email.clone(),
            "not-a-real-hash".to_string(),
            "Admin".to_string(),
            Role::Admin,
            None,
        );
        self.db
            .users()
            .insert_one(&user, None)
            .await
            .expect("Failed to insert admin");

        let token = self
            .jwt
            .token_response(&user.id, &user.email, user.role)
            .expect("Failed to issue token");

        TestUser {
            user_id: user.id,
            email,
            token: token.access_token,
        }
    }

    pub async fn get(&self, path: &str, user: &TestUser) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, user: &TestUser) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a plan as `admin` and returns its id.
    pub async fn create_plan(&self, admin: &TestUser, plan_type: &str, limits: i64) -> String {
        let response = self
            .post(
                "/api/subscription-plans",
                admin,
                json!({ "plan_type": plan_type, "limits": limits, "price": 99.0 }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["subscription_id"].as_str().unwrap().to_string()
    }

    pub async fn subscribe(&self, user: &TestUser, subscription_id: &str) -> Response {
        self.post(
            "/api/subscriptions/me",
            user,
            json!({ "subscription_id": subscription_id }),
        )
        .await
    }

    /// Lists a property as `user` and returns its id.
    pub async fn create_property(&self, user: &TestUser, kind: &str) -> String {
        let response = self
            .post(
                "/api/properties",
                user,
                json!({
                    "kind": kind,
                    "ad_category": "rent",
                    "home": {
                        "name": "Asha Rao",
                        "phone_number": "9876543210",
                        "type_of_property": "2 BHK",
                    },
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["property_id"].as_str().unwrap().to_string()
    }

    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}
