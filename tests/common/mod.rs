use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::faker::name::en::Name;
use fake::Fake;
use fitstudio::api::{create_routes, AppState};
use fitstudio::auth::RateLimitConfig;
use fitstudio::config::{AppConfig, CatalogSeeder, StorageConfig};
use fitstudio::models::UserRole;
use fitstudio::services::LogMailer;
use fitstudio::storage::Store;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("fitstudio=debug")
            .with_test_writer()
            .try_init();
    });
}

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "test_secret_key_for_testing_only".to_string(),
        bcrypt_cost: 4,
        auth_rate_limit: RateLimitConfig {
            max_requests: 10_000,
            window_seconds: 60,
            ..RateLimitConfig::default()
        },
        storage: StorageConfig::memory(),
        ..AppConfig::default()
    }
}

/// Router over a seeded in-memory store
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Store,
}

/// A registered member and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        init_test_logging();

        let store = Store::in_memory();
        CatalogSeeder::new(store.clone())
            .seed_all()
            .await
            .expect("Failed to seed catalog");

        let router = create_routes(AppState::new(config, store.clone(), Arc::new(LogMailer)));
        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a member with a random name and a unique email
    pub async fn register_user(&self) -> TestUser {
        let email = MockDataGenerator::email();
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "name": MockDataGenerator::name(),
                    "email": email,
                    "password": TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Register a member and promote them to admin directly in the store
    pub async fn register_admin(&self) -> TestUser {
        let user = self.register_user().await;
        let id = Uuid::parse_str(&user.id).unwrap();

        self.store
            .modify_user(id, |u| {
                u.role = UserRole::Admin;
                true
            })
            .await
            .unwrap();

        user
    }

    pub async fn book(&self, user: &TestUser, training_id: &str, date: &str) -> (StatusCode, Value) {
        self.post(
            "/api/bookings",
            Some(&user.token),
            json!({ "training_id": training_id, "date": date }),
        )
        .await
    }
}

/// Mock data generators
pub struct MockDataGenerator;

impl MockDataGenerator {
    pub fn name() -> String {
        let name: String = Name().fake();
        // keep within the 2..=50 character rule
        name.chars().take(50).collect()
    }

    pub fn email() -> String {
        format!("member.{}@example.com", Uuid::new_v4().simple())
    }
}
