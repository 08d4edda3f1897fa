use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{test_config, MockDataGenerator, TestApp, TEST_PASSWORD};
use fitstudio::auth::RateLimitConfig;

#[tokio::test]
async fn test_register_then_me_resolves_same_user() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Anna Petrova",
                "email": "Anna@Example.com",
                "phone": "+7 (999) 123-45-67",
                "password": "password123"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], "anna@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["password_hash"].is_null());
    assert!(body["user"]["reset_token"].is_null());

    let token = body["token"].as_str().unwrap();
    let (status, me) = app.get("/api/auth/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["id"], body["user"]["id"]);

    let (status, profile) = app.get("/api/auth/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["phone"], "+7 (999) 123-45-67");
}

#[tokio::test]
async fn test_duplicate_email_conflicts_regardless_of_other_fields() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Someone Else",
                "email": user.email.to_uppercase(),
                "password": "another456"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new().await;

    let cases = vec![
        json!({ "name": "Anna", "email": "not-an-email", "password": "password123" }),
        json!({ "name": "Anna", "email": "a@example.com", "password": "short1" }),
        json!({ "name": "Anna", "email": "a@example.com", "password": "lettersonly" }),
        json!({ "name": "A", "email": "a@example.com", "password": "password123" }),
        json!({ "name": "Anna", "email": "a@example.com", "password": "password123", "phone": "123" }),
    ];

    for case in cases {
        let (status, body) = app.post("/api/auth/register", None, case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {}", case);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert!(body["user"]["last_login"].is_string());

    let (status, wrong) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": "wrongpass1" }),
        )
        .await;
    let (unknown_status, unknown) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], unknown["message"]);
}

#[tokio::test]
async fn test_token_checks() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Token {}", user.token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut tampered = user.token.clone();
    tampered.insert(tampered.len() / 2, 'x');
    let (status, body) = app.get("/api/auth/me", Some(&tampered)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = app.get("/api/auth/verify-token", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["id"], user.id.as_str());

    let (status, _) = app
        .request(Method::POST, "/api/auth/logout", Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/profile",
            Some(&user.token),
            Some(json!({ "name": "Renamed Member", "phone": "89991234567" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Renamed Member");
    assert_eq!(body["user"]["phone"], "89991234567");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/auth/profile",
            Some(&user.token),
            Some(json!({ "phone": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, known) = app
        .post("/api/auth/reset-password", None, json!({ "email": user.email }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, unknown) = app
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "email": MockDataGenerator::email() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(known["message"], unknown["message"]);

    let token = app
        .store
        .find_user_by_email(&user.email)
        .await
        .unwrap()
        .and_then(|u| u.reset_token)
        .expect("reset token stored");

    let (status, _) = app
        .post(
            "/api/auth/reset-password-confirm",
            None,
            json!({ "token": "wrong-token", "newPassword": "brandnew99" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/reset-password-confirm",
            None,
            json!({ "token": token, "newPassword": "brandnew99" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": "brandnew99" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/reset-password-confirm",
            None,
            json!({ "token": token, "newPassword": "again12345" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deactivated_account_is_forbidden() {
    let app = TestApp::new().await;
    let admin = app.register_admin().await;
    let user = app.register_user().await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{}/status", user.id),
            Some(&admin.token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // previously issued tokens stop working for account lookups too
    let (status, _) = app.get("/api/auth/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_auth_rate_limit() {
    let mut config = test_config();
    config.auth_rate_limit = RateLimitConfig {
        max_requests: 2,
        window_seconds: 60,
        ..RateLimitConfig::default()
    };
    let app = TestApp::with_config(config).await;

    let login = json!({ "email": "nobody@example.com", "password": TEST_PASSWORD });
    for _ in 0..2 {
        let (status, _) = app.post("/api/auth/login", None, login.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app.post("/api/auth/login", None, login).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);

    // other endpoints are not limited
    let (status, _) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_does_not_reset_rate_limit() {
    let mut config = test_config();
    config.auth_rate_limit = RateLimitConfig {
        max_requests: 2,
        window_seconds: 60,
        ..RateLimitConfig::default()
    };
    let app = TestApp::with_config(config).await;

    let mut statuses = Vec::new();
    for i in 0..3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", format!("198.51.100.{}", i))
            .body(Body::from(
                json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }).to_string(),
            ))
            .unwrap();
        statuses.push(app.send(request).await.0);
    }

    assert_eq!(
        statuses,
        vec![StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED, StatusCode::TOO_MANY_REQUESTS]
    );
}

#[tokio::test]
async fn test_health_and_unknown_api_route() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");

    let (status, body) = app.get("/api/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
