use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_admin_routes_reject_members() {
    let app = TestApp::new().await;
    let member = app.register_user().await;

    for uri in ["/api/admin/bookings", "/api/admin/bookings/stats", "/api/admin/users", "/api/admin/stats"] {
        let (status, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);

        let (status, body) = app.get(uri, Some(&member.token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_booking_overview_and_stats() {
    let app = TestApp::new().await;
    let admin = app.register_admin().await;
    let first = app.register_user().await;
    let second = app.register_user().await;

    app.book(&first, "training_1", "2099-01-01").await;
    app.book(&second, "training_1", "2099-01-01").await;
    let (_, cancelled) = app.book(&second, "training_3", "2099-01-02").await;
    app.delete(
        &format!("/api/booking/{}", cancelled["booking"]["id"].as_str().unwrap()),
        Some(&second.token),
    )
    .await;

    let (status, all) = app.get("/api/admin/bookings", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["count"], 3);

    let (status, body) = app.get("/api/admin/bookings/stats", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["stats"];
    assert_eq!(stats["total_bookings"], 3);
    assert_eq!(stats["active_bookings"], 2);
    assert_eq!(stats["cancelled_bookings"], 1);
    assert_eq!(stats["total_trainings"], 4);
    assert_eq!(stats["popular_trainings"]["Morning yoga"], 2);
}

#[tokio::test]
async fn test_user_management() {
    let app = TestApp::new().await;
    let admin = app.register_admin().await;
    let member = app.register_user().await;

    let (status, body) = app.get("/api/admin/users", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["users"]
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["password_hash"].is_null()));

    let uri = format!("/api/admin/users/{}/status", member.id);
    let (status, body) = app
        .request(Method::PUT, &uri, Some(&admin.token), Some(json!({ "isActive": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&admin.token), Some(json!({ "is_active": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], true);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/admin/users/{}/status", uuid::Uuid::new_v4()),
            Some(&admin.token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_database_stats() {
    let app = TestApp::new().await;
    let admin = app.register_admin().await;
    let member = app.register_user().await;
    app.book(&member, "training_2", "2099-01-01").await;

    let (status, body) = app.get("/api/admin/stats", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");

    let collections = &body["collections"];
    assert_eq!(collections["users"], 2);
    assert_eq!(collections["trainers"], 4);
    assert_eq!(collections["trainings"], 4);
    assert_eq!(collections["bookings"], 1);
    assert_eq!(collections["exercises"], 6);
    assert_eq!(collections["muscle_groups"], 6);
}
