use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::task::JoinSet;

use crate::common::TestApp;

const FAR_DATE: &str = "2099-01-01";

#[tokio::test]
async fn test_book_list_and_duplicate() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let (status, body) = app.book(&user, "training_1", FAR_DATE).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["booking"]["status"], "confirmed");
    assert_eq!(body["booking"]["title"], "Morning yoga");
    assert_eq!(body["booking"]["trainer_name"], "Anna Petrova");
    assert_eq!(body["booking"]["start_time"], "08:00:00");

    let (status, body) = app.book(&user, "training_1", FAR_DATE).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // both path spellings reach the same handlers
    let (status, listed) = app.get("/api/booking", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 1);

    let (_, listed) = app.get("/api/bookings", Some(&user.token)).await;
    assert_eq!(listed["bookings"][0]["training_id"], "training_1");
}

#[tokio::test]
async fn test_booking_requires_token() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/bookings",
            None,
            json!({ "training_id": "training_1", "date": FAR_DATE }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_validation() {
    let app = TestApp::new().await;
    let user = app.register_user().await;
    let yesterday = (Utc::now() - Duration::days(1)).date_naive().to_string();

    let (status, _) = app.book(&user, "training_1", &yesterday).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.book(&user, "training_404", FAR_DATE).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.book(&user, "training_1", "01/02/2099").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/bookings", Some(&user.token), json!({ "date": FAR_DATE }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_and_cancellation_frees_one_slot() {
    let app = TestApp::new().await;

    // training_4 seats 12
    let mut members = Vec::new();
    for _ in 0..12 {
        let user = app.register_user().await;
        let (status, _) = app.book(&user, "training_4", FAR_DATE).await;
        assert_eq!(status, StatusCode::CREATED);
        members.push(user);
    }

    let waiting = app.register_user().await;
    let (status, body) = app.book(&waiting, "training_4", FAR_DATE).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Training full");

    let (_, listed) = app
        .get(&format!("/api/content/trainings/training_4?date={}", FAR_DATE), None)
        .await;
    assert_eq!(listed["training"]["available_spots"], 0);
    assert_eq!(listed["training"]["is_fully_booked"], true);

    let (_, own) = app.get("/api/bookings", Some(&members[0].token)).await;
    let booking_id = own["bookings"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .delete(&format!("/api/booking/{}", booking_id), Some(&members[0].token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "cancelled");

    let (status, _) = app.book(&waiting, "training_4", FAR_DATE).await;
    assert_eq!(status, StatusCode::CREATED);

    let another = app.register_user().await;
    let (status, _) = app.book(&another, "training_4", FAR_DATE).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_bookings_never_overfill() {
    let app = TestApp::new().await;

    // training_3 seats 20; 30 members race for it
    let mut members = Vec::new();
    for _ in 0..30 {
        members.push(app.register_user().await);
    }

    let mut tasks = JoinSet::new();
    for member in members {
        let app = app.clone();
        tasks.spawn(async move { app.book(&member, "training_3", FAR_DATE).await.0 });
    }

    let mut created = 0;
    let mut rejected = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 20);
    assert_eq!(rejected, 10);
}

#[tokio::test]
async fn test_concurrent_duplicate_bookings_yield_one_seat() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let app = app.clone();
        let user = user.clone();
        tasks.spawn(async move { app.book(&user, "training_2", FAR_DATE).await.0 });
    }

    let mut created = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap() == StatusCode::CREATED {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    let (_, listed) = app.get("/api/bookings", Some(&user.token)).await;
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn test_cancel_rules() {
    let app = TestApp::new().await;
    let owner = app.register_user().await;
    let stranger = app.register_user().await;

    let (_, body) = app.book(&owner, "training_2", FAR_DATE).await;
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/booking/{}", booking_id);

    let (status, _) = app.delete(&uri, Some(&stranger.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, Some(&owner.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&uri, Some(&owner.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .delete(&format!("/api/booking/{}", uuid::Uuid::new_v4()), Some(&owner.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // a cancelled booking does not block rebooking
    let (status, _) = app.book(&owner, "training_2", FAR_DATE).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_same_day_session_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let user = app.register_user().await;
    let today = Utc::now().date_naive();

    // a session starting one hour from now (clamped to today)
    let start = (Utc::now() + Duration::hours(1)).time();
    if (Utc::now() + Duration::hours(1)).date_naive() != today {
        return;
    }
    let admin = app.register_admin().await;
    let (status, created) = app
        .post(
            "/api/content/trainings",
            Some(&admin.token),
            json!({
                "trainer_id": "trainer_1",
                "title": "Lunch express",
                "start_time": start.format("%H:%M:%S").to_string(),
                "duration_minutes": 30,
                "capacity": 5
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let training_id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app.book(&user, &training_id, &today.to_string()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .delete(
            &format!("/api/booking/{}", body["booking"]["id"].as_str().unwrap()),
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cancellation too late");
}

#[tokio::test]
async fn test_upcoming_filter() {
    let app = TestApp::new().await;
    let user = app.register_user().await;

    app.book(&user, "training_1", "2099-02-01").await;
    let (_, cancelled) = app.book(&user, "training_2", "2099-01-15").await;
    app.delete(
        &format!("/api/booking/{}", cancelled["booking"]["id"].as_str().unwrap()),
        Some(&user.token),
    )
    .await;
    app.book(&user, "training_3", "2099-01-10").await;

    let (_, all) = app.get("/api/bookings", Some(&user.token)).await;
    assert_eq!(all["count"], 3);

    let (status, upcoming) = app.get("/api/bookings?upcoming=true", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming["count"], 2);
    assert_eq!(upcoming["bookings"][0]["training_id"], "training_3");
    assert_eq!(upcoming["bookings"][1]["training_id"], "training_1");
}

#[tokio::test]
async fn test_bookings_by_user_id() {
    let app = TestApp::new().await;
    let user = app.register_user().await;
    let other = app.register_user().await;
    let admin = app.register_admin().await;
    app.book(&user, "training_1", FAR_DATE).await;

    let uri = format!("/api/booking/user/{}", user.id);

    let (status, own) = app.get(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["count"], 1);

    let (status, _) = app.get(&uri, Some(&other.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, seen_by_admin) = app.get(&uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen_by_admin["count"], 1);

    let (status, _) = app.get("/api/booking/user/not-a-uuid", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
