use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_public_catalog_listings() {
    let app = TestApp::new().await;

    let (status, trainers) = app.get("/api/content/trainers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trainers["trainers"].as_array().unwrap().len(), 4);

    let (_, groups) = app.get("/api/content/musclegroups", None).await;
    assert_eq!(groups["muscle_groups"].as_array().unwrap().len(), 6);

    let (_, exercises) = app.get("/api/content/exercises", None).await;
    assert_eq!(exercises["exercises"].as_array().unwrap().len(), 6);

    let (status, legs) = app.get("/api/content/exercises/legs", None).await;
    assert_eq!(status, StatusCode::OK);
    let legs = legs["exercises"].as_array().unwrap();
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0]["muscle_group_id"], "legs");
    assert_eq!(legs[0]["muscle_group"], "Legs");

    let (status, none) = app.get("/api/content/exercises/tail", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(none["exercises"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_training_availability_for_date() {
    let app = TestApp::new().await;
    let user = app.register_user().await;
    app.book(&user, "training_1", "2099-03-01").await;

    let (status, body) = app.get("/api/content/trainings?date=2099-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2099-03-01");

    let trainings = body["trainings"].as_array().unwrap();
    assert_eq!(trainings.len(), 4);
    let yoga = trainings.iter().find(|t| t["id"] == "training_1").unwrap();
    assert_eq!(yoga["available_spots"], 14);
    assert_eq!(yoga["is_fully_booked"], false);
    assert_eq!(yoga["trainer_name"], "Anna Petrova");

    // a different date has its own seat count
    let (_, other_day) = app
        .get("/api/content/trainings/training_1?date=2099-03-02", None)
        .await;
    assert_eq!(other_day["training"]["available_spots"], 15);

    let (status, _) = app.get("/api/content/trainings/training_99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/content/trainings?date=tomorrow", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_catalog_creation_is_admin_only() {
    let app = TestApp::new().await;
    let member = app.register_user().await;
    let admin = app.register_admin().await;
    let trainer = json!({ "name": "Irina Volkova", "specialty": "Pilates", "experience_years": 6 });

    let (status, _) = app.post("/api/content/trainers", None, trainer.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/content/trainers", Some(&member.token), trainer.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post("/api/content/trainers", Some(&admin.token), trainer)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "trainer_5");

    let (_, trainers) = app.get("/api/content/trainers", None).await;
    assert_eq!(trainers["trainers"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_admin_creates_training_and_exercise() {
    let app = TestApp::new().await;
    let admin = app.register_admin().await;

    let (status, body) = app
        .post(
            "/api/content/trainings",
            Some(&admin.token),
            json!({
                "trainer_id": "trainer_2",
                "title": "Boxing basics",
                "start_time": "17:00:00",
                "duration_minutes": 60,
                "capacity": 8,
                "price": 900.0
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "training_5");

    let (status, _) = app
        .post(
            "/api/content/trainings",
            Some(&admin.token),
            json!({
                "trainer_id": "trainer_404",
                "title": "Ghost class",
                "start_time": "17:00:00",
                "duration_minutes": 60,
                "capacity": 8
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/content/exercises",
            Some(&admin.token),
            json!({ "name": "Lunges", "muscle_group_id": "legs" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "exercise_7");

    let (_, legs) = app.get("/api/content/exercises/legs", None).await;
    assert_eq!(legs["exercises"].as_array().unwrap().len(), 2);
}
