use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, MethodRouter},
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiError, AppState};
use crate::auth::{admin_only_middleware, jwt_auth_middleware};
use crate::models::{CreateExercise, CreateMuscleGroup, CreateTrainer, CreateTraining};
use crate::services::ContentService;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

/// Public catalog reads; creation is admin-only
pub fn content_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/trainers", get(list_trainers).merge(admin_only(state, post(create_trainer))))
        .route(
            "/musclegroups",
            get(list_muscle_groups).merge(admin_only(state, post(create_muscle_group))),
        )
        .route("/exercises", get(list_exercises).merge(admin_only(state, post(create_exercise))))
        .route("/exercises/:muscle_group_id", get(list_exercises_by_group))
        .route("/trainings", get(list_trainings).merge(admin_only(state, post(create_training))))
        .route("/trainings/:training_id", get(get_training))
}

fn admin_only(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            admin_only_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
}

async fn list_trainers(State(content): State<ContentService>) -> Result<Json<Value>, ApiError> {
    let trainers = content.list_trainers().await?;
    Ok(Json(json!({ "success": true, "trainers": trainers })))
}

async fn list_muscle_groups(State(content): State<ContentService>) -> Result<Json<Value>, ApiError> {
    let muscle_groups = content.list_muscle_groups().await?;
    Ok(Json(json!({ "success": true, "muscle_groups": muscle_groups })))
}

async fn list_exercises(State(content): State<ContentService>) -> Result<Json<Value>, ApiError> {
    let exercises = content.list_exercises(None).await?;
    Ok(Json(json!({ "success": true, "exercises": exercises })))
}

async fn list_exercises_by_group(
    State(content): State<ContentService>,
    WithRejection(Path(muscle_group_id), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let exercises = content.list_exercises(Some(&muscle_group_id)).await?;
    Ok(Json(json!({ "success": true, "exercises": exercises })))
}

#[tracing::instrument(skip(content))]
async fn list_trainings(
    State(content): State<ContentService>,
    WithRejection(Query(query), _): WithRejection<Query<DateQuery>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let trainings = content.list_trainings_on(date).await?;
    Ok(Json(json!({ "success": true, "date": date, "trainings": trainings })))
}

#[tracing::instrument(skip(content))]
async fn get_training(
    State(content): State<ContentService>,
    WithRejection(Path(training_id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<DateQuery>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let training = content.get_training(&training_id, date).await?;
    Ok(Json(json!({ "success": true, "training": training })))
}

#[tracing::instrument(skip(content, request))]
async fn create_trainer(
    State(content): State<ContentService>,
    WithRejection(Json(request), _): WithRejection<Json<CreateTrainer>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let trainer = content.create_trainer(request).await?;
    Ok(created("Trainer created", &trainer.id))
}

#[tracing::instrument(skip(content, request))]
async fn create_muscle_group(
    State(content): State<ContentService>,
    WithRejection(Json(request), _): WithRejection<Json<CreateMuscleGroup>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let group = content.create_muscle_group(request).await?;
    Ok(created("Muscle group created", &group.id))
}

#[tracing::instrument(skip(content, request))]
async fn create_exercise(
    State(content): State<ContentService>,
    WithRejection(Json(request), _): WithRejection<Json<CreateExercise>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let exercise = content.create_exercise(request).await?;
    Ok(created("Exercise created", &exercise.id))
}

#[tracing::instrument(skip(content, request))]
async fn create_training(
    State(content): State<ContentService>,
    WithRejection(Json(request), _): WithRejection<Json<CreateTraining>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let training = content.create_training(request).await?;
    Ok(created("Training created", &training.id))
}

fn created(message: &str, id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message, "id": id })),
    )
}
