use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::{get, put},
    Router,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::auth::{admin_only_middleware, jwt_auth_middleware, AuthService, UpdateUserStatusRequest};
use crate::services::BookingService;
use crate::storage::Store;

/// Admin routes; token and admin role required
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_all_bookings))
        .route("/bookings/stats", get(booking_stats))
        .route("/users", get(list_users))
        .route("/users/:user_id/status", put(update_user_status))
        .route("/stats", get(database_stats))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            admin_only_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
}

async fn list_all_bookings(State(booking_service): State<BookingService>) -> Result<Json<Value>, ApiError> {
    let bookings = booking_service.list_all().await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

async fn booking_stats(State(booking_service): State<BookingService>) -> Result<Json<Value>, ApiError> {
    let stats = booking_service.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

async fn list_users(State(auth_service): State<AuthService>) -> Result<Json<Value>, ApiError> {
    let users = auth_service.list_users().await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}

#[tracing::instrument(skip(auth_service, request))]
async fn update_user_status(
    State(auth_service): State<AuthService>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateUserStatusRequest>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let user = auth_service.set_user_active(user_id, request.is_active).await?;
    Ok(Json(json!({
        "success": true,
        "message": if user.is_active { "User activated" } else { "User deactivated" },
        "user": user,
    })))
}

/// Record count per collection and the active backend
async fn database_stats(State(store): State<Store>) -> Result<Json<Value>, ApiError> {
    let collections = store.collection_counts().await?;
    Ok(Json(json!({
        "success": true,
        "backend": store.backend_name(),
        "collections": collections,
    })))
}
