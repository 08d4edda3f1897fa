use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::auth::{jwt_auth_middleware, AuthService, AuthUser};
use crate::models::{BookingListQuery, CreateBookingRequest};
use crate::services::BookingService;

/// Booking routes; every endpoint requires a bearer token
pub fn booking_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/user/:user_id", get(list_user_bookings))
        .route("/:booking_id", delete(cancel_booking))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
}

#[tracing::instrument(skip(auth_service, booking_service, request), fields(user_id = %auth_user.id))]
async fn create_booking(
    State(auth_service): State<AuthService>,
    State(booking_service): State<BookingService>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<CreateBookingRequest>, ApiError>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = auth_service.current_user(auth_user.id).await?;
    let booking = booking_service.create(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Training booked successfully",
            "booking": booking,
        })),
    ))
}

#[tracing::instrument(skip(booking_service), fields(user_id = %auth_user.id))]
async fn list_bookings(
    State(booking_service): State<BookingService>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<BookingListQuery>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let bookings = booking_service.list(auth_user.id, query.upcoming).await?;

    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

#[tracing::instrument(skip(auth_service, booking_service), fields(requester = %auth_user.id))]
async fn list_user_bookings(
    State(auth_service): State<AuthService>,
    State(booking_service): State<BookingService>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<BookingListQuery>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let requester = auth_service.current_user(auth_user.id).await?;
    let bookings = booking_service.list_for_user(&requester, user_id, query.upcoming).await?;

    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

#[tracing::instrument(skip(auth_service, booking_service), fields(user_id = %auth_user.id))]
async fn cancel_booking(
    State(auth_service): State<AuthService>,
    State(booking_service): State<BookingService>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Path(booking_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let user = auth_service.current_user(auth_user.id).await?;
    let booking = booking_service.cancel(&user, booking_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled successfully",
        "booking": booking,
    })))
}
