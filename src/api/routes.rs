use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer,
};

use super::admin::admin_routes;
use super::auth::auth_routes;
use super::booking::booking_routes;
use super::content::content_routes;
use super::error::api_not_found;
use super::health::health_check;
use super::AppState;
use crate::auth::{cors_layer, security_headers_layer};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes(&state))
        .nest("/booking", booking_routes(&state))
        .nest("/bookings", booking_routes(&state))
        .nest("/content", content_routes(&state))
        .nest("/admin", admin_routes(&state))
        .fallback(api_not_found);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api);

    if let Some(static_dir) = &state.config.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let cors = cors_layer(&state.config.frontend_url, state.config.is_development());

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(security_headers_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error",
            "message": "Internal server error",
        })),
    )
        .into_response()
}
