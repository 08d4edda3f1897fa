use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::storage::Store;

pub async fn health_check(State(store): State<Store>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "service": "fitstudio",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": store.backend_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
