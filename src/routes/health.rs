use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness plus a database round trip.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = state.db.get().map_err(|e| e.to_string()).and_then(|conn| {
        let one: Result<i64, _> = conn.query_row("SELECT 1", [], |row| row.get(0));
        one.map_err(|e| e.to_string())
    });

    match db_ok {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "tags_loaded": !state.roastr.tags_loading() })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
