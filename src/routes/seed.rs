use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::auth::create_session;
use crate::error::AppResult;
use crate::state::AppState;

/// Env var that mounts the seed route.
pub const SEED_ENV: &str = "ROASTR_TEST_SEED";

const SEED_EMAIL: &str = "tester@roastr.test";

/// Test-only: create a fresh viewer with a session and return the session
/// cookie. No profile is written, so the viewer starts without a username.
async fn seed_viewer(State(state): State<AppState>) -> AppResult<Response> {
    let user_id = uuid::Uuid::now_v7().to_string();
    let token = create_session(
        &state.db,
        &user_id,
        Some(SEED_EMAIL),
        state.config.auth.session_hours,
    )?;

    tracing::info!(user_id = %user_id, "Seeded test viewer");

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=3600",
        state.config.auth.cookie_name, token
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        axum::Json(json!({ "user_id": user_id, "token": token })),
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/test/seed", get(seed_viewer))
}
