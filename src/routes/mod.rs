pub mod graphql;
pub mod health;
pub mod seed;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface. `with_seed` mounts the test-only seed route.
pub fn app(state: AppState, with_seed: bool) -> Router {
    let mut app = Router::new().merge(graphql::router()).merge(health::router());

    if with_seed {
        tracing::warn!("Test seed route mounted at /test/seed");
        app = app.merge(seed::router());
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
