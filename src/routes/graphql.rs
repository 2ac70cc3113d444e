use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::extract::State;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;

use crate::extractors::MaybeViewer;
use crate::graphql::{attach_notices, scope_request};
use crate::state::AppState;

/// GraphQL endpoint handler. Anonymous callers are served too.
async fn graphql_handler(
    State(state): State<AppState>,
    caller: MaybeViewer,
    Json(req): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let (request, log) = scope_request(
        req,
        state.roastr.clone(),
        state.db.clone(),
        caller.viewer,
        caller.token,
    );

    let response = state.graphql_schema.execute(request).await;
    Json(attach_notices(response, &log))
}

/// GraphQL Playground UI (development tool)
async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// GraphQL router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/playground", get(graphql_playground))
}
