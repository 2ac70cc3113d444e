// GraphQL surface over Roastr
// Resolvers read their collaborators (Roastr, the pool, the caller's
// context and token) from request data attached by scope_request.

pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

use std::sync::Arc;

use async_graphql::{Request, Response, Value};

use crate::auth::Viewer;
use crate::extractors::SessionToken;
use crate::notify::NoticeLog;
use crate::service::{Roastr, ViewerContext};
use crate::state::DbPool;

pub use schema::{build_schema, RoastrSchema};

/// Attach everything a resolver needs for one caller. Returns the log that
/// collects the notices raised while the request runs.
pub fn scope_request(
    request: Request,
    roastr: Arc<Roastr>,
    db: DbPool,
    viewer: Option<Viewer>,
    token: Option<SessionToken>,
) -> (Request, Arc<NoticeLog>) {
    let log = Arc::new(NoticeLog::new());
    let ctx = ViewerContext::new(viewer, log.clone());

    let mut request = request.data(roastr).data(db).data(ctx).data(log.clone());
    if let Some(token) = token {
        request = request.data(token);
    }
    (request, log)
}

/// Move the collected notices into `extensions.notices`.
pub fn attach_notices(mut response: Response, log: &NoticeLog) -> Response {
    let notices = log.drain();
    if notices.is_empty() {
        return response;
    }
    match serde_json::to_value(&notices).map(Value::from_json) {
        Ok(Ok(value)) => {
            response.extensions.insert("notices".to_string(), value);
        }
        Ok(Err(e)) => tracing::error!("Failed to convert notices: {}", e),
        Err(e) => tracing::error!("Failed to serialize notices: {}", e),
    }
    response
}
