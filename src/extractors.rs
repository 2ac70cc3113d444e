use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::{resolve_session, Viewer};
use crate::error::AppError;
use crate::state::AppState;

/// The session token presented with a request, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Optional viewer extractor. A missing, unknown or expired session is the
/// anonymous visitor, never a rejection.
pub struct MaybeViewer {
    pub viewer: Option<Viewer>,
    pub token: Option<SessionToken>,
}

impl FromRequestParts<AppState> for MaybeViewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_session_token(parts, &state.config.auth.cookie_name) else {
            return Ok(MaybeViewer {
                viewer: None,
                token: None,
            });
        };

        let viewer = resolve_session(&state.db, &token)?;
        Ok(MaybeViewer {
            viewer,
            token: Some(SessionToken(token)),
        })
    }
}

/// Bearer header first, then the session cookie.
fn extract_session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim())
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == cookie_name && !val.is_empty() {
                Some(val.to_string())
            } else {
                None
            }
        })
}
