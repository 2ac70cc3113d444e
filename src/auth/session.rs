use rand::Rng;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::state::DbPool;

/// The identity behind a request. Anonymous visitors have no `Viewer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub email: Option<String>,
}

fn pool_error(e: r2d2::Error) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(e.to_string()),
    )
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(
    pool: &DbPool,
    user_id: &str,
    email: Option<&str>,
    hours: u64,
) -> Result<String, rusqlite::Error> {
    let conn = pool.get().map_err(pool_error)?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, email, token, expires_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now', ?5))",
        params![id, user_id, email, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Look up the viewer for an unexpired session token.
pub fn resolve_session(pool: &DbPool, token: &str) -> Result<Option<Viewer>, rusqlite::Error> {
    let conn = pool.get().map_err(pool_error)?;

    conn.query_row(
        "SELECT user_id, email FROM sessions
         WHERE token = ?1 AND expires_at > datetime('now')",
        params![token],
        |row| {
            Ok(Viewer {
                id: row.get(0)?,
                email: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Delete a session by token. Returns whether a session existed.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<bool, rusqlite::Error> {
    let conn = pool.get().map_err(pool_error)?;

    let rows = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(rows > 0)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
