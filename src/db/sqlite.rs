// SQLite implementation of the backend capability
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::backend::{Backend, BackendError};
use crate::db::models::{
    NewPost, NewReport, Post, PostStatus, Profile, Report, Tag, VoteTally, VoteType,
};
use crate::state::DbPool;

const POST_COLUMNS: &str = "p.id, p.content, p.created_at, p.user_id, p.is_anonymous, p.status";

pub struct SqliteBackend {
    pool: DbPool,
}

impl SqliteBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Microsecond precision keeps lexical order equal to chronological order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, BackendError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BackendError::Decode(format!("bad timestamp {:?}: {}", s, e)))
}

struct PostRow {
    id: String,
    content: String,
    created_at: String,
    user_id: Option<String>,
    is_anonymous: bool,
    status: String,
}

fn read_post_rows(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<PostRow>, BackendError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, |row| {
            Ok(PostRow {
                id: row.get(0)?,
                content: row.get(1)?,
                created_at: row.get(2)?,
                user_id: row.get(3)?,
                is_anonymous: row.get(4)?,
                status: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn tags_for_post(conn: &Connection, post_id: &str) -> Result<Vec<Tag>, BackendError> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.name, t.emoji, t.is_sensitive
         FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![post_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                emoji: row.get(2)?,
                is_sensitive: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

fn hydrate(conn: &Connection, rows: Vec<PostRow>) -> Result<Vec<Post>, BackendError> {
    rows.into_iter()
        .map(|row| -> Result<Post, BackendError> {
            let tags = tags_for_post(conn, &row.id)?;
            Ok(Post {
                created_at: parse_timestamp(&row.created_at)?,
                status: row.status.parse().map_err(BackendError::Decode)?,
                id: row.id,
                content: row.content,
                author_id: row.user_id,
                is_anonymous: row.is_anonymous,
                tags,
            })
        })
        .collect()
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn list_visible_posts(&self) -> Result<Vec<Post>, BackendError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM posts p
             WHERE p.status = 'visible'
             ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
        );
        let rows = read_post_rows(&conn, &sql, &[])?;
        hydrate(&conn, rows)
    }

    async fn get_vote_tally(&self, post_id: &str) -> Result<VoteTally, BackendError> {
        let conn = self.pool.get()?;
        let (upvotes, downvotes): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT SUM(CASE WHEN vote_type = 'upvote' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN vote_type = 'downvote' THEN 1 ELSE 0 END)
             FROM votes WHERE post_id = ?1",
            params![post_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(VoteTally {
            upvotes: upvotes.unwrap_or(0),
            downvotes: downvotes.unwrap_or(0),
        })
    }

    async fn get_user_vote(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<VoteType>, BackendError> {
        let conn = self.pool.get()?;
        let vote: Option<String> = conn
            .query_row(
                "SELECT vote_type FROM votes WHERE post_id = ?1 AND user_id = ?2",
                params![post_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        vote.map(|v| v.parse().map_err(BackendError::Decode))
            .transpose()
    }

    async fn get_save_status(&self, post_id: &str, user_id: &str) -> Result<bool, BackendError> {
        let conn = self.pool.get()?;
        let saved: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM saved_posts WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(saved)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                "SELECT id, username FROM profiles WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(Profile {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO posts (id, content, user_id, is_anonymous, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'visible', ?5)",
            params![id, post.content, post.author_id, post.is_anonymous, created_at],
        )?;

        Ok(Post {
            id,
            content: post.content.clone(),
            created_at: parse_timestamp(&created_at)?,
            author_id: post.author_id.clone(),
            is_anonymous: post.is_anonymous,
            status: PostStatus::Visible,
            tags: Vec::new(),
        })
    }

    async fn insert_post_tags(&self, rows: &[(String, String)]) -> Result<(), BackendError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2)")?;
            for (post_id, tag_id) in rows {
                stmt.execute(params![post_id, tag_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn upsert_vote(
        &self,
        post_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO votes (post_id, user_id, vote_type) VALUES (?1, ?2, ?3)
             ON CONFLICT(post_id, user_id) DO UPDATE SET vote_type = excluded.vote_type",
            params![post_id, user_id, vote_type.as_str()],
        )?;
        Ok(())
    }

    async fn delete_vote(&self, post_id: &str, user_id: &str) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM votes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        Ok(())
    }

    async fn upsert_save(&self, post_id: &str, user_id: &str) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO saved_posts (post_id, user_id) VALUES (?1, ?2)",
            params![post_id, user_id],
        )?;
        Ok(())
    }

    async fn delete_save(&self, post_id: &str, user_id: &str) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM saved_posts WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        Ok(())
    }

    async fn insert_report(&self, report: &NewReport) -> Result<Report, BackendError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        let created_at = now_timestamp();

        conn.execute(
            "INSERT INTO reports (id, post_id, user_id, ip_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                report.post_id,
                report.user_id,
                report.anonymous_marker,
                created_at
            ],
        )?;

        Ok(Report {
            id,
            post_id: report.post_id.clone(),
            user_id: report.user_id.clone(),
            anonymous_marker: report.anonymous_marker.clone(),
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, name, emoji, is_sensitive FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    emoji: row.get(2)?,
                    is_sensitive: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO profiles (id, username) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
               username = excluded.username,
               updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![profile.user_id, profile.username],
        )?;
        Ok(())
    }

    async fn list_saved_posts(&self, user_id: &str) -> Result<Vec<Post>, BackendError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM saved_posts sp
             JOIN posts p ON p.id = sp.post_id
             WHERE sp.user_id = ?1 AND p.status = 'visible'
             ORDER BY sp.created_at DESC, sp.rowid DESC",
            POST_COLUMNS
        );
        let rows = read_post_rows(&conn, &sql, &[&user_id])?;
        hydrate(&conn, rows)
    }

    async fn soft_delete_post(
        &self,
        post_id: &str,
        author_id: &str,
    ) -> Result<bool, BackendError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE posts SET status = 'deleted'
             WHERE id = ?1 AND user_id = ?2 AND status = 'visible'",
            params![post_id, author_id],
        )?;
        Ok(rows > 0)
    }

    async fn discard_post(&self, post_id: &str) -> Result<(), BackendError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET status = 'deleted' WHERE id = ?1",
            params![post_id],
        )?;
        Ok(())
    }
}
