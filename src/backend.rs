// Backend capability - every durable read and write goes through here
use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{NewPost, NewReport, Post, Profile, Report, Tag, VoteTally, VoteType};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Query/RPC surface of the managed data store.
///
/// Lookups that may legitimately find nothing return `Option`/`bool`
/// rather than failing, so a zero-row result is never a transport error.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Visible posts with their tags, newest first.
    async fn list_visible_posts(&self) -> Result<Vec<Post>, BackendError>;

    /// Aggregate vote counts for one post.
    async fn get_vote_tally(&self, post_id: &str) -> Result<VoteTally, BackendError>;

    async fn get_user_vote(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<VoteType>, BackendError>;

    async fn get_save_status(&self, post_id: &str, user_id: &str) -> Result<bool, BackendError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;

    async fn insert_post(&self, post: &NewPost) -> Result<Post, BackendError>;

    /// Insert `(post_id, tag_id)` join rows.
    async fn insert_post_tags(&self, rows: &[(String, String)]) -> Result<(), BackendError>;

    async fn upsert_vote(
        &self,
        post_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> Result<(), BackendError>;

    async fn delete_vote(&self, post_id: &str, user_id: &str) -> Result<(), BackendError>;

    async fn upsert_save(&self, post_id: &str, user_id: &str) -> Result<(), BackendError>;

    async fn delete_save(&self, post_id: &str, user_id: &str) -> Result<(), BackendError>;

    async fn insert_report(&self, report: &NewReport) -> Result<Report, BackendError>;

    /// Full tag catalog ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), BackendError>;

    /// Visible posts the user has saved, most recently saved first.
    async fn list_saved_posts(&self, user_id: &str) -> Result<Vec<Post>, BackendError>;

    /// Mark a post deleted if `author_id` owns it. Returns whether a row changed.
    async fn soft_delete_post(&self, post_id: &str, author_id: &str)
        -> Result<bool, BackendError>;

    /// Mark a post deleted regardless of author. Used to hide a post whose
    /// tag associations could not be written.
    async fn discard_post(&self, post_id: &str) -> Result<(), BackendError>;
}
