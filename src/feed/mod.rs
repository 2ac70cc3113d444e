pub mod aggregate;
pub mod cache;
pub mod view;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::{Tag, VoteType};

pub use aggregate::{aggregate_feed, aggregate_saved};
pub use cache::{FeedCache, FeedKey, FeedSnapshot};
pub use view::{apply_view, FeedQuery, SortKey};

pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const UNKNOWN_NAME: &str = "Unknown";

/// A post as one viewer sees it. Rebuilt from scratch on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: String,
    pub content: String,
    pub tags: Vec<Tag>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub username: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub is_nsfw: bool,
    pub user_vote: Option<VoteType>,
    pub is_saved: bool,
    /// Whether the viewer wrote this post (and may delete it).
    pub is_own: bool,
}

impl FeedItem {
    pub fn has_any_tag<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.tags
            .iter()
            .any(|tag| names.iter().any(|n| n.as_ref() == tag.name))
    }

    /// Text for sharing a post outside the app.
    pub fn share_text(&self) -> String {
        let emojis: Vec<&str> = self.tags.iter().map(|t| t.emoji.as_str()).collect();
        format!(
            "{} {}\n\n🔗 Check out more roasts on Roastr!",
            emojis.join(" "),
            self.content
        )
    }
}
