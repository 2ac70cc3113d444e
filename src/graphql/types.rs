use async_graphql::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{Profile, Tag, VoteType};
use crate::error::RoastrError;
use crate::feed::FeedItem;
use crate::notify::{NoticeLevel, NoticeLog};

/// A tag from the catalog
#[derive(Clone, Debug, Serialize, Deserialize, SimpleObject)]
pub struct TagObject {
    pub id: String,

    /// Display name, also used for filtering
    pub name: String,

    pub emoji: String,

    /// Posts carrying a sensitive tag are flagged NSFW
    pub is_sensitive: bool,
}

impl From<Tag> for TagObject {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            emoji: tag.emoji,
            is_sensitive: tag.is_sensitive,
        }
    }
}

/// A post as the requesting viewer sees it
#[derive(Clone, Debug, SimpleObject)]
#[graphql(complex)]
pub struct FeedPost {
    pub id: String,
    pub content: String,
    pub tags: Vec<TagObject>,
    pub upvotes: i64,
    pub downvotes: i64,

    /// "Anonymous", the author's username, or "Unknown"
    pub username: String,

    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub is_nsfw: bool,

    /// The viewer's own vote, if any
    pub user_vote: Option<VoteKind>,

    pub is_saved: bool,

    /// Whether the viewer wrote this post
    pub is_own: bool,

    #[graphql(skip)]
    pub share: String,
}

#[ComplexObject]
impl FeedPost {
    /// Text for sharing outside the app
    async fn share_text(&self) -> String {
        self.share.clone()
    }
}

impl From<FeedItem> for FeedPost {
    fn from(item: FeedItem) -> Self {
        let share = item.share_text();
        Self {
            id: item.id,
            content: item.content,
            tags: item.tags.into_iter().map(TagObject::from).collect(),
            upvotes: item.upvotes,
            downvotes: item.downvotes,
            username: item.username,
            is_anonymous: item.is_anonymous,
            created_at: item.created_at,
            is_nsfw: item.is_nsfw,
            user_vote: item.user_vote.map(VoteKind::from),
            is_saved: item.is_saved,
            is_own: item.is_own,
            share,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Enum, Eq, PartialEq)]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl From<VoteType> for VoteKind {
    fn from(vote: VoteType) -> Self {
        match vote {
            VoteType::Upvote => VoteKind::Upvote,
            VoteType::Downvote => VoteKind::Downvote,
        }
    }
}

impl From<VoteKind> for VoteType {
    fn from(vote: VoteKind) -> Self {
        match vote {
            VoteKind::Upvote => VoteType::Upvote,
            VoteKind::Downvote => VoteType::Downvote,
        }
    }
}

/// The signed-in viewer
#[derive(Clone, Debug, SimpleObject)]
pub struct Me {
    pub id: String,
    pub email: Option<String>,

    /// `None` until a profile has been saved
    pub username: Option<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ProfileObject {
    pub user_id: String,
    pub username: String,
}

impl From<Profile> for ProfileObject {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_id,
            username: profile.username,
        }
    }
}

/// Input for creating a post
#[derive(InputObject)]
pub struct CreatePostInput {
    pub content: String,

    /// Tag names; names missing from the catalog are ignored
    pub tags: Vec<String>,

    /// Post without an author
    #[graphql(default)]
    pub is_anonymous: bool,
}

/// Result of a mutation. Domain failures land here, not in `errors`.
#[derive(SimpleObject, Debug, Default)]
pub struct ActionResult {
    /// Whether the operation succeeded
    pub success: bool,

    /// Notice text describing the outcome
    pub message: Option<String>,

    /// Created post id (createPost)
    pub post_id: Option<String>,

    /// The viewer's vote afterwards (vote)
    pub user_vote: Option<VoteKind>,

    /// Whether the post is saved afterwards (toggleSave)
    pub saved: Option<bool>,

    /// Updated profile (updateProfile)
    pub profile: Option<ProfileObject>,
}

impl ActionResult {
    /// Success, described by the last success notice (if any).
    pub fn ok(log: &NoticeLog) -> Self {
        let message = log
            .snapshot()
            .into_iter()
            .rev()
            .find(|n| n.level == NoticeLevel::Success)
            .map(|n| n.message);
        Self {
            success: true,
            message,
            ..Self::default()
        }
    }

    /// Failure, described by the last error notice, or the error itself.
    pub fn failed(err: &RoastrError, log: &NoticeLog) -> Self {
        let message = log
            .snapshot()
            .into_iter()
            .rev()
            .find(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .unwrap_or_else(|| err.to_string());
        Self {
            success: false,
            message: Some(message),
            ..Self::default()
        }
    }
}
