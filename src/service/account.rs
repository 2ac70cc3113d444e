// Viewer-owned state: profile, saved library, own posts
use crate::db::models::Profile;
use crate::error::{RoastrError, RoastrResult, ValidationError};
use crate::feed::{aggregate_saved, FeedItem};
use crate::notify::{messages, Notice};
use crate::service::{Roastr, ViewerContext};

impl Roastr {
    pub async fn profile(&self, ctx: &ViewerContext) -> RoastrResult<Option<Profile>> {
        let viewer = ctx.require_viewer(messages::LOGIN_FOR_PROFILE)?;

        self.backend().get_profile(&viewer.id).await.map_err(|e| {
            tracing::error!("Error fetching profile: {}", e);
            e.into()
        })
    }

    /// Set the viewer's username (trimmed, non-empty).
    pub async fn update_profile(&self, ctx: &ViewerContext, username: &str) -> RoastrResult<Profile> {
        let viewer = ctx.require_viewer(messages::LOGIN_FOR_PROFILE)?;

        let username = username.trim();
        if username.is_empty() {
            let rule = ValidationError::EmptyUsername;
            ctx.notify(Notice::error(rule.to_string()));
            return Err(rule.into());
        }

        let profile = Profile {
            user_id: viewer.id.clone(),
            username: username.to_string(),
        };

        match self.backend().upsert_profile(&profile).await {
            Ok(()) => {
                ctx.notify(Notice::success(messages::PROFILE_UPDATED));
                // Usernames are baked into every cached feed item.
                self.invalidate_feeds(ctx);
                Ok(profile)
            }
            Err(e) => {
                tracing::error!("Error updating profile: {}", e);
                ctx.notify(Notice::error(messages::PROFILE_FAILED));
                Err(e.into())
            }
        }
    }

    /// The viewer's saved library, aggregated like the feed.
    pub async fn saved_posts(&self, ctx: &ViewerContext) -> RoastrResult<Vec<FeedItem>> {
        let viewer = ctx.require_viewer(messages::LOGIN_FOR_LIBRARY)?;

        aggregate_saved(self.backend(), viewer).await.map_err(|e| {
            tracing::error!("Error fetching saved posts: {}", e);
            ctx.notify(Notice::error(messages::LIBRARY_FAILED));
            e.into()
        })
    }

    /// Soft-delete one of the viewer's own posts.
    pub async fn delete_post(&self, ctx: &ViewerContext, post_id: &str) -> RoastrResult<()> {
        let viewer = ctx.require_viewer(messages::LOGIN_TO_DELETE)?;

        match self.backend().soft_delete_post(post_id, &viewer.id).await {
            Ok(true) => {
                tracing::info!(post_id, viewer = %viewer.id, "Post deleted");
                ctx.notify(Notice::success(messages::POST_DELETED));
                self.after_write(ctx).await;
                Ok(())
            }
            Ok(false) => {
                ctx.notify(Notice::error(messages::NOT_YOUR_POST));
                Err(RoastrError::Forbidden)
            }
            Err(e) => {
                tracing::error!("Error deleting post: {}", e);
                ctx.notify(Notice::error(messages::DELETE_FAILED));
                Err(e.into())
            }
        }
    }
}
