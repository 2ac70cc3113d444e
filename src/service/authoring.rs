use crate::db::models::{NewPost, Post, Tag};
use crate::error::{RoastrResult, ValidationError};
use crate::notify::{messages, Notice};
use crate::service::{Roastr, ViewerContext};
use crate::tags;

pub const MAX_CONTENT_CHARS: usize = 2000;

/// A post as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub content: String,
    pub tag_names: Vec<String>,
    pub is_anonymous: bool,
}

/// First failing rule wins: empty content, then no tags, then length.
/// Length counts code points of the content as typed.
pub fn validate_draft(draft: &PostDraft) -> Result<(), ValidationError> {
    if draft.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if draft.tag_names.is_empty() {
        return Err(ValidationError::NoTags);
    }
    if draft.content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::TooLong {
            max: MAX_CONTENT_CHARS,
        });
    }
    Ok(())
}

impl Roastr {
    /// Validate and publish a post. Anonymous posts (and posts from
    /// anonymous visitors) are stored without an author.
    pub async fn create_post(&self, ctx: &ViewerContext, draft: &PostDraft) -> RoastrResult<Post> {
        if let Err(rule) = validate_draft(draft) {
            ctx.notify(Notice::error(rule.to_string()));
            return Err(rule.into());
        }

        let tags = self.submit_tags(ctx, draft.tag_names.as_slice()).await?;
        if tags.is_empty() {
            let rule = ValidationError::NoTags;
            ctx.notify(Notice::error(rule.to_string()));
            return Err(rule.into());
        }

        let author_id = if draft.is_anonymous {
            None
        } else {
            ctx.viewer().map(|v| v.id.clone())
        };

        let new_post = NewPost {
            content: draft.content.trim().to_string(),
            author_id,
            is_anonymous: draft.is_anonymous,
        };

        let mut post = match self.backend().insert_post(&new_post).await {
            Ok(post) => post,
            Err(e) => {
                tracing::error!("Error creating post: {}", e);
                ctx.notify(Notice::error(messages::POST_FAILED));
                return Err(e.into());
            }
        };

        let rows: Vec<(String, String)> = tags
            .iter()
            .map(|tag| (post.id.clone(), tag.id.clone()))
            .collect();

        if let Err(e) = self.backend().insert_post_tags(&rows).await {
            tracing::error!(post_id = %post.id, "Error tagging post: {}", e);
            self.discard_untagged(ctx, &post.id).await;
            ctx.notify(Notice::error(messages::POST_FAILED));
            return Err(e.into());
        }

        post.tags = tags;

        tracing::info!(post_id = %post.id, anonymous = post.is_anonymous, "Post created");
        self.after_write(ctx).await;
        ctx.notify(Notice::success(messages::POST_CREATED));
        Ok(post)
    }

    /// Catalog tags named in the draft. An empty catalog (its one load
    /// failed) is bypassed with a fresh listing so posting still works.
    async fn submit_tags(&self, ctx: &ViewerContext, names: &[String]) -> RoastrResult<Vec<Tag>> {
        self.load_tags().await;
        let mut catalog = self.tags.tags();

        if catalog.is_empty() {
            catalog = match self.backend().list_tags().await {
                Ok(tags) => tags,
                Err(e) => {
                    tracing::error!("Error fetching tags for post: {}", e);
                    ctx.notify(Notice::error(messages::POST_FAILED));
                    return Err(e.into());
                }
            };
        }

        Ok(tags::resolve(catalog, names))
    }

    /// Hide a post whose tags could not be written, so an untagged post
    /// never reaches a feed.
    async fn discard_untagged(&self, ctx: &ViewerContext, post_id: &str) {
        match self.backend().discard_post(post_id).await {
            Ok(()) => tracing::warn!(post_id, "Discarded untagged post"),
            Err(e) => tracing::error!(post_id, "Failed to discard untagged post: {}", e),
        }
        self.invalidate_feeds(ctx);
    }
}
