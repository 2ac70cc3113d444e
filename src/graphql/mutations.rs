use std::sync::Arc;

use async_graphql::*;

use crate::auth::delete_session;
use crate::extractors::SessionToken;
use crate::graphql::types::{ActionResult, CreatePostInput, ProfileObject, VoteKind};
use crate::notify::NoticeLog;
use crate::service::{PostDraft, Roastr, ViewerContext};
use crate::state::DbPool;

/// Per-request collaborators every mutation needs.
fn scope<'a>(ctx: &'a Context<'_>) -> Result<(&'a Roastr, &'a ViewerContext, &'a NoticeLog)> {
    let roastr = ctx.data::<Arc<Roastr>>()?;
    let viewer_ctx = ctx.data::<ViewerContext>()?;
    let log = ctx.data::<Arc<NoticeLog>>()?;
    Ok((roastr.as_ref(), viewer_ctx, log.as_ref()))
}

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Publish a post. Works for anonymous visitors; their posts have no author.
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        let draft = PostDraft {
            content: input.content,
            tag_names: input.tags,
            is_anonymous: input.is_anonymous,
        };
        Ok(match roastr.create_post(viewer_ctx, &draft).await {
            Ok(post) => ActionResult {
                post_id: Some(post.id),
                ..ActionResult::ok(log)
            },
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// Vote on a post; repeating a vote retracts it
    async fn vote(&self, ctx: &Context<'_>, post_id: String, vote: VoteKind) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        Ok(match roastr.vote(viewer_ctx, &post_id, vote.into()).await {
            Ok(outcome) => ActionResult {
                user_vote: outcome.current().map(VoteKind::from),
                ..ActionResult::ok(log)
            },
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// Add a post to the library, or remove it if already saved
    async fn toggle_save(&self, ctx: &Context<'_>, post_id: String) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        Ok(match roastr.toggle_save(viewer_ctx, &post_id).await {
            Ok(saved) => ActionResult {
                saved: Some(saved),
                ..ActionResult::ok(log)
            },
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// Flag a post for moderation
    async fn report_post(&self, ctx: &Context<'_>, post_id: String) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        Ok(match roastr.report_post(viewer_ctx, &post_id).await {
            Ok(_) => ActionResult::ok(log),
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// Delete one of the caller's own posts
    async fn delete_post(&self, ctx: &Context<'_>, post_id: String) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        Ok(match roastr.delete_post(viewer_ctx, &post_id).await {
            Ok(()) => ActionResult::ok(log),
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// Set the caller's username
    async fn update_profile(&self, ctx: &Context<'_>, username: String) -> Result<ActionResult> {
        let (roastr, viewer_ctx, log) = scope(ctx)?;

        Ok(match roastr.update_profile(viewer_ctx, &username).await {
            Ok(profile) => ActionResult {
                profile: Some(ProfileObject::from(profile)),
                ..ActionResult::ok(log)
            },
            Err(e) => ActionResult::failed(&e, log),
        })
    }

    /// End the caller's session
    async fn sign_out(&self, ctx: &Context<'_>) -> Result<ActionResult> {
        let pool = ctx.data::<DbPool>()?;

        let Some(SessionToken(token)) = ctx.data_opt::<SessionToken>() else {
            return Ok(ActionResult {
                message: Some("Not signed in".to_string()),
                ..ActionResult::default()
            });
        };

        match delete_session(pool, token) {
            Ok(existed) => {
                tracing::info!(existed, "Signed out");
                Ok(ActionResult {
                    success: existed,
                    message: Some(if existed { "Signed out" } else { "Not signed in" }.to_string()),
                    ..ActionResult::default()
                })
            }
            Err(e) => {
                tracing::error!("Error signing out: {}", e);
                Err(Error::new("Failed to sign out"))
            }
        }
    }
}
