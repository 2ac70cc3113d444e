use crate::backend::{Backend, BackendError};
use crate::error::RoastrResult;
use crate::notify::{messages, Notice};
use crate::service::{Roastr, ViewerContext};

async fn flip_save(
    backend: &dyn Backend,
    post_id: &str,
    user_id: &str,
) -> Result<bool, BackendError> {
    if backend.get_save_status(post_id, user_id).await? {
        backend.delete_save(post_id, user_id).await?;
        Ok(false)
    } else {
        backend.upsert_save(post_id, user_id).await?;
        Ok(true)
    }
}

impl Roastr {
    /// Add the post to the viewer's library, or take it out if already
    /// there. Returns whether the post is saved afterwards.
    pub async fn toggle_save(&self, ctx: &ViewerContext, post_id: &str) -> RoastrResult<bool> {
        let viewer = ctx.require_viewer(messages::LOGIN_TO_SAVE)?;

        match flip_save(self.backend(), post_id, &viewer.id).await {
            Ok(saved) => {
                ctx.notify(Notice::success(if saved {
                    messages::SAVED
                } else {
                    messages::UNSAVED
                }));
                self.after_write(ctx).await;
                Ok(saved)
            }
            Err(e) => {
                tracing::error!("Error saving post: {}", e);
                ctx.notify(Notice::error(messages::SAVE_FAILED));
                Err(e.into())
            }
        }
    }
}
