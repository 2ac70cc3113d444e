use crate::backend::{Backend, BackendError};
use crate::db::models::VoteType;
use crate::error::RoastrResult;
use crate::notify::{messages, Notice};
use crate::service::{Roastr, ViewerContext};

/// What a vote did to the viewer's single vote row on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No vote existed; one was created.
    Cast(VoteType),
    /// The opposite vote existed and was overwritten.
    Switched(VoteType),
    /// The same vote existed and was removed.
    Retracted,
}

impl VoteOutcome {
    /// The viewer's vote after the operation.
    pub fn current(&self) -> Option<VoteType> {
        match self {
            VoteOutcome::Cast(v) | VoteOutcome::Switched(v) => Some(*v),
            VoteOutcome::Retracted => None,
        }
    }
}

/// Read-then-write toggle. Concurrent toggles by the same user are not
/// serialized; the `(post_id, user_id)` key still guarantees one row.
async fn apply_vote(
    backend: &dyn Backend,
    post_id: &str,
    user_id: &str,
    vote_type: VoteType,
) -> Result<VoteOutcome, BackendError> {
    match backend.get_user_vote(post_id, user_id).await? {
        None => {
            backend.upsert_vote(post_id, user_id, vote_type).await?;
            Ok(VoteOutcome::Cast(vote_type))
        }
        Some(existing) if existing == vote_type => {
            backend.delete_vote(post_id, user_id).await?;
            Ok(VoteOutcome::Retracted)
        }
        Some(_) => {
            backend.upsert_vote(post_id, user_id, vote_type).await?;
            Ok(VoteOutcome::Switched(vote_type))
        }
    }
}

impl Roastr {
    /// Vote on a post. Repeating the same vote retracts it; the opposite
    /// vote replaces it. Silent on success.
    pub async fn vote(
        &self,
        ctx: &ViewerContext,
        post_id: &str,
        vote_type: VoteType,
    ) -> RoastrResult<VoteOutcome> {
        let viewer = ctx.require_viewer(messages::LOGIN_TO_VOTE)?;

        match apply_vote(self.backend(), post_id, &viewer.id, vote_type).await {
            Ok(outcome) => {
                tracing::debug!(post_id, viewer = %viewer.id, ?outcome, "Vote applied");
                self.after_write(ctx).await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Error voting: {}", e);
                ctx.notify(Notice::error(messages::VOTE_FAILED));
                Err(e.into())
            }
        }
    }
}
