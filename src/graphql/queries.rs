use std::sync::Arc;

use async_graphql::*;

use crate::feed::{FeedQuery, SortKey};
use crate::graphql::types::{FeedPost, Me, TagObject};
use crate::service::{Roastr, ViewerContext};

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The tag catalog, ordered by name
    async fn tags(&self, ctx: &Context<'_>) -> Result<Vec<TagObject>> {
        let roastr = ctx.data::<Arc<Roastr>>()?;
        roastr.load_tags().await;
        Ok(roastr.tags().into_iter().map(TagObject::from).collect())
    }

    /// Visible posts for the caller, filtered by tag names (any match) and
    /// sorted. An empty or missing tag list means no filter.
    async fn feed(
        &self,
        ctx: &Context<'_>,
        tags: Option<Vec<String>>,
        sort: Option<SortKey>,
    ) -> Result<Vec<FeedPost>> {
        let roastr = ctx.data::<Arc<Roastr>>()?;
        let viewer_ctx = ctx.data::<ViewerContext>()?;

        let query = FeedQuery {
            selected_tags: tags.unwrap_or_default(),
            sort: sort.unwrap_or_default(),
        };
        let items = roastr.view(viewer_ctx, &query).await;
        Ok(items.into_iter().map(FeedPost::from).collect())
    }

    /// The caller's saved library, most recently saved first
    async fn saved_posts(&self, ctx: &Context<'_>) -> Result<Vec<FeedPost>> {
        let roastr = ctx.data::<Arc<Roastr>>()?;
        let viewer_ctx = ctx.data::<ViewerContext>()?;

        let items = roastr
            .saved_posts(viewer_ctx)
            .await
            .map_err(|e| Error::new(e.to_string()))?;
        Ok(items.into_iter().map(FeedPost::from).collect())
    }

    /// The signed-in caller, or null for anonymous visitors
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<Me>> {
        let roastr = ctx.data::<Arc<Roastr>>()?;
        let viewer_ctx = ctx.data::<ViewerContext>()?;

        let Some(viewer) = viewer_ctx.viewer() else {
            return Ok(None);
        };
        let profile = roastr
            .profile(viewer_ctx)
            .await
            .map_err(|e| Error::new(e.to_string()))?;

        Ok(Some(Me {
            id: viewer.id.clone(),
            email: viewer.email.clone(),
            username: profile.map(|p| p.username),
        }))
    }
}
