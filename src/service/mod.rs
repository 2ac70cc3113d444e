// Viewer-facing operations
// Roastr owns the backend handle, the tag catalog and the feed cache. Every
// successful write invalidates the feed cache and re-aggregates the acting
// viewer's feed.

pub mod account;
pub mod authoring;
pub mod reports;
pub mod saving;
pub mod voting;

use std::sync::Arc;

use crate::auth::Viewer;
use crate::backend::Backend;
use crate::db::models::Tag;
use crate::error::{RoastrError, RoastrResult};
use crate::feed::{
    aggregate_feed, apply_view, FeedCache, FeedItem, FeedKey, FeedQuery, FeedSnapshot,
};
use crate::notify::{messages, Notice, Notifier};
use crate::tags::TagCatalog;

pub use authoring::{validate_draft, PostDraft, MAX_CONTENT_CHARS};
pub use voting::VoteOutcome;

/// Who is acting, and where their notices go.
#[derive(Clone)]
pub struct ViewerContext {
    pub viewer: Option<Viewer>,
    notifier: Arc<dyn Notifier>,
}

impl ViewerContext {
    pub fn new(viewer: Option<Viewer>, notifier: Arc<dyn Notifier>) -> Self {
        Self { viewer, notifier }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// The viewer, or `Unauthenticated` after showing `prompt`.
    fn require_viewer(&self, prompt: &str) -> RoastrResult<&Viewer> {
        match self.viewer.as_ref() {
            Some(viewer) => Ok(viewer),
            None => {
                self.notify(Notice::error(prompt));
                Err(RoastrError::Unauthenticated)
            }
        }
    }
}

pub struct Roastr {
    backend: Arc<dyn Backend>,
    tags: TagCatalog,
    feed: FeedCache,
}

impl Roastr {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            tags: TagCatalog::new(),
            feed: FeedCache::new(),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub async fn load_tags(&self) {
        self.tags.load(self.backend.as_ref()).await;
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.tags()
    }

    pub fn tags_loading(&self) -> bool {
        self.tags.is_loading()
    }

    /// The viewer's feed: cached items if still fresh, otherwise a full
    /// re-aggregation.
    pub async fn feed(&self, ctx: &ViewerContext) -> FeedSnapshot {
        let key = FeedKey::for_viewer(ctx.viewer());
        if self.feed.fresh(&key).is_some() {
            return self.feed.snapshot(&key);
        }
        self.refresh_feed(ctx).await
    }

    /// Re-aggregate the viewer's feed from scratch. On failure the previous
    /// items are kept and a single "failed to load" notice is raised.
    pub async fn refresh_feed(&self, ctx: &ViewerContext) -> FeedSnapshot {
        let key = FeedKey::for_viewer(ctx.viewer());
        let ticket = self.feed.begin(&key);

        match aggregate_feed(self.backend.as_ref(), ctx.viewer()).await {
            Ok(items) => {
                tracing::debug!(key = %key, posts = items.len(), "Feed refreshed");
                self.feed.commit(ticket, items);
            }
            Err(e) => {
                tracing::error!("Error fetching posts: {}", e);
                ctx.notify(Notice::error(messages::LOAD_FAILED));
                self.feed.fail(ticket);
            }
        }

        self.feed.snapshot(&key)
    }

    /// Filtered and sorted view over the viewer's feed.
    pub async fn view(&self, ctx: &ViewerContext, query: &FeedQuery) -> Vec<FeedItem> {
        let snapshot = self.feed(ctx).await;
        apply_view(&snapshot.items, query)
    }

    /// Whatever is cached for `viewer`, without fetching.
    pub fn cached_feed(&self, viewer: Option<&Viewer>) -> FeedSnapshot {
        self.feed.snapshot(&FeedKey::for_viewer(viewer))
    }

    fn invalidate_feeds(&self, ctx: &ViewerContext) {
        self.feed.invalidate_all(&FeedKey::for_viewer(ctx.viewer()));
    }

    async fn after_write(&self, ctx: &ViewerContext) {
        self.invalidate_feeds(ctx);
        self.refresh_feed(ctx).await;
    }
}
