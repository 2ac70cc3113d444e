use futures::future::try_join_all;

use crate::auth::Viewer;
use crate::backend::{Backend, BackendError};
use crate::db::models::{Post, VoteType};
use crate::feed::{FeedItem, ANONYMOUS_NAME, UNKNOWN_NAME};

/// Build the feed of visible posts for `viewer`, newest first.
///
/// Every post's lookups run concurrently. The first failing lookup fails
/// the whole feed; there is no per-post isolation.
pub async fn aggregate_feed(
    backend: &dyn Backend,
    viewer: Option<&Viewer>,
) -> Result<Vec<FeedItem>, BackendError> {
    let posts = backend.list_visible_posts().await?;
    tracing::debug!(posts = posts.len(), "Aggregating feed");

    try_join_all(
        posts
            .into_iter()
            .map(|post| resolve_item(backend, viewer, post, None)),
    )
    .await
}

/// Build the viewer's saved library. Every item is saved by definition.
pub async fn aggregate_saved(
    backend: &dyn Backend,
    viewer: &Viewer,
) -> Result<Vec<FeedItem>, BackendError> {
    let posts = backend.list_saved_posts(&viewer.id).await?;
    tracing::debug!(posts = posts.len(), viewer = %viewer.id, "Aggregating saved posts");

    try_join_all(
        posts
            .into_iter()
            .map(|post| resolve_item(backend, Some(viewer), post, Some(true))),
    )
    .await
}

async fn resolve_item(
    backend: &dyn Backend,
    viewer: Option<&Viewer>,
    post: Post,
    known_saved: Option<bool>,
) -> Result<FeedItem, BackendError> {
    let (tally, user_vote, is_saved, username) = futures::try_join!(
        backend.get_vote_tally(&post.id),
        own_vote(backend, viewer, &post.id),
        save_status(backend, viewer, &post.id, known_saved),
        display_name(backend, &post),
    )?;

    let is_own = match (viewer, &post.author_id) {
        (Some(viewer), Some(author)) => viewer.id == *author,
        _ => false,
    };

    Ok(FeedItem {
        is_nsfw: post.tags.iter().any(|t| t.is_sensitive),
        id: post.id,
        content: post.content,
        tags: post.tags,
        upvotes: tally.upvotes,
        downvotes: tally.downvotes,
        username,
        is_anonymous: post.is_anonymous,
        created_at: post.created_at,
        user_vote,
        is_saved,
        is_own,
    })
}

async fn own_vote(
    backend: &dyn Backend,
    viewer: Option<&Viewer>,
    post_id: &str,
) -> Result<Option<VoteType>, BackendError> {
    match viewer {
        Some(viewer) => backend.get_user_vote(post_id, &viewer.id).await,
        None => Ok(None),
    }
}

async fn save_status(
    backend: &dyn Backend,
    viewer: Option<&Viewer>,
    post_id: &str,
    known: Option<bool>,
) -> Result<bool, BackendError> {
    match (known, viewer) {
        (Some(saved), _) => Ok(saved),
        (None, Some(viewer)) => backend.get_save_status(post_id, &viewer.id).await,
        (None, None) => Ok(false),
    }
}

/// "Anonymous" for anonymous or authorless posts, the profile username
/// otherwise, and "Unknown" when the author has no profile row.
pub async fn display_name(backend: &dyn Backend, post: &Post) -> Result<String, BackendError> {
    let author_id = match &post.author_id {
        Some(id) if !post.is_anonymous => id,
        _ => return Ok(ANONYMOUS_NAME.to_string()),
    };

    Ok(backend
        .get_profile(author_id)
        .await?
        .map(|profile| profile.username)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FlakyBackend;
    use crate::db::models::{NewPost, Profile};
    use crate::db::{memory_pool, run_migrations, SqliteBackend};
    use std::sync::Arc;

    fn backend() -> FlakyBackend {
        let pool = memory_pool().unwrap();
        run_migrations(&pool).unwrap();
        FlakyBackend::new(Arc::new(SqliteBackend::new(pool)))
    }

    fn viewer(id: &str) -> Viewer {
        Viewer {
            id: id.to_string(),
            email: None,
        }
    }

    async fn post(
        backend: &FlakyBackend,
        author: Option<&str>,
        anonymous: bool,
        tags: &[&str],
    ) -> String {
        let post = backend
            .insert_post(&NewPost {
                content: "roast".to_string(),
                author_id: author.map(str::to_string),
                is_anonymous: anonymous,
            })
            .await
            .unwrap();
        let rows: Vec<(String, String)> = tags
            .iter()
            .map(|t| (post.id.clone(), t.to_string()))
            .collect();
        backend.insert_post_tags(&rows).await.unwrap();
        post.id
    }

    #[tokio::test]
    async fn author_names_fall_back_in_order() {
        let backend = backend();
        backend
            .upsert_profile(&Profile {
                user_id: "alice".to_string(),
                username: "alice_roasts".to_string(),
            })
            .await
            .unwrap();

        let named = post(&backend, Some("alice"), false, &["tag-joke"]).await;
        let hidden = post(&backend, Some("alice"), true, &["tag-joke"]).await;
        let authorless = post(&backend, None, false, &["tag-joke"]).await;
        let orphan = post(&backend, Some("ghost"), false, &["tag-joke"]).await;

        let feed = aggregate_feed(&backend, None).await.unwrap();
        let name_of = |id: &str| {
            feed.iter()
                .find(|item| item.id == id)
                .map(|item| item.username.clone())
                .unwrap()
        };

        assert_eq!(name_of(&named), "alice_roasts");
        assert_eq!(name_of(&hidden), ANONYMOUS_NAME);
        assert_eq!(name_of(&authorless), ANONYMOUS_NAME);
        assert_eq!(name_of(&orphan), UNKNOWN_NAME);
    }

    #[tokio::test]
    async fn nsfw_iff_any_tag_is_sensitive() {
        let backend = backend();
        let clean = post(&backend, None, true, &["tag-joke", "tag-roast"]).await;
        let spicy = post(&backend, None, true, &["tag-joke", "tag-nsfw"]).await;

        let feed = aggregate_feed(&backend, None).await.unwrap();
        for item in &feed {
            assert_eq!(item.is_nsfw, item.tags.iter().any(|t| t.is_sensitive));
        }
        assert!(!feed.iter().find(|i| i.id == clean).unwrap().is_nsfw);
        assert!(feed.iter().find(|i| i.id == spicy).unwrap().is_nsfw);
    }

    #[tokio::test]
    async fn anonymous_viewer_skips_personal_lookups() {
        let backend = backend();
        let id = post(&backend, None, true, &["tag-joke"]).await;
        backend.upsert_vote(&id, "bob", VoteType::Upvote).await.unwrap();
        backend.upsert_save(&id, "bob").await.unwrap();

        // Personal lookups would fail if attempted.
        backend.fail("get_user_vote");
        backend.fail("get_save_status");

        let feed = aggregate_feed(&backend, None).await.unwrap();
        assert_eq!(feed[0].upvotes, 1);
        assert_eq!(feed[0].user_vote, None);
        assert!(!feed[0].is_saved);
    }

    #[tokio::test]
    async fn viewer_sees_own_vote_and_save() {
        let backend = backend();
        let id = post(&backend, Some("bob"), false, &["tag-joke"]).await;
        backend.upsert_vote(&id, "bob", VoteType::Downvote).await.unwrap();
        backend.upsert_save(&id, "bob").await.unwrap();

        let bob = viewer("bob");
        let feed = aggregate_feed(&backend, Some(&bob)).await.unwrap();
        assert_eq!(feed[0].user_vote, Some(VoteType::Downvote));
        assert!(feed[0].is_saved);
        assert!(feed[0].is_own);
        assert_eq!(feed[0].downvotes, 1);

        let carol = viewer("carol");
        let feed = aggregate_feed(&backend, Some(&carol)).await.unwrap();
        assert_eq!(feed[0].user_vote, None);
        assert!(!feed[0].is_saved);
        assert!(!feed[0].is_own);
    }

    #[tokio::test]
    async fn any_failing_lookup_fails_the_feed() {
        let backend = backend();
        post(&backend, None, true, &["tag-joke"]).await;
        post(&backend, None, true, &["tag-joke"]).await;

        backend.fail("get_vote_tally");
        assert!(aggregate_feed(&backend, None).await.is_err());
    }

    #[tokio::test]
    async fn saved_library_marks_everything_saved() {
        let backend = backend();
        let id = post(&backend, None, true, &["tag-joke"]).await;
        post(&backend, None, true, &["tag-joke"]).await;
        backend.upsert_save(&id, "bob").await.unwrap();

        backend.fail("get_save_status");
        let saved = aggregate_saved(&backend, &viewer("bob")).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, id);
        assert!(saved[0].is_saved);
    }
}
