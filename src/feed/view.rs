use std::cmp::Ordering;

use crate::feed::FeedItem;

/// Feed ordering, exposed as-is in the GraphQL schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, async_graphql::Enum)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Upvotes,
    /// Ranks by `downvotes / max(upvotes, 1)`: heavily downvoted posts with
    /// few upvotes come first, not close contests.
    Controversial,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    /// Tag names; an item matches if it carries any of them.
    pub selected_tags: Vec<String>,
    pub sort: SortKey,
}

fn controversy(item: &FeedItem) -> f64 {
    item.downvotes as f64 / item.upvotes.max(1) as f64
}

/// Filter then sort a feed. Pure; ties keep input order.
pub fn apply_view(items: &[FeedItem], query: &FeedQuery) -> Vec<FeedItem> {
    let mut view: Vec<FeedItem> = if query.selected_tags.is_empty() {
        items.to_vec()
    } else {
        items
            .iter()
            .filter(|item| item.has_any_tag(query.selected_tags.as_slice()))
            .cloned()
            .collect()
    };

    sort_items(&mut view, query.sort);
    view
}

/// Stable sort in place.
pub fn sort_items(items: &mut [FeedItem], sort: SortKey) {
    match sort {
        SortKey::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Oldest => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::Upvotes => items.sort_by(|a, b| b.upvotes.cmp(&a.upvotes)),
        SortKey::Controversial => items.sort_by(|a, b| {
            controversy(b)
                .partial_cmp(&controversy(a))
                .unwrap_or(Ordering::Equal)
        }),
    }
}
