// Tag catalog - loaded once per process, read-only afterwards
use std::sync::RwLock;
use tokio::sync::OnceCell;

use crate::backend::Backend;
use crate::db::models::Tag;

#[derive(Debug, Default)]
pub struct TagCatalog {
    tags: RwLock<Vec<Tag>>,
    loaded: OnceCell<()>,
}

impl TagCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the catalog the first time this is called. Later calls (and
    /// concurrent callers) wait for that first load and never refetch,
    /// even if it failed.
    pub async fn load(&self, backend: &dyn Backend) {
        self.loaded
            .get_or_init(|| async {
                match backend.list_tags().await {
                    Ok(tags) => {
                        tracing::info!(count = tags.len(), "Loaded tag catalog");
                        self.replace(tags);
                    }
                    Err(e) => {
                        tracing::error!("Error fetching tags: {}", e);
                    }
                }
            })
            .await;
    }

    /// True until the first load has finished.
    pub fn is_loading(&self) -> bool {
        !self.loaded.initialized()
    }

    pub fn tags(&self) -> Vec<Tag> {
        match self.tags.read() {
            Ok(tags) => tags.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, tags: Vec<Tag>) {
        match self.tags.write() {
            Ok(mut slot) => *slot = tags,
            Err(poisoned) => *poisoned.into_inner() = tags,
        }
    }
}

/// Tags whose names appear in `names`, in catalog order. Unknown names are
/// skipped.
pub fn resolve<S: AsRef<str>>(catalog: Vec<Tag>, names: &[S]) -> Vec<Tag> {
    catalog
        .into_iter()
        .filter(|tag| names.iter().any(|n| n.as_ref() == tag.name))
        .collect()
}
