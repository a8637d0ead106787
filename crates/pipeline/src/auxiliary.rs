//! Auxiliary content fetcher — curated lessons, always included.
//!
//! Strictly best-effort: any retrieval error maps to an empty list at this
//! single boundary instead of propagating up the pipeline.

use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeBase};
use std::sync::Arc;
use tracing::warn;

/// Fetches a small, capped list of curated lessons, independent of the query.
pub struct AuxiliaryFetcher {
    kb: Arc<dyn KnowledgeBase>,
    limit: usize,
}

impl AuxiliaryFetcher {
    /// Create a new fetcher with the given cap.
    pub fn new(kb: Arc<dyn KnowledgeBase>, limit: usize) -> Self {
        Self { kb, limit }
    }

    /// Fetch curated lessons. Errors degrade to an empty list.
    pub async fn fetch(&self) -> Vec<AuxiliaryItem> {
        self.kb
            .list_curated_lessons(self.limit)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Curated lesson fetch failed");
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailingKnowledgeBase;
    use shepherd_store::InMemoryStore;

    #[tokio::test]
    async fn fetch_returns_capped_lessons() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..15 {
            store
                .insert_lesson(AuxiliaryItem {
                    title: format!("Lesson {i}"),
                    group_name: "Foundations".into(),
                })
                .await;
        }

        let fetcher = AuxiliaryFetcher::new(store, 10);
        let lessons = fetcher.fetch().await;
        assert_eq!(lessons.len(), 10);
    }

    #[tokio::test]
    async fn fetch_error_degrades_to_empty() {
        let fetcher = AuxiliaryFetcher::new(Arc::new(FailingKnowledgeBase), 10);
        let lessons = fetcher.fetch().await;
        assert!(lessons.is_empty());
    }
}
