//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use shepherd_core::error::StoreError;
use shepherd_core::knowledge::{AuxiliaryItem, KnowledgeBase, KnowledgeEntry, SimilarityHit};
use shepherd_core::template::{
    DEFAULT_MENTOR_TEMPLATE, InstructionTemplate, MENTOR_TEMPLATE_KEY, PromptStore,
    TemplateRevision,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::vector;

#[derive(Default)]
struct Inner {
    templates: HashMap<String, InstructionTemplate>,
    revisions: Vec<TemplateRevision>,
    entries: Vec<KnowledgeEntry>,
    lessons: Vec<AuxiliaryItem>,
}

/// An in-memory store that keeps everything in a Vec/HashMap behind one lock.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Create an empty store seeded with the default mentor template.
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.templates.insert(
            MENTOR_TEMPLATE_KEY.to_string(),
            InstructionTemplate {
                key: MENTOR_TEMPLATE_KEY.to_string(),
                text: DEFAULT_MENTOR_TEMPLATE.to_string(),
                description: "Base instructions for the mentor chat".to_string(),
            },
        );
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Add a knowledge entry.
    pub async fn insert_entry(&self, entry: KnowledgeEntry) {
        self.inner.write().await.entries.push(entry);
    }

    /// Add a curated lesson.
    pub async fn insert_lesson(&self, lesson: AuxiliaryItem) {
        self.inner.write().await.lessons.push(lesson);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptStore for InMemoryStore {
    async fn get_current(&self, key: &str) -> Result<InstructionTemplate, StoreError> {
        let inner = self.inner.read().await;
        inner
            .templates
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("template '{key}'")))
    }

    async fn set_current(
        &self,
        key: &str,
        new_text: &str,
        editor_id: &str,
    ) -> Result<(), StoreError> {
        // The write lock spans snapshot and update, so each save observes
        // the previous save's text as its old_text.
        let mut inner = self.inner.write().await;
        let old_text = inner.templates.get(key).map(|t| t.text.clone());

        inner.revisions.push(TemplateRevision {
            id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            old_text,
            new_text: new_text.to_string(),
            changed_by: editor_id.to_string(),
            changed_at: Utc::now(),
        });

        inner
            .templates
            .entry(key.to_string())
            .and_modify(|t| t.text = new_text.to_string())
            .or_insert_with(|| InstructionTemplate {
                key: key.to_string(),
                text: new_text.to_string(),
                description: String::new(),
            });

        Ok(())
    }

    async fn list_revisions(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<TemplateRevision>, StoreError> {
        let inner = self.inner.read().await;
        let mut revisions: Vec<TemplateRevision> = inner
            .revisions
            .iter()
            .filter(|r| r.key == key)
            .cloned()
            .collect();
        // Most recent first; appends are chronological, so reversing suffices
        // even when timestamps collide.
        revisions.reverse();
        revisions.truncate(limit);
        Ok(revisions)
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryStore {
    async fn search_by_similarity(
        &self,
        vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, StoreError> {
        let inner = self.inner.read().await;
        let candidates: Vec<(String, Vec<f32>)> = inner
            .entries
            .iter()
            .filter_map(|e| e.embedding.as_ref().map(|emb| (e.id.clone(), emb.clone())))
            .collect();
        Ok(vector::rank_hits(&candidates, vector, threshold, limit))
    }

    async fn get_entries(&self, ids: &[String]) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.entries.iter().find(|e| &e.id == id).cloned())
            .collect())
    }

    async fn list_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.category == category)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_curated_lessons(&self, limit: usize) -> Result<Vec<AuxiliaryItem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.lessons.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, category: &str, embedding: Option<Vec<f32>>) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.into(),
            title: format!("Entry {id}"),
            description: format!("Description for {id}"),
            tags: vec![],
            category: category.into(),
            embedding,
        }
    }

    #[tokio::test]
    async fn seeded_with_default_template() {
        let store = InMemoryStore::new();
        let template = store.get_current(MENTOR_TEMPLATE_KEY).await.unwrap();
        assert_eq!(template.text, DEFAULT_MENTOR_TEMPLATE);
    }

    #[tokio::test]
    async fn unknown_template_key_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.get_current("no_such_key").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn set_current_appends_one_revision_with_old_text() {
        let store = InMemoryStore::new();
        store
            .set_current(MENTOR_TEMPLATE_KEY, "Be concise.", "admin_1")
            .await
            .unwrap();

        let revisions = store.list_revisions(MENTOR_TEMPLATE_KEY, 1).await.unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(
            revisions[0].old_text.as_deref(),
            Some(DEFAULT_MENTOR_TEMPLATE)
        );
        assert_eq!(revisions[0].new_text, "Be concise.");
        assert_eq!(revisions[0].changed_by, "admin_1");

        let current = store.get_current(MENTOR_TEMPLATE_KEY).await.unwrap();
        assert_eq!(current.text, "Be concise.");
    }

    #[tokio::test]
    async fn revisions_listed_most_recent_first() {
        let store = InMemoryStore::new();
        store
            .set_current(MENTOR_TEMPLATE_KEY, "First", "admin_1")
            .await
            .unwrap();
        store
            .set_current(MENTOR_TEMPLATE_KEY, "Second", "admin_1")
            .await
            .unwrap();

        let revisions = store.list_revisions(MENTOR_TEMPLATE_KEY, 10).await.unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].new_text, "Second");
        assert_eq!(revisions[0].old_text.as_deref(), Some("First"));
        assert_eq!(revisions[1].new_text, "First");
    }

    #[tokio::test]
    async fn concurrent_edits_each_produce_a_revision() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .set_current(MENTOR_TEMPLATE_KEY, &format!("Text {i}"), "editor")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let revisions = store.list_revisions(MENTOR_TEMPLATE_KEY, 100).await.unwrap();
        assert_eq!(revisions.len(), 8);

        // Snapshot-before-write: each revision's old_text is the previous
        // revision's new_text (revisions are newest-first here).
        for pair in revisions.windows(2) {
            assert_eq!(pair[0].old_text.as_deref(), Some(pair[1].new_text.as_str()));
        }

        // Head revision matches the current template text.
        let current = store.get_current(MENTOR_TEMPLATE_KEY).await.unwrap();
        assert_eq!(revisions[0].new_text, current.text);
    }

    #[tokio::test]
    async fn similarity_search_skips_entries_without_embeddings() {
        let store = InMemoryStore::new();
        store.insert_entry(entry("a", "faith", Some(vec![1.0, 0.0]))).await;
        store.insert_entry(entry("b", "faith", None)).await;

        let hits = store
            .search_by_similarity(&[1.0, 0.0], 0.0, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry_id, "a");
    }

    #[tokio::test]
    async fn get_entries_follows_input_order() {
        let store = InMemoryStore::new();
        store.insert_entry(entry("a", "faith", None)).await;
        store.insert_entry(entry("b", "faith", None)).await;
        store.insert_entry(entry("c", "faith", None)).await;

        let ids = vec!["c".to_string(), "a".to_string(), "missing".to_string()];
        let entries = store.get_entries(&ids).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "c");
        assert_eq!(entries[1].id, "a");
    }

    #[tokio::test]
    async fn category_listing_respects_limit() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store.insert_entry(entry(&format!("e{i}"), "care", None)).await;
        }
        store.insert_entry(entry("other", "faith", None)).await;

        let entries = store.list_by_category("care", 20).await.unwrap();
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.category == "care"));
    }

    #[tokio::test]
    async fn curated_lessons_capped() {
        let store = InMemoryStore::new();
        for i in 0..15 {
            store
                .insert_lesson(AuxiliaryItem {
                    title: format!("Lesson {i}"),
                    group_name: "Foundations".into(),
                })
                .await;
        }

        let lessons = store.list_curated_lessons(10).await.unwrap();
        assert_eq!(lessons.len(), 10);
    }
}
