//! Resource matcher — the fallback ladder.
//!
//! Given a free-text query, produce one of exactly two result shapes:
//! - ranked entries with similarity scores (the success path), or
//! - an unranked, category-filtered fallback set.
//!
//! The ladder is an explicit ordered chain of `Option`-returning rungs so
//! each rung is independently testable. The matcher never raises to its
//! caller; every failure mode resolves to one of the two shapes.

use shepherd_core::knowledge::{KnowledgeBase, ResourceMatches, ScoredEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::embedding::EmbeddingClient;

/// Matching policy values.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    /// Minimum similarity for a ranked match (0–1 cosine-like scale)
    pub min_similarity: f32,
    /// Result cap on the ranked path
    pub match_limit: usize,
    /// Result cap on the fallback path
    pub fallback_limit: usize,
    /// Static category flag for the fallback path
    pub fallback_category: String,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            match_limit: 5,
            fallback_limit: 20,
            fallback_category: "care".into(),
        }
    }
}

/// Locates the subset of the knowledge base most relevant to a question.
pub struct ResourceMatcher {
    embedder: EmbeddingClient,
    kb: Arc<dyn KnowledgeBase>,
    policy: MatchPolicy,
}

impl ResourceMatcher {
    /// Create a new matcher.
    pub fn new(embedder: EmbeddingClient, kb: Arc<dyn KnowledgeBase>, policy: MatchPolicy) -> Self {
        Self {
            embedder,
            kb,
            policy,
        }
    }

    /// Match resources for a query. Total: always returns one of the two
    /// result shapes, never an error.
    pub async fn matches(&self, query: &str) -> ResourceMatches {
        if let Some(found) = self.ranked_matches(query).await {
            return found;
        }
        self.fallback_matches().await
    }

    /// Rung 1: embed the query and run the similarity search.
    ///
    /// `None` when the embedding is unavailable, the search errors, the hit
    /// set is empty, or no hit's record can be fetched — each of which sends
    /// the caller down to the fallback rung.
    async fn ranked_matches(&self, query: &str) -> Option<ResourceMatches> {
        let vector = self.embedder.embed(query).await.ok()?;

        let hits = self
            .kb
            .search_by_similarity(&vector, self.policy.min_similarity, self.policy.match_limit)
            .await
            .map_err(|e| warn!(error = %e, "Similarity search failed"))
            .ok()?;

        if hits.is_empty() {
            debug!("No entries above similarity threshold");
            return None;
        }

        let ids: Vec<String> = hits.iter().map(|h| h.entry_id.clone()).collect();
        let records = self
            .kb
            .get_entries(&ids)
            .await
            .map_err(|e| warn!(error = %e, "Entry fetch failed"))
            .ok()?;

        // Scores travel by ID, and entries keep the hit order — no
        // re-sorting between fetch and annotate.
        let mut by_id: HashMap<String, _> = records.into_iter().map(|e| (e.id.clone(), e)).collect();
        let entries: Vec<ScoredEntry> = hits
            .iter()
            .filter_map(|hit| {
                by_id.remove(&hit.entry_id).map(|entry| ScoredEntry {
                    entry,
                    similarity: Some(hit.score),
                })
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        debug!(matched = entries.len(), "Ranked matches found");
        Some(ResourceMatches {
            entries,
            ranked: true,
        })
    }

    /// Rung 2: unranked category-filtered fallback. A storage error here
    /// yields an empty set — still one of the two valid shapes.
    async fn fallback_matches(&self) -> ResourceMatches {
        let entries = self
            .kb
            .list_by_category(&self.policy.fallback_category, self.policy.fallback_limit)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Fallback category listing failed");
                Vec::new()
            });

        debug!(
            category = %self.policy.fallback_category,
            entries = entries.len(),
            "Using fallback resources"
        );

        ResourceMatches {
            entries: entries
                .into_iter()
                .map(|entry| ScoredEntry {
                    entry,
                    similarity: None,
                })
                .collect(),
            ranked: false,
        }
    }
}
