//! Knowledge base types and the KnowledgeBase trait.
//!
//! A knowledge entry is one retrievable unit of reference content. Entries
//! may not have a computed embedding yet (or the embedding may be stale
//! relative to the latest description) — consumers must tolerate both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One retrievable unit of reference content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique ID for this entry
    pub id: String,

    /// Short title shown to the generation service
    pub title: String,

    /// Longer description (truncated when rendered into the prompt)
    pub description: String,

    /// Tags for categorization
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Static category flag (e.g., "care" for support/crisis resources)
    pub category: String,

    /// Optional embedding vector (stored as blob in DB, never serialized)
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// A single similarity-search hit: entry ID plus relevance score.
///
/// Ephemeral — produced per query, never persisted or cached across queries.
/// Scores are threaded by ID so they can never be misattributed to another
/// entry with a similar title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    /// The matched entry's ID
    pub entry_id: String,

    /// Cosine-like similarity in [0, 1]
    pub score: f32,
}

/// A knowledge entry with its per-query relevance annotation.
///
/// `similarity` is `Some` only on the ranked path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntry {
    /// The full entry record
    pub entry: KnowledgeEntry,

    /// Similarity score, present only when the match was ranked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// The resource matcher's return shape — one of exactly two forms:
/// ranked entries with scores, or an unranked category-filtered fallback set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMatches {
    /// Matched entries, in retrieval order
    pub entries: Vec<ScoredEntry>,

    /// Whether the entries were ranked by similarity
    pub ranked: bool,
}

impl ResourceMatches {
    /// An empty, unranked result — the bottom of the fallback ladder.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            ranked: false,
        }
    }
}

/// Query-independent auxiliary content, always appended to the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryItem {
    /// Lesson title
    pub title: String,

    /// The group (track/course) the lesson belongs to
    pub group_name: String,
}

/// Read access to knowledge entries and curated lessons.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Vector-similarity query. Entries without a computed embedding are
    /// excluded from the search, not scored as zero. Returns hits ordered by
    /// descending score, capped at `limit`, all scores `>= threshold`.
    async fn search_by_similarity(
        &self,
        vector: &[f32],
        threshold: f32,
        limit: usize,
    ) -> std::result::Result<Vec<SimilarityHit>, StoreError>;

    /// Fetch full records for the given IDs. The returned order follows the
    /// input IDs; unknown IDs are silently skipped.
    async fn get_entries(
        &self,
        ids: &[String],
    ) -> std::result::Result<Vec<KnowledgeEntry>, StoreError>;

    /// Plain filter query by static category flag, capped at `limit`.
    async fn list_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> std::result::Result<Vec<KnowledgeEntry>, StoreError>;

    /// Curated lesson titles for the auxiliary prompt section, capped at
    /// `limit`. Independent of any query.
    async fn list_curated_lessons(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<AuxiliaryItem>, StoreError>;
}
