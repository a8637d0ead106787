//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and threshold/limit ranking over candidate
//! embeddings. The knowledge base backends use these to answer
//! `search_by_similarity` without an external vector index.

use shepherd_core::knowledge::SimilarityHit;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 =
/// opposite. Returns 0.0 if either vector is zero-length or empty, or if
/// the dimensions disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank candidate embeddings against a query vector.
///
/// Returns hits sorted by descending similarity, capped at `limit`, keeping
/// only scores `>= threshold`. The sort is stable, so equal scores preserve
/// candidate order. Candidates are `(entry_id, embedding)` pairs — entries
/// without embeddings must be filtered out by the caller before ranking,
/// not scored as zero.
pub fn rank_hits(
    candidates: &[(String, Vec<f32>)],
    query: &[f32],
    threshold: f32,
    limit: usize,
) -> Vec<SimilarityHit> {
    let mut hits: Vec<SimilarityHit> = candidates
        .iter()
        .filter_map(|(id, embedding)| {
            let score = cosine_similarity(embedding, query);
            if score >= threshold {
                Some(SimilarityHit {
                    entry_id: id.clone(),
                    score,
                })
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
