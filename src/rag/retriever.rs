//! Similarity scoring and top-K retrieval
//!
//! Pure functions: no I/O, no mutation of input chunks.

use crate::models::DocumentChunk;
use crate::models::RetrievalResult;

/// Compute cosine similarity between two vectors
///
/// `dot(a,b) / (||a|| * ||b||)`, in [-1, 1]. Defined as 0.0 when either
/// vector has zero magnitude (guards divide-by-zero) or when the
/// dimensionalities differ; never an error and never NaN, so retrieval
/// stays total over mixed pools.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score all candidate chunks against a query embedding and return the top K
///
/// Chunks lacking an embedding are not candidates (not an error). Results
/// are sorted descending by score; the sort is stable, so ties keep their
/// input order. Returns at most `top_k` results, or fewer if fewer
/// candidates exist; `top_k == 0` returns an empty set.
#[must_use]
pub fn retrieve(
    query_embedding: &[f32],
    chunks: &[DocumentChunk],
    top_k: usize,
) -> Vec<RetrievalResult> {
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<RetrievalResult> = chunks
        .iter()
        .filter_map(|chunk| {
            chunk.embedding.as_ref().map(|embedding| RetrievalResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
        })
        .collect();

    // Vec::sort_by is stable; ties keep input order
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}
