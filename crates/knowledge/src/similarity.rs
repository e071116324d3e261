//! Vector similarity utilities for the knowledge index.

use helpdesk_core::KnowledgeChunk;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
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

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns chunks sorted by descending similarity with `score` set to
/// the cosine value. Only chunks that have embeddings and meet the
/// score threshold are included. Ties break on chunk ID so repeated
/// queries against an unchanged index return identical orderings.
pub fn rank_chunks(
    chunks: &[KnowledgeChunk],
    query_embedding: &[f32],
    top_k: usize,
    score_threshold: f32,
) -> Vec<KnowledgeChunk> {
    let mut scored: Vec<KnowledgeChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let emb = chunk.embedding.as_ref()?;
            let sim = cosine_similarity(emb, query_embedding);
            if sim >= score_threshold {
                let mut c = chunk.clone();
                c.score = sim;
                Some(c)
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(top_k);
    scored
}
