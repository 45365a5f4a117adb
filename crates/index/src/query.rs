use std::cmp::Ordering;

use crate::{ChunkRecord, ScoredChunk};

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0.0 for mismatched lengths or when either vector is all zeros.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0f32, 0f32, 0f32);
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Keeps the `k` best-scoring chunks seen so far.
pub(crate) struct TopK {
    k: usize,
    hits: Vec<ScoredChunk>,
}

impl TopK {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            hits: Vec::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    pub(crate) fn offer(&mut self, query: &[f32], record: ChunkRecord) {
        if self.k == 0 {
            return;
        }
        let score = cosine_similarity(query, &record.embedding);
        if self.hits.len() == self.k {
            if let Some(worst) = self.hits.last() {
                if rank(&worst.score, &worst.id, &score, &record.id) != Ordering::Greater {
                    return;
                }
            }
        }
        let hit = ScoredChunk {
            id: record.id,
            text: record.text,
            metadata: record.metadata,
            score,
        };
        let pos = self
            .hits
            .partition_point(|h| rank(&h.score, &h.id, &hit.score, &hit.id) == Ordering::Less);
        self.hits.insert(pos, hit);
        self.hits.truncate(self.k);
    }

    /// Best first.
    pub(crate) fn into_sorted(self) -> Vec<ScoredChunk> {
        self.hits
    }
}

/// Orders by descending score, then ascending id. `Less` means `a` ranks first.
fn rank(a_score: &f32, a_id: &str, b_score: &f32, b_id: &str) -> Ordering {
    b_score
        .partial_cmp(a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_id.cmp(b_id))
}
