//! In-process embedding index scored by cosine similarity.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use uuid::Uuid;

use crate::embeddings::EmbeddingVector;

/// Match returned from [`EmbeddingIndex::rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexMatch {
    position: usize,
    score: f32,
}

impl IndexMatch {
    /// Position of the matched id in the candidate order passed to `rank`.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns cosine similarity score.
    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Simple in-memory embedding index keyed by [`Uuid`].
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    points: HashMap<Uuid, EmbeddingVector>,
}

impl EmbeddingIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the embedding stored under `id`.
    pub fn upsert(&mut self, id: Uuid, embedding: EmbeddingVector) {
        self.points.insert(id, embedding);
    }

    /// Removes an entry if present.
    pub fn remove(&mut self, id: Uuid) -> Option<EmbeddingVector> {
        self.points.remove(&id)
    }

    /// Returns whether `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.points.contains_key(&id)
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Scores `candidates` against `embedding` and keeps the `top_k` best.
    ///
    /// Only positive scores are kept. Equal scores keep candidate order, so
    /// passing ids oldest first makes ties resolve to the oldest entry.
    /// Candidates that are not indexed or whose dimensionality differs from
    /// the query are skipped.
    #[must_use]
    pub fn rank<I>(&self, embedding: &EmbeddingVector, candidates: I, top_k: NonZeroUsize) -> Vec<IndexMatch>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut matches: Vec<IndexMatch> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(position, id)| {
                let point = self.points.get(&id)?;
                let score = point.cosine_similarity(embedding);
                (score > 0.0).then_some(IndexMatch { position, score })
            })
            .collect();

        // Stable sort: ties stay in candidate order.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k.get());
        matches
    }
}
