//! Embedding vectors and the embedding capability used by semantic memory.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::{MemoryError, MemoryResult};

/// Wrapper type around an immutable floating-point embedding.
#[derive(Clone, PartialEq)]
pub struct EmbeddingVector {
    values: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Creates a new embedding from owned values.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidRecord`] when the supplied vector is empty
    /// or contains non-finite values.
    pub fn new(values: Vec<f32>) -> MemoryResult<Self> {
        if values.is_empty() {
            return Err(MemoryError::InvalidRecord(
                "embedding vector must not be empty",
            ));
        }
        if !values.iter().all(|value| value.is_finite()) {
            return Err(MemoryError::InvalidRecord(
                "embedding vector contains non-finite values",
            ));
        }
        Ok(Self {
            values: Arc::<[f32]>::from(values.into_boxed_slice()),
        })
    }

    /// Returns the dimensionality of the embedding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the embedding is empty. Never true for vectors built
    /// through [`EmbeddingVector::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cosine similarity in `[-1, 1]`; zero when either vector has no
    /// magnitude or the dimensions differ.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        if self.len() != other.len() {
            return 0.0;
        }
        let denominator = self.magnitude() * other.magnitude();
        if denominator == 0.0 {
            0.0
        } else {
            self.dot(other) / denominator
        }
    }

    fn dot(&self, other: &Self) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    fn magnitude(&self) -> f32 {
        self.values
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt()
    }
}

impl std::fmt::Debug for EmbeddingVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingVector")
            .field("dimensions", &self.len())
            .finish()
    }
}

/// Capability turning text into an embedding.
pub trait Embedder: Send + Sync {
    /// Embeds the supplied text.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Embedding`] (or another variant chosen by the
    /// implementation) when the text cannot be embedded.
    fn embed(&self, text: &str) -> MemoryResult<EmbeddingVector>;
}

impl<F> Embedder for F
where
    F: Fn(&str) -> MemoryResult<EmbeddingVector> + Send + Sync,
{
    fn embed(&self, text: &str) -> MemoryResult<EmbeddingVector> {
        self(text)
    }
}

/// Deterministic bag-of-words embedder based on feature hashing.
///
/// Every lowercase alphanumeric token increments one bucket chosen by an
/// FNV-1a hash of the token. Useful offline and in tests; it captures lexical
/// overlap only.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: NonZeroUsize,
}

impl HashingEmbedder {
    /// Creates an embedder producing vectors with `dimensions` buckets.
    #[must_use]
    pub const fn new(dimensions: NonZeroUsize) -> Self {
        Self { dimensions }
    }

    /// Returns the vector dimensionality.
    #[must_use]
    pub const fn dimensions(self) -> NonZeroUsize {
        self.dimensions
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(256).expect("non-zero"))
    }
}

impl Embedder for HashingEmbedder {
    #[allow(clippy::cast_possible_truncation)]
    fn embed(&self, text: &str) -> MemoryResult<EmbeddingVector> {
        let mut buckets = vec![0.0_f32; self.dimensions.get()];
        let width = buckets.len() as u64;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let bucket = fnv1a(token.to_lowercase().as_bytes()) % width;
            buckets[bucket as usize] += 1.0;
        }
        EmbeddingVector::new(buckets)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
