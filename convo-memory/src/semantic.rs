//! Embedding-indexed memory answering similarity queries over past exchanges.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::embeddings::{Embedder, EmbeddingVector};
use crate::index::{EmbeddingIndex, IndexMatch};
use crate::options::MemoryOptions;
use crate::record::ConversationRecord;
use crate::render::{self, RenderFormat};
use crate::store::{self, MemoryStore};
use crate::{MemoryError, MemoryResult};

const DEFAULT_TOP_K: NonZeroUsize = NonZeroUsize::new(3).expect("non-zero");

/// Options recognized by [`SemanticMemory::get_memory`](MemoryStore::get_memory).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemanticOptions {
    /// Render only the most recent of the selected records.
    pub max_records: Option<NonZeroUsize>,
    /// Output layout.
    pub format: RenderFormat,
    /// Text to rank records against. Without it every record is rendered.
    pub query: Option<String>,
    /// Number of best matches kept for a query. Defaults to 3.
    pub top_k: Option<NonZeroUsize>,
}

impl SemanticOptions {
    fn validate(&self) -> MemoryResult<()> {
        match (&self.query, self.top_k) {
            (None, Some(_)) => Err(MemoryError::invalid_configuration(
                "top_k requires a query",
            )),
            (Some(query), _) if query.trim().is_empty() => Err(
                MemoryError::invalid_configuration("query must not be empty"),
            ),
            _ => Ok(()),
        }
    }
}

/// Memory that indexes each exchange by an embedding of its text.
///
/// Holds at most `capacity` records; the oldest is evicted together with its
/// index entry. Query results are rendered in chronological order.
pub struct SemanticMemory {
    capacity: NonZeroUsize,
    embedder: Arc<dyn Embedder>,
    entries: VecDeque<ConversationRecord>,
    keys: VecDeque<Uuid>,
    index: EmbeddingIndex,
}

impl SemanticMemory {
    /// Creates an empty semantic memory.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            embedder,
            entries: VecDeque::with_capacity(capacity.get()),
            keys: VecDeque::with_capacity(capacity.get()),
            index: EmbeddingIndex::new(),
        }
    }

    /// Returns the records most similar to `query`, oldest first.
    ///
    /// Records sharing nothing with the query (similarity at or below zero)
    /// are never returned. Among equal scores the older record wins.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures and reports
    /// [`MemoryError::InvariantViolation`] when the index disagrees with the
    /// stored records.
    pub fn search(&self, query: &str, top_k: NonZeroUsize) -> MemoryResult<Vec<&ConversationRecord>> {
        self.check_index()?;
        let embedding = self.embed(query)?;

        let mut positions: Vec<usize> = self
            .index
            .rank(&embedding, self.keys.iter().copied(), top_k)
            .iter()
            .map(IndexMatch::position)
            .collect();
        positions.sort_unstable();

        Ok(positions.into_iter().map(|position| &self.entries[position]).collect())
    }

    fn embed(&self, text: &str) -> MemoryResult<EmbeddingVector> {
        self.embedder.embed(text).inspect_err(|err| {
            warn!(?err, "embedding failed");
        })
    }

    fn check_index(&self) -> MemoryResult<()> {
        let consistent = self.keys.len() == self.entries.len()
            && self.index.len() == self.entries.len()
            && self.keys.iter().all(|key| self.index.contains(*key));
        if consistent {
            Ok(())
        } else {
            Err(MemoryError::InvariantViolation(format!(
                "{} records, {} keys, {} index entries",
                self.entries.len(),
                self.keys.len(),
                self.index.len()
            )))
        }
    }

    fn evict_oldest(&mut self) {
        self.entries.pop_front();
        if let Some(key) = self.keys.pop_front() {
            self.index.remove(key);
        }
        debug!(capacity = self.capacity.get(), "evicted oldest indexed record");
    }
}

impl fmt::Debug for SemanticMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticMemory")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl MemoryStore for SemanticMemory {
    fn add_memory(&mut self, prompt: &str, response: Value) -> MemoryResult<()> {
        let record = ConversationRecord::new(prompt, response)?;
        let embedding = self.embed(&format!("{}\n{}", record.prompt(), record.response_text()))?;

        let key = Uuid::new_v4();
        self.index.upsert(key, embedding);
        self.keys.push_back(key);
        self.entries.push_back(record);

        while self.entries.len() > self.capacity.get() {
            self.evict_oldest();
        }
        Ok(())
    }

    fn get_memory(&self, options: &MemoryOptions) -> MemoryResult<String> {
        let options: SemanticOptions = options.parse()?;
        options.validate()?;

        let records = match &options.query {
            Some(query) => {
                let selected = self.search(query, options.top_k.unwrap_or(DEFAULT_TOP_K))?;
                render::most_recent(selected, options.max_records)
            }
            None => {
                self.check_index()?;
                render::most_recent(&self.entries, options.max_records)
            }
        };
        render::render(&records, None, options.format)
    }

    fn remove_memory(&mut self, prompt: &str) -> Option<ConversationRecord> {
        let Some((position, removed)) = store::remove_first(&mut self.entries, prompt) else {
            debug!(prompt, "no indexed record to remove");
            return None;
        };
        if let Some(key) = self.keys.remove(position) {
            self.index.remove(key);
        }
        debug!(prompt, position, "removed indexed record");
        Some(removed)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.index.clear();
        debug!("cleared semantic memory");
    }

    fn history(&self) -> &VecDeque<ConversationRecord> {
        &self.entries
    }

    fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}
