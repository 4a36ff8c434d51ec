//! Fixed-window memory backed by a bounded ring buffer.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::MemoryResult;
use crate::options::MemoryOptions;
use crate::record::ConversationRecord;
use crate::render::{self, RenderFormat};
use crate::store::{self, MemoryStore};

/// Configuration for the fixed-window strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    capacity: NonZeroUsize,
    max_total_bytes: Option<NonZeroUsize>,
}

impl WindowConfig {
    /// Creates a configuration with the provided capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            max_total_bytes: None,
        }
    }

    /// Sets the optional total byte ceiling for the window.
    #[must_use]
    pub fn with_max_total_bytes(mut self, max_total_bytes: NonZeroUsize) -> Self {
        self.max_total_bytes = Some(max_total_bytes);
        self
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns the maximum total bytes, if configured.
    #[must_use]
    pub const fn max_total_bytes(self) -> Option<NonZeroUsize> {
        self.max_total_bytes
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

/// Options recognized by [`WindowMemory::get_memory`](MemoryStore::get_memory).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowOptions {
    /// Render only the most recent records.
    pub max_records: Option<NonZeroUsize>,
    /// Output layout.
    pub format: RenderFormat,
}

/// Memory retaining only the most recent exchanges.
#[derive(Debug, Default)]
pub struct WindowMemory {
    config: WindowConfig,
    entries: VecDeque<ConversationRecord>,
    total_bytes: usize,
}

impl WindowMemory {
    /// Creates an empty window using the supplied configuration.
    #[must_use]
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            entries: VecDeque::with_capacity(config.capacity().get()),
            total_bytes: 0,
        }
    }

    /// Creates an empty window holding at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::new(WindowConfig::new(capacity))
    }

    /// Returns statistics about the window utilisation.
    #[must_use]
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            entries: self.entries.len(),
            total_bytes: self.total_bytes,
            capacity: self.config.capacity().get(),
            max_total_bytes: self.config.max_total_bytes().map(NonZeroUsize::get),
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(evicted) = self.entries.pop_front() {
            self.total_bytes = self.total_bytes.saturating_sub(evicted.size_bytes());
            debug!(prompt = evicted.prompt(), "evicted oldest conversation record");
        }
    }
}

impl MemoryStore for WindowMemory {
    fn add_memory(&mut self, prompt: &str, response: Value) -> MemoryResult<()> {
        let record = ConversationRecord::new(prompt, response)?;
        self.total_bytes += record.size_bytes();
        self.entries.push_back(record);

        while self.entries.len() > self.config.capacity().get() {
            self.evict_oldest();
        }

        if let Some(limit) = self.config.max_total_bytes() {
            let limit = limit.get();
            while self.total_bytes > limit && self.entries.len() > 1 {
                self.evict_oldest();
            }
        }
        Ok(())
    }

    fn get_memory(&self, options: &MemoryOptions) -> MemoryResult<String> {
        let options: WindowOptions = options.parse()?;
        let records = render::most_recent(&self.entries, options.max_records);
        render::render(&records, None, options.format)
    }

    fn remove_memory(&mut self, prompt: &str) -> Option<ConversationRecord> {
        let Some((position, removed)) = store::remove_first(&mut self.entries, prompt) else {
            debug!(prompt, "no conversation record to remove");
            return None;
        };
        self.total_bytes = self.total_bytes.saturating_sub(removed.size_bytes());
        debug!(prompt, position, "removed conversation record");
        Some(removed)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
        debug!("cleared window memory");
    }

    fn history(&self) -> &VecDeque<ConversationRecord> {
        &self.entries
    }

    fn capacity(&self) -> NonZeroUsize {
        self.config.capacity()
    }
}

/// Snapshot describing utilisation of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    /// Entries currently stored in the window.
    pub entries: usize,
    /// Accumulated record bytes currently retained.
    pub total_bytes: usize,
    /// Maximum number of entries permitted.
    pub capacity: usize,
    /// Optional total byte limit when configured.
    pub max_total_bytes: Option<usize>,
}
