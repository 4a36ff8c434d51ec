//! Strategy selection: configuration, builder, and the tagged strategy enum.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embeddings::Embedder;
use crate::model::LanguageModel;
use crate::options::MemoryOptions;
use crate::record::ConversationRecord;
use crate::semantic::SemanticMemory;
use crate::store::MemoryStore;
use crate::summary::SummaryMemory;
use crate::window::{WindowConfig, WindowMemory};
use crate::{MemoryError, MemoryResult};

fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::MIN
}

/// Declarative description of a memory strategy.
///
/// Deserializes from JSON such as `{"strategy": "window", "capacity": 8}`.
/// `capacity` defaults to 1 for every strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum MemoryConfig {
    /// Keep only the most recent exchanges.
    Window {
        /// Maximum number of records retained.
        #[serde(default = "default_capacity")]
        capacity: NonZeroUsize,
        /// Optional ceiling on retained record bytes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_total_bytes: Option<NonZeroUsize>,
    },
    /// Keep recent exchanges verbatim and summarize older ones.
    Summary {
        /// Number of records kept verbatim.
        #[serde(default = "default_capacity")]
        capacity: NonZeroUsize,
    },
    /// Index exchanges by embedding for similarity recall.
    Semantic {
        /// Maximum number of records retained.
        #[serde(default = "default_capacity")]
        capacity: NonZeroUsize,
    },
}

impl MemoryConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidConfiguration`] when the document does not
    /// describe a known strategy.
    pub fn from_json(text: &str) -> MemoryResult<Self> {
        serde_json::from_str(text).map_err(|err| MemoryError::invalid_configuration(err.to_string()))
    }

    /// Returns the configured capacity threshold.
    #[must_use]
    pub const fn capacity(self) -> NonZeroUsize {
        match self {
            Self::Window { capacity, .. }
            | Self::Summary { capacity }
            | Self::Semantic { capacity } => capacity,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::Window {
            capacity: default_capacity(),
            max_total_bytes: None,
        }
    }
}

/// Builder for [`AnyMemory`] instances.
pub struct MemoryBuilder {
    config: MemoryConfig,
    model: Option<Arc<dyn LanguageModel>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl MemoryBuilder {
    /// Starts a new builder for the supplied strategy.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            model: None,
            embedder: None,
        }
    }

    /// Installs the language model. Required by the summary strategy.
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Installs the embedder. Required by the semantic strategy.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Builds the configured memory.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::MissingModel`] or [`MemoryError::MissingEmbedder`]
    /// when the chosen strategy needs a capability that was not provided.
    pub fn build(self) -> MemoryResult<AnyMemory> {
        let memory = match self.config {
            MemoryConfig::Window {
                capacity,
                max_total_bytes,
            } => {
                let mut config = WindowConfig::new(capacity);
                if let Some(limit) = max_total_bytes {
                    config = config.with_max_total_bytes(limit);
                }
                AnyMemory::Window(WindowMemory::new(config))
            }
            MemoryConfig::Summary { capacity } => {
                let model = self.model.ok_or(MemoryError::MissingModel)?;
                AnyMemory::Summary(SummaryMemory::new(model, capacity))
            }
            MemoryConfig::Semantic { capacity } => {
                let embedder = self.embedder.ok_or(MemoryError::MissingEmbedder)?;
                AnyMemory::Semantic(SemanticMemory::new(embedder, capacity))
            }
        };
        tracing::debug!(strategy = memory.strategy(), capacity = %self.config.capacity(), "memory built");
        Ok(memory)
    }
}

/// Any of the strategies shipped with this crate, dispatched by variant.
#[derive(Debug)]
pub enum AnyMemory {
    /// Fixed-window strategy.
    Window(WindowMemory),
    /// Summarizing strategy.
    Summary(SummaryMemory),
    /// Embedding-indexed strategy.
    Semantic(SemanticMemory),
}

impl AnyMemory {
    /// Creates a builder for the supplied configuration.
    #[must_use]
    pub fn builder(config: MemoryConfig) -> MemoryBuilder {
        MemoryBuilder::new(config)
    }

    /// Short name of the active strategy.
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Window(_) => "window",
            Self::Summary(_) => "summary",
            Self::Semantic(_) => "semantic",
        }
    }

    fn store(&self) -> &dyn MemoryStore {
        match self {
            Self::Window(memory) => memory,
            Self::Summary(memory) => memory,
            Self::Semantic(memory) => memory,
        }
    }

    fn store_mut(&mut self) -> &mut dyn MemoryStore {
        match self {
            Self::Window(memory) => memory,
            Self::Summary(memory) => memory,
            Self::Semantic(memory) => memory,
        }
    }
}

impl MemoryStore for AnyMemory {
    fn add_memory(&mut self, prompt: &str, response: Value) -> MemoryResult<()> {
        self.store_mut().add_memory(prompt, response)
    }

    fn get_memory(&self, options: &MemoryOptions) -> MemoryResult<String> {
        self.store().get_memory(options)
    }

    fn remove_memory(&mut self, prompt: &str) -> Option<ConversationRecord> {
        self.store_mut().remove_memory(prompt)
    }

    fn clear(&mut self) {
        self.store_mut().clear();
    }

    fn history(&self) -> &VecDeque<ConversationRecord> {
        self.store().history()
    }

    fn capacity(&self) -> NonZeroUsize {
        self.store().capacity()
    }

    fn model(&self) -> Option<&Arc<dyn LanguageModel>> {
        self.store().model()
    }
}

impl From<WindowMemory> for AnyMemory {
    fn from(memory: WindowMemory) -> Self {
        Self::Window(memory)
    }
}

impl From<SummaryMemory> for AnyMemory {
    fn from(memory: SummaryMemory) -> Self {
        Self::Summary(memory)
    }
}

impl From<SemanticMemory> for AnyMemory {
    fn from(memory: SemanticMemory) -> Self {
        Self::Semantic(memory)
    }
}
