//! Conversation memory for agents.
//!
//! A memory store records prompt/response exchanges in insertion order and
//! renders them back as text for inclusion in a model prompt. Every strategy
//! implements [`MemoryStore`]; [`AnyMemory`] selects one at runtime from a
//! [`MemoryConfig`].
//!
//! ```
//! use convo_memory::{MemoryOptions, MemoryStore, WindowMemory};
//!
//! let mut memory = WindowMemory::default();
//! memory.add_memory("hello", "hi there".into())?;
//! assert_eq!(memory.get_memory(&MemoryOptions::new())?, "Human: hello\nAI: hi there");
//! # Ok::<(), convo_memory::MemoryError>(())
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod builder;
pub mod embeddings;
mod error;
pub mod index;
pub mod model;
pub mod options;
pub mod record;
pub mod render;
pub mod semantic;
pub mod store;
pub mod summary;
pub mod window;

pub use builder::{AnyMemory, MemoryBuilder, MemoryConfig};
pub use embeddings::{Embedder, EmbeddingVector, HashingEmbedder};
pub use error::{MemoryError, MemoryResult};
pub use model::LanguageModel;
pub use options::MemoryOptions;
pub use record::ConversationRecord;
pub use render::RenderFormat;
pub use semantic::{SemanticMemory, SemanticOptions};
pub use store::MemoryStore;
pub use summary::{SummaryMemory, SummaryOptions};
pub use window::{WindowConfig, WindowMemory, WindowOptions, WindowStats};
