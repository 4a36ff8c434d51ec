//! Summarizing memory that folds evicted exchanges into a running summary.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::MemoryResult;
use crate::model::LanguageModel;
use crate::options::MemoryOptions;
use crate::record::{self, ConversationRecord};
use crate::render::{self, RenderFormat};
use crate::store::{self, MemoryStore};

const SUMMARY_INSTRUCTIONS: &str = "Progressively summarize the lines of conversation provided, \
adding onto the previous summary and returning a new summary.";

/// Options recognized by [`SummaryMemory::get_memory`](MemoryStore::get_memory).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryOptions {
    /// Render only the most recent retained records.
    pub max_records: Option<NonZeroUsize>,
    /// Output layout.
    pub format: RenderFormat,
    /// Prefix the rendering with the running summary, when one exists.
    pub include_summary: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_records: None,
            format: RenderFormat::Plain,
            include_summary: true,
        }
    }
}

/// Memory keeping `capacity` recent exchanges verbatim and a model-written
/// summary of everything older.
///
/// Adding past capacity calls the language model once. If that call fails the
/// error is returned and neither the records nor the summary change.
pub struct SummaryMemory {
    capacity: NonZeroUsize,
    model: Arc<dyn LanguageModel>,
    entries: VecDeque<ConversationRecord>,
    summary: Option<String>,
}

impl SummaryMemory {
    /// Creates an empty summarizing memory.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            model,
            entries: VecDeque::with_capacity(capacity.get()),
            summary: None,
        }
    }

    /// Returns the running summary of evicted exchanges.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Asks the model for a new summary; `None` when the reply is blank.
    fn condense(&self, folded: &[&ConversationRecord]) -> MemoryResult<Option<String>> {
        let transcript = render::render(folded, None, RenderFormat::Plain)?;
        let prompt = format!(
            "{SUMMARY_INSTRUCTIONS}\n\nCurrent summary:\n{}\n\nNew lines of conversation:\n{transcript}\n\nNew summary:",
            self.summary.as_deref().unwrap_or_default(),
        );
        match self.model.predict(&prompt) {
            Ok(response) => {
                let summary = record::value_text(&response).trim().to_owned();
                Ok((!summary.is_empty()).then_some(summary))
            }
            Err(err) => {
                warn!(?err, folded = folded.len(), "summarization failed");
                Err(err)
            }
        }
    }
}

impl fmt::Debug for SummaryMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryMemory")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl MemoryStore for SummaryMemory {
    fn add_memory(&mut self, prompt: &str, response: Value) -> MemoryResult<()> {
        let record = ConversationRecord::new(prompt, response)?;

        let overflow = (self.entries.len() + 1).saturating_sub(self.capacity.get());
        if overflow > 0 {
            let folded: Vec<&ConversationRecord> = self.entries.iter().take(overflow).collect();
            let summary = self.condense(&folded)?;
            self.entries.drain(..overflow);
            match summary {
                Some(summary) => {
                    self.summary = Some(summary);
                    debug!(folded = overflow, "folded records into running summary");
                }
                None => warn!(folded = overflow, "model returned a blank summary; keeping the previous one"),
            }
        }

        self.entries.push_back(record);
        Ok(())
    }

    fn get_memory(&self, options: &MemoryOptions) -> MemoryResult<String> {
        let options: SummaryOptions = options.parse()?;
        let records = render::most_recent(&self.entries, options.max_records);
        let summary = self.summary.as_deref().filter(|_| options.include_summary);
        render::render(&records, summary, options.format)
    }

    fn remove_memory(&mut self, prompt: &str) -> Option<ConversationRecord> {
        let removed = store::remove_first(&mut self.entries, prompt);
        debug!(prompt, removed = removed.is_some(), "remove from summary memory");
        removed.map(|(_, record)| record)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.summary = None;
        debug!("cleared summary memory");
    }

    fn history(&self) -> &VecDeque<ConversationRecord> {
        &self.entries
    }

    fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    fn model(&self) -> Option<&Arc<dyn LanguageModel>> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::MemoryError;

    /// Answers with a summary listing every `Human:` line it was shown.
    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl LanguageModel for RecordingModel {
        fn predict(&self, prompt: &str) -> MemoryResult<Value> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MemoryError::model("quota exhausted"));
            }
            self.prompts.lock().unwrap().push(prompt.to_owned());
            let topics: Vec<&str> = prompt
                .lines()
                .filter_map(|line| line.strip_prefix("Human: "))
                .collect();
            Ok(Value::from(format!("discussed {}", topics.join(", "))))
        }
    }

    fn memory(capacity: usize) -> (Arc<RecordingModel>, SummaryMemory) {
        let model = Arc::new(RecordingModel::default());
        let memory = SummaryMemory::new(model.clone(), NonZeroUsize::new(capacity).unwrap());
        (model, memory)
    }

    #[test]
    fn folds_evicted_records_into_summary() {
        let (model, mut memory) = memory(2);
        for prompt in ["rust", "tokio", "serde"] {
            memory.add_memory(prompt, "noted".into()).unwrap();
        }

        assert_eq!(memory.memory_prompts(), ["tokio", "serde"]);
        assert_eq!(memory.summary(), Some("discussed rust"));
        assert_eq!(model.prompts.lock().unwrap().len(), 1);

        memory.add_memory("axum", "noted".into()).unwrap();
        assert_eq!(memory.summary(), Some("discussed tokio"));
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].contains("Current summary:\ndiscussed rust"));
    }

    #[test]
    fn renders_summary_before_records() {
        let (_, mut memory) = memory(1);
        memory.add_memory("hello", "hi there".into()).unwrap();
        memory.add_memory("how are you", "fine".into()).unwrap();

        let text = memory.get_memory(&MemoryOptions::new()).unwrap();
        assert_eq!(text, "Summary: discussed hello\nHuman: how are you\nAI: fine");

        let text = memory
            .get_memory(&MemoryOptions::new().with("include_summary", false))
            .unwrap();
        assert_eq!(text, "Human: how are you\nAI: fine");
    }

    #[test]
    fn model_failure_leaves_store_unchanged() {
        let (model, mut memory) = memory(1);
        memory.add_memory("first", "one".into()).unwrap();
        model.fail.store(true, Ordering::SeqCst);

        let err = memory
            .add_memory("second", "two".into())
            .expect_err("model failure should propagate");
        assert!(matches!(err, MemoryError::Model { .. }));
        assert_eq!(memory.memory_prompts(), ["first"]);
        assert!(memory.summary().is_none());
    }

    #[test]
    fn blank_summary_keeps_previous_one() {
        let replies = Mutex::new(vec!["   ", "chatted about a"]);
        let model = move |_: &str| -> MemoryResult<Value> {
            Ok(Value::from(replies.lock().unwrap().pop().unwrap_or_default()))
        };
        let mut memory = SummaryMemory::new(Arc::new(model), NonZeroUsize::MIN);
        for prompt in ["a", "b", "c"] {
            memory.add_memory(prompt, "ok".into()).unwrap();
        }

        assert_eq!(memory.summary(), Some("chatted about a"));
        assert_eq!(memory.memory_prompts(), ["c"]);
    }

    #[test]
    fn blank_first_summary_renders_no_summary_line() {
        let model = |_: &str| -> MemoryResult<Value> { Ok(Value::from("\n ")) };
        let mut memory = SummaryMemory::new(Arc::new(model), NonZeroUsize::MIN);
        memory.add_memory("a", "1".into()).unwrap();
        memory.add_memory("b", "2".into()).unwrap();

        assert!(memory.summary().is_none());
        assert_eq!(
            memory.get_memory(&MemoryOptions::new()).unwrap(),
            "Human: b\nAI: 2"
        );
    }

    #[test]
    fn clear_drops_summary() {
        let (_, mut memory) = memory(1);
        memory.add_memory("a", "1".into()).unwrap();
        memory.add_memory("b", "2".into()).unwrap();
        assert!(memory.summary().is_some());

        memory.clear();
        memory.clear();
        assert!(memory.is_empty());
        assert!(memory.summary().is_none());
        assert_eq!(memory.get_memory(&MemoryOptions::new()).unwrap(), "");
    }

    #[test]
    fn exposes_its_model() {
        let (_, memory) = memory(1);
        assert!(memory.model().is_some());
        let err = memory
            .get_memory(&MemoryOptions::new().with("include_summary", "yes"))
            .expect_err("wrong option type");
        assert!(matches!(err, MemoryError::InvalidConfiguration(_)));
    }
}
