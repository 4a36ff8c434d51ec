//! The capability set shared by every memory strategy.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde_json::Value;

use crate::MemoryResult;
use crate::model::LanguageModel;
use crate::options::MemoryOptions;
use crate::record::ConversationRecord;

/// Ordered conversation memory with a strategy-owned retention policy.
///
/// Stores are owned by a single conversation session. Mutating operations
/// take `&mut self` and no store performs internal locking; callers sharing
/// a store across threads wrap it in their own mutex.
///
/// Removing a prompt that was never stored is a no-op returning `None` for
/// every strategy in this crate.
pub trait MemoryStore {
    /// Appends a new exchange, applying the strategy's capacity policy.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidRecord`](crate::MemoryError::InvalidRecord)
    /// for an empty prompt, or the error of any capability consulted while
    /// adding. A failed add leaves the store unchanged.
    fn add_memory(&mut self, prompt: &str, response: Value) -> MemoryResult<()>;

    /// Renders the retained history into text suitable for a model prompt.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidConfiguration`](crate::MemoryError::InvalidConfiguration)
    /// when `options` holds an unrecognized key or an out-of-range value.
    fn get_memory(&self, options: &MemoryOptions) -> MemoryResult<String>;

    /// Removes the oldest record whose prompt equals `prompt`.
    fn remove_memory(&mut self, prompt: &str) -> Option<ConversationRecord>;

    /// Drops every record and any state derived from them.
    fn clear(&mut self);

    /// Retained records, oldest first.
    fn history(&self) -> &VecDeque<ConversationRecord>;

    /// Configured capacity threshold.
    fn capacity(&self) -> NonZeroUsize;

    /// Language model consulted by the strategy, if any.
    fn model(&self) -> Option<&Arc<dyn LanguageModel>> {
        None
    }

    /// Prompts of every retained record, in history order.
    fn memory_prompts(&self) -> Vec<&str> {
        self.history().iter().map(ConversationRecord::prompt).collect()
    }

    /// Number of retained records.
    fn len(&self) -> usize {
        self.history().len()
    }

    /// Returns whether no record is retained.
    fn is_empty(&self) -> bool {
        self.history().is_empty()
    }
}

/// Removes the first record matching `prompt`, returning its former position.
pub(crate) fn remove_first(
    records: &mut VecDeque<ConversationRecord>,
    prompt: &str,
) -> Option<(usize, ConversationRecord)> {
    let position = records.iter().position(|record| record.prompt() == prompt)?;
    records.remove(position).map(|record| (position, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_first_takes_oldest_match() {
        let mut records: VecDeque<_> = [("a", "1"), ("b", "2"), ("a", "3")]
            .into_iter()
            .map(|(prompt, response)| ConversationRecord::new(prompt, response).unwrap())
            .collect();

        let (position, removed) = remove_first(&mut records, "a").unwrap();
        assert_eq!(position, 0);
        assert_eq!(removed.response_text(), "1");
        assert_eq!(records.len(), 2);

        assert!(remove_first(&mut records, "missing").is_none());
        assert_eq!(records.len(), 2);
    }
}
