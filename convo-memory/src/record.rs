//! Conversation record shared by every memory strategy.

use serde::Serialize;
use serde_json::Value;

use crate::{MemoryError, MemoryResult};

/// One prompt/response exchange captured by a memory store.
///
/// Records are immutable once built and compare structurally; two records
/// with the same prompt and response are equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    prompt: String,
    response: Value,
}

impl ConversationRecord {
    /// Creates a record after validating the prompt.
    ///
    /// The response is an opaque model output and is stored as supplied.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidRecord`] when the prompt is empty or
    /// whitespace.
    pub fn new(prompt: impl Into<String>, response: impl Into<Value>) -> MemoryResult<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(MemoryError::InvalidRecord(
                "conversation prompt must not be empty",
            ));
        }
        Ok(Self {
            prompt,
            response: response.into(),
        })
    }

    /// Returns the prompt that opened the exchange.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the raw model response.
    #[must_use]
    pub fn response(&self) -> &Value {
        &self.response
    }

    /// Returns the response as display text.
    ///
    /// String responses are returned verbatim; any other JSON value is
    /// rendered in its compact JSON form.
    #[must_use]
    pub fn response_text(&self) -> String {
        value_text(&self.response)
    }

    /// Approximate footprint of the record in bytes.
    pub(crate) fn size_bytes(&self) -> usize {
        self.prompt.len() + self.response_text().len()
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_blank_prompts() {
        let err = ConversationRecord::new("", "reply").expect_err("empty prompt should fail");
        assert!(matches!(err, MemoryError::InvalidRecord(_)));

        let err = ConversationRecord::new("  \n", "reply").expect_err("blank prompt should fail");
        assert!(matches!(err, MemoryError::InvalidRecord(_)));
    }

    #[test]
    fn renders_response_text() {
        let text = ConversationRecord::new("hello", "hi there").unwrap();
        assert_eq!(text.response_text(), "hi there");

        let structured = ConversationRecord::new("weather?", json!({"temp": 21})).unwrap();
        assert_eq!(structured.response_text(), r#"{"temp":21}"#);
        assert_eq!(structured.size_bytes(), "weather?".len() + 11);
    }

    #[test]
    fn equality_is_structural() {
        let lhs = ConversationRecord::new("a", "b").unwrap();
        let rhs = ConversationRecord::new("a", "b").unwrap();
        assert_eq!(lhs, rhs);
        assert_ne!(lhs, ConversationRecord::new("a", "c").unwrap());
    }
}
