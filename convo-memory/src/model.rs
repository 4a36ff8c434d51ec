//! Language model capability consumed by summarizing strategies.

use serde_json::Value;

use crate::MemoryResult;

/// Opaque prompt-to-response capability.
///
/// Implementations own their own blocking, timeout, and retry behaviour; the
/// memory stores call [`predict`](LanguageModel::predict) once per operation
/// and surface any error unchanged.
pub trait LanguageModel: Send + Sync {
    /// Produces a response for the supplied prompt.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Model`](crate::MemoryError::Model) (or any other
    /// variant the implementation chooses) when the model cannot answer.
    fn predict(&self, prompt: &str) -> MemoryResult<Value>;
}

impl<F> LanguageModel for F
where
    F: Fn(&str) -> MemoryResult<Value> + Send + Sync,
{
    fn predict(&self, prompt: &str) -> MemoryResult<Value> {
        self(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;

    #[test]
    fn closures_act_as_models() {
        let model = |prompt: &str| -> MemoryResult<Value> { Ok(Value::from(prompt.to_uppercase())) };
        assert_eq!(model.predict("hi").unwrap(), "HI");

        let failing = |_: &str| -> MemoryResult<Value> { Err(MemoryError::model("offline")) };
        let err = failing.predict("hi").expect_err("model should fail");
        assert!(matches!(err, MemoryError::Model { .. }));
    }
}
