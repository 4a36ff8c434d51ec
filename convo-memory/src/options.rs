//! Key/value options accepted by `get_memory`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{MemoryError, MemoryResult};

/// Loosely typed option map passed to [`MemoryStore::get_memory`](crate::MemoryStore::get_memory).
///
/// Each strategy decodes the map into its own typed option set and rejects
/// keys it does not recognize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryOptions {
    values: Map<String, Value>,
}

impl MemoryOptions {
    /// Creates an empty option map, selecting every strategy default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing any previous value under the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Decodes the map into a strategy's typed option set.
    pub(crate) fn parse<T: DeserializeOwned>(&self) -> MemoryResult<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|err| MemoryError::invalid_configuration(err.to_string()))
    }
}

impl From<Map<String, Value>> for MemoryOptions {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MemoryOptions {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct Sample {
        max_records: Option<NonZeroUsize>,
    }

    #[test]
    fn decodes_known_keys() {
        let sample: Sample = MemoryOptions::new().with("max_records", 2).parse().unwrap();
        assert_eq!(sample.max_records, NonZeroUsize::new(2));

        let sample: Sample = MemoryOptions::new().parse().unwrap();
        assert!(sample.max_records.is_none());
    }

    #[test]
    fn rejects_unknown_and_out_of_range() {
        let err = MemoryOptions::new()
            .with("colour", "blue")
            .parse::<Sample>()
            .expect_err("unknown key should fail");
        assert!(matches!(err, MemoryError::InvalidConfiguration(_)));

        for bad in [json!(0), json!(-3), json!("ten")] {
            let err = MemoryOptions::new()
                .with("max_records", bad)
                .parse::<Sample>()
                .expect_err("bad max_records should fail");
            assert!(matches!(err, MemoryError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn collects_from_pairs() {
        let options: MemoryOptions = [("max_records", json!(4))].into_iter().collect();
        let sample: Sample = options.parse().unwrap();
        assert_eq!(sample.max_records, NonZeroUsize::new(4));
    }
}
