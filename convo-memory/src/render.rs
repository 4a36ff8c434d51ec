//! Text rendering of stored conversation history.

use std::fmt::Write;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::MemoryResult;
use crate::record::ConversationRecord;

/// Output layout produced by `get_memory`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    /// Transcript lines of the form `Human: ...` / `AI: ...`.
    #[default]
    Plain,
    /// Pretty-printed JSON document with a `records` array.
    Structured,
}

#[derive(Serialize)]
struct StructuredHistory<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    records: Vec<&'a ConversationRecord>,
}

/// Keeps only the `limit` most recent records, preserving order.
pub(crate) fn most_recent<'a, I>(records: I, limit: Option<NonZeroUsize>) -> Vec<&'a ConversationRecord>
where
    I: IntoIterator<Item = &'a ConversationRecord>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let skip = limit.map_or(0, |limit| records.len().saturating_sub(limit.get()));
    records.skip(skip).collect()
}

/// Renders records, oldest first, optionally prefixed by a running summary.
pub(crate) fn render(
    records: &[&ConversationRecord],
    summary: Option<&str>,
    format: RenderFormat,
) -> MemoryResult<String> {
    match format {
        RenderFormat::Plain => Ok(render_plain(records, summary)),
        RenderFormat::Structured => {
            let history = StructuredHistory {
                summary,
                records: records.to_vec(),
            };
            Ok(serde_json::to_string_pretty(&history)?)
        }
    }
}

fn render_plain(records: &[&ConversationRecord], summary: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(summary) = summary.filter(|summary| !summary.trim().is_empty()) {
        let _ = writeln!(out, "Summary: {summary}");
    }
    for record in records {
        let _ = writeln!(out, "Human: {}", record.prompt());
        let _ = writeln!(out, "AI: {}", record.response_text());
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ConversationRecord> {
        vec![
            ConversationRecord::new("one", "first").unwrap(),
            ConversationRecord::new("two", "second").unwrap(),
            ConversationRecord::new("three", "third").unwrap(),
        ]
    }

    #[test]
    fn plain_transcript_keeps_order() {
        let records = records();
        let refs: Vec<_> = records.iter().collect();
        let text = render(&refs, None, RenderFormat::Plain).unwrap();
        assert_eq!(
            text,
            "Human: one\nAI: first\nHuman: two\nAI: second\nHuman: three\nAI: third"
        );
    }

    #[test]
    fn summary_leads_the_transcript() {
        let records = records();
        let refs = most_recent(&records, NonZeroUsize::new(1));
        let text = render(&refs, Some("talked about numbers"), RenderFormat::Plain).unwrap();
        assert_eq!(text, "Summary: talked about numbers\nHuman: three\nAI: third");
    }

    #[test]
    fn blank_summary_is_skipped() {
        let records = records();
        let refs = most_recent(&records, NonZeroUsize::new(1));
        let text = render(&refs, Some("  "), RenderFormat::Plain).unwrap();
        assert_eq!(text, "Human: three\nAI: third");
    }

    #[test]
    fn structured_output_is_json() {
        let records = records();
        let refs = most_recent(&records, NonZeroUsize::new(2));
        let text = render(&refs, None, RenderFormat::Structured).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(parsed.get("summary").is_none());
        assert_eq!(parsed["records"][0]["prompt"], "two");
        assert_eq!(parsed["records"][1]["response"], "third");
    }

    #[test]
    fn empty_history_renders_empty_text() {
        assert_eq!(render(&[], None, RenderFormat::Plain).unwrap(), "");
    }
}
