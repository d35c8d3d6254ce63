//! Core data models shared by the ingestion and repair pipeline.
//!
//! These types cross the boundary to the extension UI as JSON, so every
//! record serializes with camelCase field names (`sourceType`, `wordCount`,
//! `tokenEstimate`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of content an [`ExtractedSource`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// The active tab's page HTML.
    Page,
    /// Text the user highlighted.
    Selection,
    /// Text layer of a PDF document.
    Pdf,
    /// A topic typed by the user, with optional free-text context.
    Manual,
    /// A page fetched by URL rather than read from an open tab.
    Url,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Page => "page",
            SourceType::Selection => "selection",
            SourceType::Pdf => "pdf",
            SourceType::Manual => "manual",
            SourceType::Url => "url",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical representation of any ingestion source.
///
/// Built once by [`finalize_source`](crate::source::finalize_source) and
/// never mutated afterwards. `text` is always the output of
/// [`clean`](crate::clean::clean); `word_count` and `excerpt` are derived
/// from it in the same call, so they cannot go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSource {
    pub source_type: SourceType,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub text: String,
    pub excerpt: String,
    pub word_count: usize,
    pub chunks: Vec<Chunk>,
    pub meta: Map<String, Value>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedSource {
    /// True when cleaning left no text. Callers treat this as an
    /// extraction failure; the normalizer itself never errors.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A bounded slice of canonical text.
///
/// `start` and `end` are half-open character offsets (not byte offsets)
/// into the cleaned source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub token_estimate: usize,
}

/// Outcome of summarizing a single chunk.
///
/// `fallback == true` means summarization failed and `summary` holds the
/// truncated original chunk text instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub id: usize,
    pub summary: Option<String>,
    pub original_length: usize,
    pub summary_length: usize,
    pub error: Option<String>,
    pub fallback: bool,
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_serializes_lowercase() {
        let json = serde_json::to_string(&SourceType::Pdf).unwrap();
        assert_eq!(json, "\"pdf\"");
        let back: SourceType = serde_json::from_str("\"url\"").unwrap();
        assert_eq!(back, SourceType::Url);
    }

    #[test]
    fn chunk_uses_camel_case_on_the_wire() {
        let chunk = Chunk {
            id: 0,
            text: "hi".into(),
            start: 0,
            end: 2,
            token_estimate: 1,
        };
        let v = serde_json::to_value(&chunk).unwrap();
        assert_eq!(v["tokenEstimate"], 1);
    }

    #[test]
    fn word_count_ignores_whitespace_runs() {
        assert_eq!(word_count("  one\n\ntwo   three "), 3);
        assert_eq!(word_count(""), 0);
    }
}
