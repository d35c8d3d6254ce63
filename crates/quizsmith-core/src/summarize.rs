//! Sequential per-chunk summarization with graceful degradation.
//!
//! [`process_chunks`] drives a [`SummarizerSession`] over every chunk in
//! order. A chunk whose summarization fails does not abort the batch: it is
//! recorded as a fallback result carrying the truncated original text, and
//! processing moves on.
//!
//! The session is owned by the call. It is wrapped in a guard that invokes
//! [`SummarizerSession::release`] exactly once when the call finishes, on
//! every exit path, including a panic in the progress callback or the
//! future being dropped before completion.
//!
//! Chunks are processed one at a time because sessions hold serialized
//! state and are not safe to drive concurrently.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clean::truncate_chars;
use crate::models::{word_count, Chunk, SummaryResult};

/// What kind of summary to ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryKind {
    #[default]
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    Markdown,
    #[default]
    PlainText,
}

/// Options forwarded to the session for every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOptions {
    #[serde(default)]
    pub kind: SummaryKind,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub format: SummaryFormat,
    #[serde(default)]
    pub shared_context: Option<String>,
    /// Characters of original chunk text kept when summarization fails.
    #[serde(default = "default_fallback_chars")]
    pub fallback_chars: usize,
}

fn default_fallback_chars() -> usize {
    1000
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            kind: SummaryKind::default(),
            length: SummaryLength::default(),
            format: SummaryFormat::default(),
            shared_context: None,
            fallback_chars: default_fallback_chars(),
        }
    }
}

/// An exclusively owned summarization session.
///
/// `summarize` calls are strictly serialized by [`process_chunks`].
/// `release` frees whatever the session holds; it is called exactly once.
#[async_trait]
pub trait SummarizerSession: Send {
    async fn summarize(&mut self, text: &str, options: &SummarizeOptions) -> Result<String>;

    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Completed,
}

/// Emitted before (`Processing`) and after (`Completed`) each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based position of the chunk in the batch.
    pub current: usize,
    pub total: usize,
    pub chunk_id: usize,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SummaryResult>,
}

/// Releases the session when dropped.
struct SessionGuard {
    session: Box<dyn SummarizerSession>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.release();
    }
}

/// Summarize every chunk in order.
///
/// Always returns one [`SummaryResult`] per input chunk, in input order.
pub async fn process_chunks(
    session: Box<dyn SummarizerSession>,
    chunks: &[Chunk],
    options: &SummarizeOptions,
    on_progress: &mut dyn FnMut(ProgressEvent),
) -> Vec<SummaryResult> {
    let mut guard = SessionGuard { session };
    let total = chunks.len();
    let mut results = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        on_progress(ProgressEvent {
            current: i + 1,
            total,
            chunk_id: chunk.id,
            status: ProgressStatus::Processing,
            result: None,
        });

        let original_length = chunk.text.chars().count();
        let result = match guard.session.summarize(&chunk.text, options).await {
            Ok(summary) => SummaryResult {
                id: chunk.id,
                summary_length: summary.chars().count(),
                summary: Some(summary),
                original_length,
                error: None,
                fallback: false,
            },
            Err(e) => {
                tracing::warn!(chunk_id = chunk.id, error = %e, "chunk summarization failed, using truncated text");
                let fallback = truncate_chars(&chunk.text, options.fallback_chars);
                SummaryResult {
                    id: chunk.id,
                    summary_length: fallback.chars().count(),
                    summary: Some(fallback),
                    original_length,
                    error: Some(e.to_string()),
                    fallback: true,
                }
            }
        };

        on_progress(ProgressEvent {
            current: i + 1,
            total,
            chunk_id: chunk.id,
            status: ProgressStatus::Completed,
            result: Some(result.clone()),
        });
        results.push(result);
    }

    drop(guard);
    results
}

/// Aggregate numbers describing a batch of summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub chunks: usize,
    pub original_length: usize,
    pub summary_length: usize,
    /// `summary_length / original_length`, or 0 when nothing was summarized.
    pub compression_ratio: f64,
    pub fallbacks: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledSummary {
    pub text: String,
    pub word_count: usize,
    pub meta: SummaryMeta,
}

/// Join non-empty summaries with blank lines and compute compression stats.
///
/// Never fails; all-empty input yields empty text.
pub fn assemble_summaries(results: &[SummaryResult]) -> AssembledSummary {
    let text = results
        .iter()
        .filter_map(|r| r.summary.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let original_length: usize = results.iter().map(|r| r.original_length).sum();
    let summary_length: usize = results.iter().map(|r| r.summary_length).sum();
    let compression_ratio = if original_length == 0 {
        0.0
    } else {
        summary_length as f64 / original_length as f64
    };

    AssembledSummary {
        word_count: word_count(&text),
        meta: SummaryMeta {
            chunks: results.len(),
            original_length,
            summary_length,
            compression_ratio,
            fallbacks: results.iter().filter(|r| r.fallback).count(),
            errors: results.iter().filter(|r| r.error.is_some()).count(),
        },
        text,
    }
}
