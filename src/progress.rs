//! Ingest and summarization progress reporting.
//!
//! Progress is emitted on **stderr** so stdout remains parseable for
//! scripts. The summarizer's per-chunk [`ProgressEvent`]s are forwarded
//! through the same reporter as the extraction step.

use quizsmith_core::summarize::{ProgressEvent, ProgressStatus};
use std::io::Write;

/// A single progress event for `qsmith ingest`.
#[derive(Clone, Debug)]
pub enum IngestProgressEvent {
    /// Source normalized and chunked.
    Extracted {
        source_type: String,
        chunks: usize,
        word_count: usize,
    },
    /// A chunk started or finished summarizing.
    Summarizing(ProgressEvent),
}

/// Reports ingest progress. Implementations write to stderr (human or JSON).
pub trait IngestProgressReporter: Send + Sync {
    fn report(&self, event: &IngestProgressEvent);
}

/// Human-friendly progress on stderr: "summarize  chunk 2 / 5  done".
pub struct StderrProgress;

impl IngestProgressReporter for StderrProgress {
    fn report(&self, event: &IngestProgressEvent) {
        let line = human_line(event);
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

fn human_line(event: &IngestProgressEvent) -> String {
    match event {
        IngestProgressEvent::Extracted {
            source_type,
            chunks,
            word_count,
        } => format!(
            "ingest {}  {} words  {} chunks\n",
            source_type, word_count, chunks
        ),
        IngestProgressEvent::Summarizing(e) => {
            let state = match (&e.status, &e.result) {
                (ProgressStatus::Processing, _) => "summarizing...",
                (ProgressStatus::Completed, Some(r)) if r.fallback => "fallback",
                (ProgressStatus::Completed, _) => "done",
            };
            format!("summarize  chunk {} / {}  {}\n", e.current, e.total, state)
        }
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IngestProgressReporter for JsonProgress {
    fn report(&self, event: &IngestProgressEvent) {
        let obj = match event {
            IngestProgressEvent::Extracted {
                source_type,
                chunks,
                word_count,
            } => serde_json::json!({
                "event": "progress",
                "phase": "extracted",
                "sourceType": source_type,
                "chunks": chunks,
                "wordCount": word_count
            }),
            IngestProgressEvent::Summarizing(e) => serde_json::json!({
                "event": "progress",
                "phase": "summarizing",
                "current": e.current,
                "total": e.total,
                "chunkId": e.chunk_id,
                "status": e.status,
                "fallback": e.result.as_ref().map(|r| r.fallback)
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _event: &IngestProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IngestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizsmith_core::models::SummaryResult;

    fn chunk_event(status: ProgressStatus, fallback: Option<bool>) -> IngestProgressEvent {
        IngestProgressEvent::Summarizing(ProgressEvent {
            current: 2,
            total: 5,
            chunk_id: 1,
            status,
            result: fallback.map(|fallback| SummaryResult {
                id: 1,
                summary: None,
                original_length: 10,
                summary_length: 10,
                error: None,
                fallback,
            }),
        })
    }

    #[test]
    fn human_line_maps_chunk_states() {
        assert_eq!(
            human_line(&chunk_event(ProgressStatus::Processing, None)),
            "summarize  chunk 2 / 5  summarizing...\n"
        );
        assert_eq!(
            human_line(&chunk_event(ProgressStatus::Completed, Some(false))),
            "summarize  chunk 2 / 5  done\n"
        );
        assert_eq!(
            human_line(&chunk_event(ProgressStatus::Completed, Some(true))),
            "summarize  chunk 2 / 5  fallback\n"
        );
    }

    #[test]
    fn human_line_for_extraction() {
        let event = IngestProgressEvent::Extracted {
            source_type: "pdf".into(),
            chunks: 3,
            word_count: 812,
        };
        assert_eq!(human_line(&event), "ingest pdf  812 words  3 chunks\n");
    }
}
