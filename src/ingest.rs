//! Ingestion orchestration.
//!
//! Coordinates the `qsmith ingest` flow: read or fetch the source →
//! normalize (clean, excerpt, chunk) → optionally summarize chunk by chunk →
//! print one JSON document on stdout.

use anyhow::{bail, Context, Result};
use quizsmith_core::models::{ExtractedSource, SummaryResult};
use quizsmith_core::source::{self, ManualInput, PageInput, SelectionInput};
use quizsmith_core::summarize::{assemble_summaries, process_chunks, AssembledSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::extract;
use crate::llm::{ChatClient, ChatSummarizer};
use crate::progress::{IngestProgressEvent, IngestProgressReporter, ProgressMode};
use crate::readability::ScraperReadability;

/// Where the content comes from.
#[derive(Debug, Clone)]
pub enum IngestSource {
    Page {
        path: PathBuf,
        url: String,
        title: Option<String>,
    },
    Url {
        url: String,
    },
    Selection {
        path: PathBuf,
        url: String,
        title: Option<String>,
    },
    Pdf {
        path: PathBuf,
    },
    Manual {
        topic: String,
        context: Option<String>,
    },
}

/// What `qsmith ingest` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutput {
    pub source: ExtractedSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AssembledSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunk_summaries: Vec<SummaryResult>,
}

pub async fn run_ingest(
    config: &Config,
    input: IngestSource,
    summarize: bool,
    progress: ProgressMode,
) -> Result<()> {
    // Build the client before any extraction so a missing [llm] fails fast.
    let client = if summarize {
        Some(ChatClient::from_config(&config.llm)?)
    } else {
        None
    };
    let reporter = progress.reporter();

    let source = normalize(config, &input).await?;
    if source.is_empty() {
        bail!(
            "No readable text found in {} source{}",
            source.source_type,
            if source.url.is_empty() {
                String::new()
            } else {
                format!(" ({})", source.url)
            }
        );
    }
    reporter.report(&IngestProgressEvent::Extracted {
        source_type: source.source_type.to_string(),
        chunks: source.chunks.len(),
        word_count: source.word_count,
    });
    tracing::info!(
        source_type = %source.source_type,
        words = source.word_count,
        chunks = source.chunks.len(),
        "source normalized"
    );

    let mut output = IngestOutput {
        source,
        summary: None,
        chunk_summaries: Vec::new(),
    };

    if let Some(client) = client {
        let results = summarize_chunks(config, client, &output.source, reporter.as_ref()).await;
        let assembled = assemble_summaries(&results);
        tracing::info!(
            chunks = assembled.meta.chunks,
            fallbacks = assembled.meta.fallbacks,
            ratio = assembled.meta.compression_ratio,
            "summaries assembled"
        );
        output.summary = Some(assembled);
        output.chunk_summaries = results;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Read, fetch, or extract the input and run it through the normalizer.
pub async fn normalize(config: &Config, input: &IngestSource) -> Result<ExtractedSource> {
    let options = config.normalize_options();
    let source = match input {
        IngestSource::Page { path, url, title } => {
            let html = read_text(path)?;
            let page = PageInput {
                html,
                title: title.clone().unwrap_or_default(),
                url: url.clone(),
            };
            source::from_page(&page, &ScraperReadability, &options).await
        }
        IngestSource::Url { url } => {
            let page = extract::fetch_page(url, config.source.fetch_timeout_secs).await?;
            source::from_url(&page, &ScraperReadability, &options).await
        }
        IngestSource::Selection { path, url, title } => {
            let selection = SelectionInput {
                text: read_text(path)?,
                title: title.clone().unwrap_or_default(),
                url: url.clone(),
            };
            source::from_selection(&selection, &options)
        }
        IngestSource::Pdf { path } => {
            let pdf = extract::read_pdf(path)?;
            source::from_pdf(&pdf, &options)
        }
        IngestSource::Manual { topic, context } => {
            if topic.trim().is_empty() {
                bail!("--topic must not be empty");
            }
            let manual = ManualInput {
                topic: topic.clone(),
                context: context.clone().unwrap_or_default(),
            };
            source::from_manual(&manual, &options)
        }
    };
    Ok(source)
}

async fn summarize_chunks(
    config: &Config,
    client: ChatClient,
    source: &ExtractedSource,
    reporter: &dyn IngestProgressReporter,
) -> Vec<SummaryResult> {
    let mut options = config.summarize_options();
    if options.shared_context.is_none() && !source.title.is_empty() {
        options.shared_context = Some(format!("Source: {}", source.title));
    }
    let session = Box::new(ChatSummarizer::new(client));
    process_chunks(session, &source.chunks, &options, &mut |event| {
        reporter.report(&IngestProgressEvent::Summarizing(event))
    })
    .await
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
