//! Source normalization.
//!
//! One constructor per source kind, all converging on [`finalize_source`],
//! which is the only place text gets cleaned, measured, and chunked.
//!
//! ```text
//! PageInput ──▶ ReadabilityExtractor ──┐ (or body text fallback)
//! SelectionInput ──────────────────────┤
//! PdfInput ────────────────────────────┼──▶ finalize_source ──▶ ExtractedSource
//! ManualInput ─────────────────────────┘
//! ```
//!
//! Normalization never fails. When cleaning leaves nothing, the returned
//! source has empty `text` and `chunks`, and it is up to the caller to
//! report an extraction error (see [`ExtractedSource::is_empty`]).

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chunk::{chunk_text, ChunkOptions};
use crate::clean::{clean, excerpt};
use crate::html;
use crate::models::{word_count, ExtractedSource, SourceType};

/// Title used when neither the extractor nor the document provide one.
pub const UNTITLED: &str = "Untitled";

/// Knobs shared by every source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub chunking: ChunkOptions,
    pub excerpt_chars: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkOptions::default(),
            excerpt_chars: 300,
        }
    }
}

/// Raw page content as delivered by the tab content script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInput {
    pub html: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Highlighted text from the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionInput {
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Text already extracted from a PDF's text layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInput {
    pub text: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub page_count: usize,
}

/// A typed topic with optional context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualInput {
    pub topic: String,
    #[serde(default)]
    pub context: String,
}

/// Main-content article found by a readability extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: Option<String>,
    pub text: Option<String>,
    pub byline: Option<String>,
    pub site_name: Option<String>,
}

/// Readability-style main-content extraction.
///
/// Implementations live outside the core (the app crate ships a
/// `scraper`-based one). Returning `Ok(None)`, an article without text, or
/// an error all make [`from_page`] fall back to plain body text.
#[async_trait]
pub trait ReadabilityExtractor: Send + Sync {
    async fn extract(&self, html: &str, url: &str) -> Result<Option<Article>>;
}

/// Normalize an open tab's page.
pub async fn from_page(
    input: &PageInput,
    extractor: &dyn ReadabilityExtractor,
    options: &NormalizeOptions,
) -> ExtractedSource {
    normalize_html(SourceType::Page, input, extractor, options).await
}

/// Normalize a page fetched by URL. Same pipeline as [`from_page`].
pub async fn from_url(
    input: &PageInput,
    extractor: &dyn ReadabilityExtractor,
    options: &NormalizeOptions,
) -> ExtractedSource {
    normalize_html(SourceType::Url, input, extractor, options).await
}

async fn normalize_html(
    source_type: SourceType,
    input: &PageInput,
    extractor: &dyn ReadabilityExtractor,
    options: &NormalizeOptions,
) -> ExtractedSource {
    let article = match extractor.extract(&input.html, &input.url).await {
        Ok(article) => article,
        Err(e) => {
            tracing::warn!(url = %input.url, error = %e, "readability extraction failed");
            None
        }
    };

    let mut meta = Map::new();
    let readable_text = article
        .as_ref()
        .and_then(|a| a.text.as_deref())
        .filter(|t| !t.trim().is_empty());

    let raw_text = match readable_text {
        Some(text) => {
            meta.insert("extraction".into(), Value::from("readability"));
            text.to_string()
        }
        None => {
            tracing::debug!(url = %input.url, "falling back to body text extraction");
            meta.insert("extraction".into(), Value::from("body"));
            html::body_text(&input.html)
        }
    };

    if let Some(a) = &article {
        if let Some(byline) = non_blank(a.byline.as_deref()) {
            meta.insert("byline".into(), Value::from(byline));
        }
        if let Some(site) = non_blank(a.site_name.as_deref()) {
            meta.insert("siteName".into(), Value::from(site));
        }
    }

    let title = article
        .as_ref()
        .and_then(|a| non_blank(a.title.as_deref()))
        .map(str::to_string)
        .or_else(|| non_blank(Some(input.title.as_str())).map(str::to_string))
        .or_else(|| html::document_title(&input.html))
        .unwrap_or_else(|| UNTITLED.to_string());

    finalize_source(source_type, &title, &input.url, &raw_text, meta, options)
}

/// Normalize highlighted text.
pub fn from_selection(input: &SelectionInput, options: &NormalizeOptions) -> ExtractedSource {
    let title = non_blank(Some(input.title.as_str())).unwrap_or(UNTITLED);
    finalize_source(
        SourceType::Selection,
        title,
        &input.url,
        &input.text,
        Map::new(),
        options,
    )
}

/// Normalize PDF text. The joined page text is treated like any other raw text.
pub fn from_pdf(input: &PdfInput, options: &NormalizeOptions) -> ExtractedSource {
    let mut meta = Map::new();
    meta.insert("pageCount".into(), Value::from(input.page_count));
    meta.insert("fileName".into(), Value::from(input.file_name.clone()));
    let title = non_blank(Some(input.file_name.as_str())).unwrap_or(UNTITLED);
    finalize_source(SourceType::Pdf, title, "", &input.text, meta, options)
}

/// Join per-page PDF text with paragraph breaks.
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n\n")
}

/// Normalize a typed topic. An empty context makes the topic itself the body,
/// so a topic-only entry still yields text.
pub fn from_manual(input: &ManualInput, options: &NormalizeOptions) -> ExtractedSource {
    let body = if input.context.trim().is_empty() {
        input.topic.as_str()
    } else {
        input.context.as_str()
    };
    let mut meta = Map::new();
    meta.insert("topic".into(), Value::from(input.topic.trim()));
    let title = non_blank(Some(input.topic.as_str())).unwrap_or(UNTITLED);
    finalize_source(SourceType::Manual, title, "", body, meta, options)
}

/// Build the canonical record: clean, derive excerpt and word count, chunk.
pub fn finalize_source(
    source_type: SourceType,
    title: &str,
    url: &str,
    raw_text: &str,
    meta: Map<String, Value>,
    options: &NormalizeOptions,
) -> ExtractedSource {
    let text = clean(raw_text);
    let chunks = chunk_text(&text, &options.chunking);

    tracing::debug!(
        source_type = %source_type,
        chars = text.chars().count(),
        chunks = chunks.len(),
        "source finalized"
    );

    ExtractedSource {
        source_type,
        title: title.trim().to_string(),
        url: url.trim().to_string(),
        domain: domain_of(url),
        excerpt: excerpt(&text, options.excerpt_chars),
        word_count: word_count(&text),
        chunks,
        text,
        meta,
        extracted_at: Utc::now(),
    }
}

/// Host of `url` without a leading `www.`; empty when unparsable.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor(Option<Article>);

    #[async_trait]
    impl ReadabilityExtractor for FixedExtractor {
        async fn extract(&self, _html: &str, _url: &str) -> Result<Option<Article>> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl ReadabilityExtractor for FailingExtractor {
        async fn extract(&self, _html: &str, _url: &str) -> Result<Option<Article>> {
            anyhow::bail!("parser blew up")
        }
    }

    const HTML: &str = "<html><head><title>Doc Title</title></head>\
        <body><nav>Menu</nav><p>Body   text here.</p></body></html>";

    fn page(title: &str) -> PageInput {
        PageInput {
            html: HTML.to_string(),
            title: title.to_string(),
            url: "https://www.example.com/a/b".to_string(),
        }
    }

    #[tokio::test]
    async fn page_prefers_readability_text_and_title() {
        let extractor = FixedExtractor(Some(Article {
            title: Some("Article Title".into()),
            text: Some("Readable   content.\n\n\nMore.".into()),
            byline: Some("Ada".into()),
            site_name: None,
        }));
        let src = from_page(&page("Tab Title"), &extractor, &NormalizeOptions::default()).await;
        assert_eq!(src.source_type, SourceType::Page);
        assert_eq!(src.title, "Article Title");
        assert_eq!(src.text, "Readable content.\n\nMore.");
        assert_eq!(src.domain, "example.com");
        assert_eq!(src.meta["extraction"], "readability");
        assert_eq!(src.meta["byline"], "Ada");
        assert!(src.meta.get("siteName").is_none());
        assert_eq!(src.word_count, 3);
        assert_eq!(src.chunks.len(), 1);
    }

    #[tokio::test]
    async fn page_falls_back_to_body_text_when_extractor_is_empty() {
        let extractor = FixedExtractor(Some(Article {
            title: None,
            text: Some("   ".into()),
            ..Article::default()
        }));
        let src = from_page(&page("Tab Title"), &extractor, &NormalizeOptions::default()).await;
        assert_eq!(src.meta["extraction"], "body");
        assert_eq!(src.text, "Menu\n\nBody text here.");
        assert_eq!(src.title, "Tab Title");
    }

    #[tokio::test]
    async fn page_title_falls_back_to_document_then_untitled() {
        let src = from_page(&page(""), &FailingExtractor, &NormalizeOptions::default()).await;
        assert_eq!(src.title, "Doc Title");

        let input = PageInput {
            html: "<p>only body</p>".into(),
            ..PageInput::default()
        };
        let src = from_url(&input, &FixedExtractor(None), &NormalizeOptions::default()).await;
        assert_eq!(src.source_type, SourceType::Url);
        assert_eq!(src.title, UNTITLED);
        assert_eq!(src.domain, "");
        assert_eq!(src.text, "only body");
    }

    #[test]
    fn manual_with_empty_context_uses_topic_as_body() {
        let src = from_manual(
            &ManualInput {
                topic: "Photosynthesis".into(),
                context: "  \n ".into(),
            },
            &NormalizeOptions::default(),
        );
        assert_eq!(src.text, "Photosynthesis");
        assert_eq!(src.title, "Photosynthesis");
        assert!(!src.chunks.is_empty());
    }

    #[test]
    fn manual_with_context_uses_context() {
        let src = from_manual(
            &ManualInput {
                topic: "Cells".into(),
                context: "Cells are the basic unit of life.".into(),
            },
            &NormalizeOptions::default(),
        );
        assert_eq!(src.text, "Cells are the basic unit of life.");
        assert_eq!(src.meta["topic"], "Cells");
    }

    #[test]
    fn pdf_records_page_count_and_file_name() {
        let text = join_pages(&["Page one.".into(), "Page two.".into()]);
        let src = from_pdf(
            &PdfInput {
                text,
                file_name: "notes.pdf".into(),
                page_count: 2,
            },
            &NormalizeOptions::default(),
        );
        assert_eq!(src.text, "Page one.\n\nPage two.");
        assert_eq!(src.title, "notes.pdf");
        assert_eq!(src.meta["pageCount"], 2);
    }

    #[test]
    fn empty_text_gives_empty_source_without_error() {
        let src = from_selection(
            &SelectionInput {
                text: " \u{200B}\n\n".into(),
                ..SelectionInput::default()
            },
            &NormalizeOptions::default(),
        );
        assert!(src.is_empty());
        assert!(src.chunks.is_empty());
        assert_eq!(src.word_count, 0);
        assert_eq!(src.title, UNTITLED);
    }

    #[test]
    fn finalize_derives_excerpt_from_clean_text() {
        let options = NormalizeOptions {
            excerpt_chars: 10,
            ..NormalizeOptions::default()
        };
        let src = finalize_source(
            SourceType::Selection,
            " T ",
            "",
            "one   two three four five",
            Map::new(),
            &options,
        );
        assert_eq!(src.title, "T");
        assert_eq!(src.excerpt, "one two t…");
        assert_eq!(src.word_count, 5);
    }

    #[test]
    fn domain_of_strips_www_and_handles_garbage() {
        assert_eq!(domain_of("https://www.rust-lang.org/learn"), "rust-lang.org");
        assert_eq!(domain_of("http://docs.rs"), "docs.rs");
        assert_eq!(domain_of("not a url"), "");
    }
}
