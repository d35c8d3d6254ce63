//! Byte-level extraction for sources that do not arrive as text: PDF files
//! and pages fetched by URL.
//!
//! Extraction returns plain UTF-8 text per page; cleaning and chunking
//! happen in the core normalizer.

use anyhow::{bail, Context, Result};
use quizsmith_core::source::{join_pages, PageInput, PdfInput};
use std::path::Path;
use std::time::Duration;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_HTML: &str = "text/html";
pub const MIME_XHTML: &str = "application/xhtml+xml";

/// Upper bound on a fetched page body.
const MAX_PAGE_BYTES: usize = 10 * 1024 * 1024;

/// Extraction error. The caller reports it and skips the source.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedContentType(String),
    Pdf(String),
    /// The PDF parsed but has no text layer (scanned images).
    NoTextLayer,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content-type: {}", ct)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::NoTextLayer => write!(f, "PDF has no extractable text layer"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Text of each PDF page, in page order.
pub fn pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(ExtractError::NoTextLayer);
    }
    Ok(pages)
}

/// Read a PDF file into the input the normalizer expects.
pub fn read_pdf(path: &Path) -> Result<PdfInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
    let pages = pdf_pages(&bytes).with_context(|| format!("{}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(file = %file_name, pages = pages.len(), "extracted PDF text");
    Ok(PdfInput {
        text: join_pages(&pages),
        file_name,
        page_count: pages.len(),
    })
}

/// Fetch an HTML page over HTTP(S).
pub async fn fetch_page(raw_url: &str, timeout_secs: u64) -> Result<PageInput> {
    let url = url::Url::parse(raw_url).with_context(|| format!("Invalid URL: {}", raw_url))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Unsupported URL scheme '{}': expected http or https", url.scheme());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("quizsmith/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    let status = response.status();
    if !status.is_success() {
        bail!("Fetching {} failed with HTTP {}", url, status);
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(MIME_HTML)
        .to_string();
    check_html(&content_type)?;

    let body = response.bytes().await?;
    if body.len() > MAX_PAGE_BYTES {
        bail!("Page at {} exceeds {} bytes", url, MAX_PAGE_BYTES);
    }
    tracing::info!(url = %url, bytes = body.len(), "fetched page");

    let final_url = url.to_string();
    Ok(PageInput {
        html: String::from_utf8_lossy(&body).into_owned(),
        title: String::new(),
        url: final_url,
    })
}

fn check_html(content_type: &str) -> Result<(), ExtractError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        MIME_HTML | MIME_XHTML => Ok(()),
        _ => Err(ExtractError::UnsupportedContentType(mime)),
    }
}
