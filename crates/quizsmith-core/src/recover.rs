//! Recovery of structured JSON from free-form model output.
//!
//! [`recover`] runs a strictly ordered cascade and returns the first value
//! that both parses and satisfies the caller's `validate` predicate:
//!
//! | Stage | Input | Step |
//! |-------|-------|------|
//! | [`RecoveryStage::Direct`] | raw text | parse as-is |
//! | [`RecoveryStage::Extracted`] | raw text | fenced block or balanced `{…}`/`[…]`, smart quotes normalized |
//! | [`RecoveryStage::Repaired`] | repairer output | parse as-is |
//! | [`RecoveryStage::RepairedExtracted`] | repairer output | block extraction again |
//!
//! The repairer stages only run when a [`JsonRepairer`] is supplied. When
//! nothing works the call fails with [`RecoveryError::Exhausted`], carrying
//! a bounded preview of the raw text.
//!
//! # Example
//!
//! ```rust
//! use quizsmith_core::recover::extract_json_block;
//!
//! let raw = "Here is your quiz: ```json {\"questions\":[]} ``` Thanks!";
//! assert_eq!(extract_json_block(raw).as_deref(), Some("{\"questions\":[]}"));
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::clean::truncate_chars;

/// Characters of raw text kept in [`RecoveryError::Exhausted`].
pub const PREVIEW_CHARS: usize = 400;

/// Asks the model to fix its own malformed output.
#[async_trait]
pub trait JsonRepairer: Send + Sync {
    async fn repair(&self, text: &str) -> Result<String>;
}

/// Which cascade stage produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStage {
    Direct,
    Extracted,
    Repaired,
    RepairedExtracted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub value: Value,
    pub stage: RecoveryStage,
}

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error(
        "no valid JSON could be recovered from model output{}; preview: {}",
        repair_note(.repair_error),
        .preview
    )]
    Exhausted {
        preview: String,
        repair_error: Option<String>,
    },
}

fn repair_note(repair_error: &Option<String>) -> String {
    match repair_error {
        Some(e) => format!(" (repair failed: {})", e),
        None => String::new(),
    }
}

/// Recover a validated JSON value from raw model text.
pub async fn recover<F>(
    raw: &str,
    validate: F,
    repairer: Option<&dyn JsonRepairer>,
) -> Result<Recovered, RecoveryError>
where
    F: Fn(&Value) -> bool,
{
    if let Some(value) = parse_valid(raw, &validate) {
        return Ok(done(value, RecoveryStage::Direct));
    }

    let block = extract_json_block(&normalize_quotes(raw));
    if let Some(value) = block.as_deref().and_then(|b| parse_valid(b, &validate)) {
        return Ok(done(value, RecoveryStage::Extracted));
    }

    let mut repair_error = None;
    if let Some(repairer) = repairer {
        let input = block.as_deref().unwrap_or(raw);
        match repairer.repair(input).await {
            Ok(repaired) => {
                if let Some(value) = parse_valid(&repaired, &validate) {
                    return Ok(done(value, RecoveryStage::Repaired));
                }
                if let Some(value) = extract_json_block(&normalize_quotes(&repaired))
                    .and_then(|b| parse_valid(&b, &validate))
                {
                    return Ok(done(value, RecoveryStage::RepairedExtracted));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "model-assisted JSON repair failed");
                repair_error = Some(e.to_string());
            }
        }
    }

    Err(RecoveryError::Exhausted {
        preview: truncate_chars(raw, PREVIEW_CHARS),
        repair_error,
    })
}

fn done(value: Value, stage: RecoveryStage) -> Recovered {
    tracing::debug!(stage = ?stage, "recovered JSON from model output");
    Recovered { value, stage }
}

fn parse_valid<F>(text: &str, validate: &F) -> Option<Value>
where
    F: Fn(&Value) -> bool,
{
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    validate(&value).then_some(value)
}

/// Locate the JSON payload inside surrounding prose.
///
/// Prefers the first `{…}` or `[…]` span inside the first fenced code block,
/// as long as it parses. Otherwise the whole text is scanned the same way,
/// so a stray ```` ``` ```` inside a string value cannot hide the payload.
/// Spans are found by depth counting; brackets inside string literals are
/// ignored. An opener that is never closed yields the slice from the opener
/// to the end of its scope, which is still the best input for a repair call.
pub fn extract_json_block(text: &str) -> Option<String> {
    let fenced = fenced_block(text).and_then(balanced_span);
    let span = match fenced {
        Some(span) if parses(span) => Some(span),
        _ => {
            let whole = balanced_span(text);
            whole.filter(|s| parses(s)).or(fenced).or(whole)
        }
    };
    span.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parses(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Content of the first ```` ``` ```` fence, language tag stripped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(after.len());
    let body = &after[tag_len..];
    let content = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    let content = content.trim();
    (!content.is_empty()).then_some(content)
}

/// First balanced `{…}` or `[…]` span, string-literal aware.
fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let opener = text[start..].chars().next()?;
    let closer = if opener == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == opener => depth += 1,
            c if c == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Some(&text[start..])
}

/// Replace typographic quotes with their ASCII equivalents.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}
