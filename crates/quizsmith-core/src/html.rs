//! Plain HTML text helpers used when no readability result is available.
//!
//! This is deliberately simple and deterministic: it walks the `<body>`
//! subtree, skips non-content elements, and separates block-level elements
//! with blank lines so the cleaner and chunker see paragraph structure.

use scraper::{ElementRef, Html, Selector};

/// Elements whose subtree never contributes readable text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "canvas", "iframe", "head",
];

/// Elements rendered as separate blocks.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Text content of the document body, block elements separated by blank lines.
///
/// Falls back to the document root when the markup has no `<body>`. The
/// result is raw: callers pass it through [`clean`](crate::clean::clean).
pub fn body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let root = first_element(&doc, "body").unwrap_or_else(|| doc.root_element());
    let mut out = String::new();
    collect_text(root, &mut out);
    out
}

/// Raw text of an element subtree, with the same block separation as
/// [`body_text`].
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

/// Trimmed `<title>` text, if present and non-empty.
pub fn document_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let el = first_element(&doc, "title")?;
    let title = el.text().collect::<Vec<_>>().join(" ");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

fn first_element<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        if name == "br" {
            out.push('\n');
            continue;
        }
        let block = BLOCK_TAGS.contains(&name);
        if block {
            out.push_str("\n\n");
        }
        collect_text(child_el, out);
        if block {
            out.push_str("\n\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean;

    #[test]
    fn body_text_skips_scripts_and_separates_blocks() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head>
            <body><script>var x = 1;</script>
            <h1>Heading</h1><p>First <b>bold</b> para.</p><p>Second<br>line</p>
            </body></html>"#;
        let text = clean(&body_text(html));
        assert_eq!(text, "Heading\n\nFirst bold para.\n\nSecond\nline");
    }

    #[test]
    fn document_title_is_trimmed() {
        let html = "<html><head><title>\n  My   Page \n</title></head><body></body></html>";
        assert_eq!(document_title(html).as_deref(), Some("My Page"));
    }

    #[test]
    fn missing_title_is_none() {
        assert_eq!(document_title("<p>no head</p>"), None);
        assert_eq!(document_title("<title>   </title>"), None);
    }
}
