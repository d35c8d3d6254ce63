//! Main-content extraction with `scraper`.
//!
//! Looks for an explicit content container (`article`, `main`,
//! `[role=main]`) first, then falls back to the element holding the most
//! paragraph text. Candidates with fewer than [`MIN_ARTICLE_WORDS`] words
//! are rejected so the normalizer uses the whole body instead.

use anyhow::Result;
use async_trait::async_trait;
use quizsmith_core::html::element_text;
use quizsmith_core::models::word_count;
use quizsmith_core::source::{Article, ReadabilityExtractor};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

pub const MIN_ARTICLE_WORDS: usize = 40;

const CONTAINER_SELECTORS: &[&str] = &["article", "main", "[role=main]"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperReadability;

#[async_trait]
impl ReadabilityExtractor for ScraperReadability {
    async fn extract(&self, html: &str, _url: &str) -> Result<Option<Article>> {
        Ok(extract_article(html))
    }
}

/// Synchronous core of [`ScraperReadability`].
pub fn extract_article(html: &str) -> Option<Article> {
    let doc = Html::parse_document(html);
    let body = CONTAINER_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|sel| doc.select(&sel).map(element_text).collect::<Vec<_>>())
        .find(|text| word_count(text) >= MIN_ARTICLE_WORDS)
        .or_else(|| densest_block(&doc))?;

    Some(Article {
        title: meta_content(&doc, r#"meta[property="og:title"]"#).or_else(|| first_text(&doc, "h1")),
        text: Some(body),
        byline: meta_content(&doc, r#"meta[name="author"]"#),
        site_name: meta_content(&doc, r#"meta[property="og:site_name"]"#),
    })
}

/// Text of the element whose direct `<p>` children hold the most words.
fn densest_block(doc: &Html) -> Option<String> {
    let sel = Selector::parse("p").ok()?;
    let mut scores: HashMap<_, (usize, ElementRef<'_>)> = HashMap::new();
    for p in doc.select(&sel) {
        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let words = word_count(&element_text(p));
        scores
            .entry(parent.id())
            .or_insert((0, parent))
            .0 += words;
    }
    let (words, parent) = scores.into_values().max_by_key(|(words, _)| *words)?;
    (words >= MIN_ARTICLE_WORDS).then(|| element_text(parent))
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let content = doc.select(&sel).next()?.value().attr("content")?.trim();
    (!content.is_empty()).then(|| content.to_string())
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(word: &str, n: usize) -> String {
        format!("<p>{}</p>", vec![word; n].join(" "))
    }

    #[test]
    fn prefers_article_element() {
        let html = format!(
            r#"<html><head><meta name="author" content="Ada"></head><body>
            <nav>{}</nav><article><h1>Heading</h1>{}</article></body></html>"#,
            para("menu", 10),
            para("content", 50)
        );
        let article = extract_article(&html).unwrap();
        let text = article.text.unwrap();
        assert!(text.contains("content"));
        assert!(!text.contains("menu"));
        assert_eq!(article.title.as_deref(), Some("Heading"));
        assert_eq!(article.byline.as_deref(), Some("Ada"));
    }

    #[test]
    fn falls_back_to_densest_paragraph_block() {
        let html = format!(
            r#"<body><div id="side">{}</div><div id="story">{}{}</div></body>"#,
            para("aside", 5),
            para("story", 30),
            para("more", 30)
        );
        let text = extract_article(&html).unwrap().text.unwrap();
        assert!(text.contains("story"));
        assert!(!text.contains("aside"));
    }

    #[test]
    fn short_pages_yield_nothing() {
        assert_eq!(extract_article("<body><p>too short</p></body>"), None);
    }

    #[tokio::test]
    async fn trait_impl_delegates() {
        let html = format!("<main>{}</main>", para("word", 45));
        let article = ScraperReadability.extract(&html, "").await.unwrap();
        assert!(article.is_some());
    }
}
