//! Article scraping: download a page and keep only its readable body text.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::client::PageFetcher;
use crate::error::AiError;
use crate::text::truncate_chars;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7";

/// Elements whose text never counts as article content.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript", "form",
];

/// Candidate containers, tried in order.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-body",
    "#content",
];

/// A container must hold more than this many characters to be used.
const MIN_CONTENT_CHARS: usize = 200;
const MAX_ARTICLE_CHARS: usize = 3000;

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("Invalid content selector"))
        .collect()
});

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("Invalid body selector"));

/// Text of `element`, skipping anything nested inside a stripped tag.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| STRIPPED_TAGS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

fn selection_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector).map(visible_text).collect()
}

/// Reduce an HTML document to its main article text.
///
/// Lines are trimmed and blank lines dropped. Anything past 3000
/// characters is cut and marked with `...`.
pub fn extract_article_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let raw = CONTENT
        .iter()
        .map(|selector| selection_text(&doc, selector))
        .find(|text| text.trim().chars().count() > MIN_CONTENT_CHARS)
        .unwrap_or_else(|| selection_text(&doc, &BODY));

    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&joined, MAX_ARTICLE_CHARS)
}

#[derive(Clone, Debug)]
pub struct ArticleFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ArticleFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl PageFetcher for ArticleFetcher {
    async fn fetch_article(&self, url: &str) -> Result<String, AiError> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| AiError::Fetch(format!("failed to fetch url: {}", e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(AiError::Fetch(format!("url returned status {}", status)));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| AiError::Fetch(format!("failed to read body: {}", e)))?;
        let text = extract_article_text(&html);
        tracing::debug!(url, chars = text.chars().count(), "Scraped article");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_paragraph(word: &str) -> String {
        format!("{} ", word).repeat(60)
    }

    #[test]
    fn test_prefers_article_over_body() {
        let html = format!(
            "<html><body><nav>Menu Home About</nav>\
             <article><h1>Judul</h1><p>{}</p><script>var x = 1;</script></article>\
             <footer>Hak cipta</footer></body></html>",
            long_paragraph("isi")
        );
        let text = extract_article_text(&html);
        assert!(text.starts_with("Judul"));
        assert!(text.contains("isi isi"));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Hak cipta"));
    }

    #[test]
    fn test_short_container_falls_through() {
        let html = format!(
            "<html><body><article>pendek</article>\
             <div class=\"entry-content\"><p>{}</p></div></body></html>",
            long_paragraph("panjang")
        );
        let text = extract_article_text(&html);
        assert!(text.contains("panjang"));
        assert!(!text.contains("pendek"));
    }

    #[test]
    fn test_body_fallback_strips_chrome() {
        let html = "<html><head><style>p{}</style></head><body>\
                    <header>Logo</header><p>  Baris satu  </p>\n\n<p>Baris dua</p>\
                    <form>Cari</form></body></html>";
        let text = extract_article_text(html);
        assert!(text.contains("Baris satu"));
        assert!(text.contains("Baris dua"));
        assert!(!text.contains("Logo"));
        assert!(!text.contains("Cari"));
        assert!(!text.contains("p{}"));
    }

    #[test]
    fn test_blank_lines_removed() {
        let html = "<body><p>a</p>\n   \n\n<p>b</p></body>";
        let text = extract_article_text(html);
        assert!(!text.contains("\n\n"));
    }

    #[test]
    fn test_long_text_truncated() {
        let html = format!("<body><main><p>{}</p></main></body>", "x".repeat(5000));
        let text = extract_article_text(&html);
        assert_eq!(text.chars().count(), 3003);
        assert!(text.ends_with("..."));
    }
}
