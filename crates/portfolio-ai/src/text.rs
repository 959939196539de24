//! Cleanup helpers for model output and search queries.

use std::sync::LazyLock;

use regex::Regex;

/// One leading list marker: a bullet, `1.`, `12)`, or a single digit and a
/// space. Longer digit runs without punctuation are part of the text.
static LIST_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]\s*|\d+[.)]\s*|\d\s+)").expect("Invalid list prefix regex")
});

const DESCRIPTION_MARKER: &str = "---DESCRIPTION---";
const CONTENT_MARKER: &str = "---CONTENT---";
const QUERY_MAX_CHARS: usize = 100;

/// Strip list numbering, bullets and surrounding quotes from one line.
pub fn clean_line(line: &str) -> String {
    let trimmed = line.trim();
    let stripped = LIST_PREFIX_RE.replace(trimmed, "");
    stripped
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string()
}

/// Remove characters the search API rejects and cap the query at 100
/// characters on a word boundary.
pub fn clean_query(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\\' | '#' | ':' | '?' | '!'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() <= QUERY_MAX_CHARS {
        return cleaned.to_string();
    }

    let mut out = String::new();
    for word in cleaned.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > QUERY_MAX_CHARS {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Split a model reply into `(description, content)`.
///
/// Without both markers the description is empty and the whole reply is
/// the content.
pub fn parse_sections(reply: &str) -> (String, String) {
    if let Some(desc_at) = reply.find(DESCRIPTION_MARKER) {
        let after = &reply[desc_at + DESCRIPTION_MARKER.len()..];
        if let Some(content_at) = after.find(CONTENT_MARKER) {
            let description = after[..content_at].trim().to_string();
            let content = after[content_at + CONTENT_MARKER.len()..].trim().to_string();
            return (description, content);
        }
    }
    (String::new(), reply.trim().to_string())
}

/// Drop markdown code fences the model wraps HTML in.
pub fn clean_ai_output(text: &str) -> String {
    text.replace("```html", "")
        .replace("```HTML", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Truncate to `max` characters, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_strips_numbering() {
        assert_eq!(clean_line("1. Panduan Rust untuk Pemula"), "Panduan Rust untuk Pemula");
        assert_eq!(clean_line("12) Judul Kedua Belas"), "Judul Kedua Belas");
        assert_eq!(clean_line("- \"Judul Berkutip\""), "Judul Berkutip");
        assert_eq!(clean_line("  * golang  "), "golang");
        assert_eq!(clean_line("Tanpa nomor"), "Tanpa nomor");
        assert_eq!(clean_line("5G di Indonesia"), "5G di Indonesia");
        assert_eq!(clean_line("3 Tips Deploy"), "Tips Deploy");
        assert_eq!(clean_line(""), "");
    }

    #[test]
    fn test_clean_line_keeps_leading_numbers() {
        assert_eq!(clean_line("2025 Tren Web Development"), "2025 Tren Web Development");
        assert_eq!(
            clean_line("10 Framework JavaScript Terbaik"),
            "10 Framework JavaScript Terbaik"
        );
        assert_eq!(clean_line("1. 2025 Tren Cloud"), "2025 Tren Cloud");
    }

    #[test]
    fn test_clean_query_removes_characters() {
        assert_eq!(
            clean_query("Apa itu \"Rust\"? Panduan #1: Mulai!"),
            "Apa itu Rust Panduan 1 Mulai"
        );
    }

    #[test]
    fn test_clean_query_caps_on_word_boundary() {
        let long = "kata ".repeat(30);
        let query = clean_query(&long);
        assert!(query.chars().count() <= 100);
        assert!(query.ends_with("kata"));
        assert!(!query.ends_with(' '));
    }

    #[test]
    fn test_parse_sections_with_markers() {
        let reply = "intro\n---DESCRIPTION---\n Ringkasan singkat. \n---CONTENT---\n<p>Isi</p>\n";
        let (desc, content) = parse_sections(reply);
        assert_eq!(desc, "Ringkasan singkat.");
        assert_eq!(content, "<p>Isi</p>");
    }

    #[test]
    fn test_parse_sections_without_markers() {
        let (desc, content) = parse_sections("  <p>Hanya konten</p> ");
        assert_eq!(desc, "");
        assert_eq!(content, "<p>Hanya konten</p>");

        let (desc, content) = parse_sections("---DESCRIPTION--- only description");
        assert_eq!(desc, "");
        assert_eq!(content, "---DESCRIPTION--- only description");
    }

    #[test]
    fn test_clean_ai_output_removes_fences() {
        assert_eq!(clean_ai_output("```html\n<h2>A</h2>\n```"), "<h2>A</h2>");
        assert_eq!(clean_ai_output("```HTML<p>B</p>```"), "<p>B</p>");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 2), "日本...");
    }
}
