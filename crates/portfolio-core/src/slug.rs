//! URL slug generation.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("Invalid slug regex"));

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("Invalid slug regex"));

/// Turn a title into a URL-friendly slug.
///
/// Lowercases, drops everything outside `[a-z0-9\s-]`, collapses runs of
/// whitespace and dashes into one dash, and trims dashes from both ends.
/// `"My First Project!"` becomes `"my-first-project"`.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = DISALLOWED_RE.replace_all(&lower, "");
    let dashed = SEPARATOR_RE.replace_all(&kept, "-");
    dashed.trim_matches('-').to_string()
}
