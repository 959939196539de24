//! Page/limit handling for list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// A validated page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query values.
    ///
    /// Only plain digit strings are accepted. A page below 1 falls back to 1
    /// and a limit outside `1..=100` falls back to 10.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(parse_digits)
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(parse_digits)
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Metadata for a page of results given the unpaginated total.
    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
        }
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Pagination metadata returned alongside list data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of items plus its metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(None, None);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_valid_values() {
        let req = PageRequest::from_query(Some("3"), Some("25"));
        assert_eq!(req.page, 3);
        assert_eq!(req.limit, 25);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        assert_eq!(PageRequest::from_query(Some("0"), Some("0")), PageRequest::default());
        assert_eq!(PageRequest::from_query(Some("-2"), Some("abc")), PageRequest::default());
        assert_eq!(PageRequest::from_query(Some("2"), Some("101")).limit, 10);
        assert_eq!(PageRequest::from_query(Some("1.5"), Some("100")).page, 1);
        assert_eq!(PageRequest::from_query(None, Some("100")).limit, 100);
    }

    #[test]
    fn test_meta_total_pages_rounds_up() {
        let req = PageRequest { page: 1, limit: 10 };
        assert_eq!(req.meta(0).total_pages, 0);
        assert_eq!(req.meta(10).total_pages, 1);
        assert_eq!(req.meta(11).total_pages, 2);
        assert_eq!(req.meta(95).total, 95);
    }
}
