//! Page-number pagination for feeds.

use serde::Serialize;

/// Number of posts shown per feed page.
pub const PAGE_SIZE: u64 = 10;

/// Largest offset a SQL `OFFSET` can carry.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A 1-based page number taken from the `page` query parameter.
///
/// Anything that is not a positive integer falls back to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageNumber(u64);

impl PageNumber {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Parse a raw query value.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map_or(Self::FIRST, Self)
    }

    /// The page number as an integer.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Number of items to skip to reach this page, capped at `i64::MAX`.
    #[must_use]
    pub const fn offset(self, per_page: u64) -> u64 {
        let offset = (self.0 - 1).saturating_mul(per_page);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }

    /// Whether this page starts after the last of `count` items.
    ///
    /// The first page is never past the end, even for an empty feed.
    #[must_use]
    pub const fn is_past_end(self, count: u64, per_page: u64) -> bool {
        self.0 > 1 && self.offset(per_page) >= count
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// One page of a feed plus the navigation metadata a template needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Requested page number.
    pub number: u64,
    /// Total number of pages; at least 1 even for an empty feed.
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
    /// Items on this page. Empty when the page is past the end.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from its items and the total item count.
    #[must_use]
    pub fn new(items: Vec<T>, number: PageNumber, count: u64, per_page: u64) -> Self {
        let num_pages = count.div_ceil(per_page.max(1)).max(1);
        let number = number.get();
        Self {
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_number() {
        assert_eq!(PageNumber::parse(None).get(), 1);
        assert_eq!(PageNumber::parse(Some("2")).get(), 2);
        assert_eq!(PageNumber::parse(Some("0")).get(), 1);
        assert_eq!(PageNumber::parse(Some("-3")).get(), 1);
        assert_eq!(PageNumber::parse(Some("abc")).get(), 1);
        assert_eq!(PageNumber::parse(Some("")).get(), 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageNumber::FIRST.offset(PAGE_SIZE), 0);
        assert_eq!(PageNumber::parse(Some("3")).offset(PAGE_SIZE), 20);
    }

    #[test]
    fn test_fifteen_items_make_two_pages() {
        let first = Page::new(vec![0; 10], PageNumber::FIRST, 15, PAGE_SIZE);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = Page::new(vec![0; 5], PageNumber::parse(Some("2")), 15, PAGE_SIZE);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn test_empty_feed_has_one_page() {
        let page = Page::<u8>::new(vec![], PageNumber::FIRST, 0, PAGE_SIZE);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn test_page_past_the_end() {
        let page = Page::<u8>::new(vec![], PageNumber::parse(Some("9")), 15, PAGE_SIZE);
        assert_eq!(page.count, 15);
        assert_eq!(page.num_pages, 2);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_huge_page_offset_is_capped() {
        let page = PageNumber::parse(Some("18446744073709551615"));
        assert_eq!(page.get(), u64::MAX);
        assert_eq!(page.offset(PAGE_SIZE), i64::MAX as u64);
        assert!(page.is_past_end(15, PAGE_SIZE));
    }

    #[test]
    fn test_is_past_end() {
        assert!(!PageNumber::FIRST.is_past_end(0, PAGE_SIZE));
        assert!(!PageNumber::parse(Some("2")).is_past_end(15, PAGE_SIZE));
        assert!(PageNumber::parse(Some("3")).is_past_end(20, PAGE_SIZE));
    }
}
