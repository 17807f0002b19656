//! Page/limit arithmetic shared by every paginated listing.

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound for any requested page size or result cap.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated 1-based page request.
///
/// Zero or negative values clamp to 1 so the offset can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Missing values fall back to page 1 and [`DEFAULT_PAGE_SIZE`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: clamp_limit(limit, DEFAULT_PAGE_SIZE),
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Page size.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.limit - 1) / self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Clamp an optional result cap into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::{clamp_limit, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    #[test]
    fn offset_follows_page_and_limit() {
        for page in 1..=20 {
            for limit in 1..=MAX_PAGE_SIZE {
                let request = PageRequest::new(Some(page), Some(limit));
                assert_eq!(request.offset(), (page - 1) * limit);
            }
        }
    }

    #[test]
    fn zero_and_negative_values_clamp_to_one() {
        let request = PageRequest::new(Some(0), Some(-5));
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(Some(-3), Some(0));
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
    }

    #[test]
    fn defaults_apply_when_missing() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn oversized_limit_is_capped() {
        assert_eq!(PageRequest::new(None, Some(10_000)).limit(), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(500), 5), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(None, 5), 5);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(Some(1), Some(10));
        assert_eq!(request.total_pages(0), 0);
        assert_eq!(request.total_pages(1), 1);
        assert_eq!(request.total_pages(10), 1);
        assert_eq!(request.total_pages(11), 2);
        assert_eq!(request.total_pages(95), 10);
    }
}
