use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 2;
pub const MAX_PAGE_SIZE: i64 = 10;

/// Page-number pagination query parameters, client-overridable page size.
#[derive(Deserialize, Debug, Default, Clone, Copy, IntoParams)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Resolved 1-based page number.
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    /// Resolved page size, clamped to the hard maximum.
    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

/// Paginated list envelope.
#[derive(Serialize, Debug, ToSchema)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: i64, query: PageQuery, results: Vec<T>) -> Self {
        let page = query.page();
        let page_size = query.page_size();
        let last_page = (count + page_size - 1) / page_size;

        Self {
            count,
            next: (page < last_page).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, page_size: Option<i64>) -> PageQuery {
        PageQuery { page, page_size }
    }

    #[test]
    fn page_size_defaults_to_two() {
        assert_eq!(query(None, None).page_size(), 2);
    }

    #[test]
    fn page_size_is_capped_at_ten() {
        assert_eq!(query(None, Some(50)).page_size(), 10);
        assert_eq!(query(None, Some(10)).page_size(), 10);
        assert_eq!(query(None, Some(5)).page_size(), 5);
    }

    #[test]
    fn invalid_page_values_fall_back() {
        assert_eq!(query(Some(0), Some(0)).page(), 1);
        assert_eq!(query(Some(-3), Some(-1)).page_size(), 2);
    }

    #[test]
    fn offset_uses_resolved_values() {
        assert_eq!(query(Some(3), Some(5)).offset(), 10);
        assert_eq!(query(None, None).offset(), 0);
    }

    #[test]
    fn envelope_links_point_at_neighbor_pages() {
        let page: Page<i32> = Page::new(7, query(Some(2), Some(2)), vec![1, 2]);
        assert_eq!(page.count, 7);
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.next, Some(3));

        let last: Page<i32> = Page::new(7, query(Some(4), Some(2)), vec![7]);
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(3));

        let only: Page<i32> = Page::new(1, query(None, None), vec![1]);
        assert_eq!(only.next, None);
        assert_eq!(only.previous, None);
    }
}
