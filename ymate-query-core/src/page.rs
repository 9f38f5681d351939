use serde::{Deserialize, Serialize};

/// Paging request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    page: u32,
    page_size: u32,
    count: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Page {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Page numbers below 1 become 1.
    pub fn new(page: i64) -> Self {
        Self {
            page: u32::try_from(page.max(1)).unwrap_or(u32::MAX),
            page_size: Self::DEFAULT_PAGE_SIZE,
            count: true,
        }
    }

    /// First `limit` rows (at least one), without a total count.
    pub fn limit(limit: u32) -> Self {
        Self::new(1).page_size(limit.max(1)).count(false)
    }

    pub fn limit_one() -> Self {
        Self::limit(1)
    }

    /// `None` unless both values are positive.
    pub fn create_if_need(page: Option<i64>, page_size: Option<i64>) -> Option<Self> {
        let page_size = page_size.unwrap_or(i64::from(Self::DEFAULT_PAGE_SIZE));
        match page {
            Some(page) if page > 0 && page_size > 0 => {
                Some(Self::new(page).page_size(u32::try_from(page_size).unwrap_or(u32::MAX)))
            }
            _ => None,
        }
    }

    /// Zero falls back to [`Page::DEFAULT_PAGE_SIZE`].
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size > 0 {
            page_size
        } else {
            Self::DEFAULT_PAGE_SIZE
        };
        self
    }

    /// Whether a paged query also counts the total rows.
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    pub fn get_page(&self) -> u32 {
        self.page
    }

    pub fn get_page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_pages_start_at_one() {
        assert_eq!(Page::new(0).get_page(), 1);
        assert_eq!(Page::new(-3).get_page(), 1);
        assert_eq!(Page::new(3).page_size(10).offset(), 20);
        assert_eq!(Page::new(2).page_size(0).get_page_size(), Page::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn limit_disables_counting() {
        let page = Page::limit(0);
        assert_eq!(page.get_page_size(), 1);
        assert!(!page.is_count());
        assert_eq!(Page::limit_one(), page);
    }

    #[test]
    fn create_if_need_requires_positive_values() {
        assert!(Page::create_if_need(None, Some(10)).is_none());
        assert!(Page::create_if_need(Some(1), Some(0)).is_none());
        let page = Page::create_if_need(Some(2), None).unwrap();
        assert_eq!(page.get_page_size(), 20);
        assert!(page.is_count());
    }
}
