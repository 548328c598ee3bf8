//! Offset pagination for collection queries.

use std::borrow::Cow;

use async_graphql::{Object, OutputType, TypeName};

/// Largest allowed page size.
pub const MAX_PAGE_SIZE: i32 = 100;

/// A page of results.
///
/// `total` is the number of matching documents before the page slice is
/// taken, so clients can compute page counts.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub total: u64,
    pub result: Vec<T>,
}

impl<T: OutputType> TypeName for Page<T> {
    fn type_name() -> Cow<'static, str> {
        format!("{}Page", T::type_name()).into()
    }
}

#[Object(name_type)]
impl<T: OutputType> Page<T> {
    async fn total(&self) -> u64 {
        self.total
    }

    async fn result(&self) -> &[T] {
        &self.result
    }
}

impl<T> Page<T> {
    /// Slice `items` down to the requested page.
    ///
    /// Pages are 1-based; page values below 1 select the first page, and
    /// `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn paginate(items: Vec<T>, page: i32, limit: i32) -> Self {
        let limit = limit.clamp(1, MAX_PAGE_SIZE) as usize;
        let page = page.max(1) as usize;
        let total = items.len() as u64;
        let result = items
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();
        Self { total, result }
    }

    /// Page with no results.
    pub fn empty() -> Self {
        Self {
            total: 0,
            result: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<i32> {
        (1..=5).collect()
    }

    #[test]
    fn test_first_page() {
        let page = Page::paginate(items(), 1, 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.result, vec![1, 2]);
    }

    #[test]
    fn test_offset_pages() {
        let page = Page::paginate(items(), 2, 2);
        assert_eq!(page.result, vec![3, 4]);

        let last = Page::paginate(items(), 3, 2);
        assert_eq!(last.result, vec![5]);
    }

    #[test]
    fn test_page_past_end_is_empty_but_keeps_total() {
        let page = Page::paginate(items(), 9, 2);
        assert_eq!(page.total, 5);
        assert!(page.result.is_empty());
    }

    #[test]
    fn test_page_below_one_selects_first() {
        let page = Page::paginate(items(), 0, 2);
        assert_eq!(page.result, vec![1, 2]);

        let negative = Page::paginate(items(), -3, 2);
        assert_eq!(negative.result, vec![1, 2]);
    }

    #[test]
    fn test_limit_is_clamped() {
        let tiny = Page::paginate(items(), 1, 0);
        assert_eq!(tiny.result, vec![1]);

        let huge = Page::paginate((1..=500).collect(), 1, 1000);
        assert_eq!(huge.result.len(), MAX_PAGE_SIZE as usize);
    }

    #[test]
    fn test_empty() {
        let page: Page<i32> = Page::empty();
        assert_eq!(page.total, 0);
        assert!(page.result.is_empty());
    }
}
