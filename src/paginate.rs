use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// Offset slice of `items`. Page 0 is read as page 1; a page past the end
/// is empty. A zero page size is read as 1.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let slice: &[T] = if start >= total_items {
        &[]
    } else {
        &items[start..(start + page_size).min(total_items)]
    };

    Page {
        items: slice.to_vec(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}
