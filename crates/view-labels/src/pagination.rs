//! Paging over the filtered key list.

/// Current page and page count for a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    per_page: usize,
    total_pages: usize,
}

impl Paginator {
    /// Create a paginator showing `per_page` items per page. A zero page size
    /// is treated as one.
    #[must_use]
    pub fn new(per_page: usize) -> Self {
        Self {
            page: 0,
            per_page: per_page.max(1),
            total_pages: 0,
        }
    }

    /// Zero-based current page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages; zero when there are no items.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Recompute the page count for `items` and pull the current page back
    /// into range.
    pub fn set_total_items(&mut self, items: usize) {
        self.total_pages = items.div_ceil(self.per_page);
        self.page = self.page.min(self.total_pages.saturating_sub(1));
    }

    /// Half-open `start..end` bounds of the current page within `len` items.
    #[must_use]
    pub fn slice_bounds(&self, len: usize) -> (usize, usize) {
        let start = (self.page * self.per_page).min(len);
        let end = (start + self.per_page).min(len);
        (start, end)
    }

    /// Advance one page, stopping at the last.
    pub fn next_page(&mut self) {
        if self.page + 1 < self.total_pages {
            self.page += 1;
        }
    }

    /// Go back one page, stopping at the first.
    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Jump to the first page.
    pub fn first_page(&mut self) {
        self.page = 0;
    }

    /// Jump to the last page.
    pub fn last_page(&mut self) {
        self.page = self.total_pages.saturating_sub(1);
    }

    /// Whether the current page is the first.
    #[must_use]
    pub const fn on_first_page(&self) -> bool {
        self.page == 0
    }

    /// Whether the current page is the last (or there are no pages).
    #[must_use]
    pub const fn on_last_page(&self) -> bool {
        self.page + 1 >= self.total_pages
    }
}
