/// TaskHub Web - Pagination.
use serde::Serialize;

/// Page sizes a client may request.
pub const ALLOWED_PAGE_SIZES: [i64; 5] = [5, 10, 25, 50, 100];

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Requested page, already sanitised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl PageRequest {
    /// Unknown page sizes fall back to the default; pages below 1 become 1.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let per_page = per_page
            .filter(|size| ALLOWED_PAGE_SIZES.contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        Self { page, per_page }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Clamp the page into `1..=num_pages` for `total` items.
    /// Returns `(page, num_pages, offset)`.
    pub fn resolve(&self, total: i64) -> (i64, i64, i64) {
        let num_pages = ((total + self.per_page - 1) / self.per_page).max(1);
        let page = self.page.min(num_pages);
        (page, num_pages, (page - 1) * self.per_page)
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        let (page, num_pages, _) = self.resolve(total);
        Page {
            items,
            page,
            per_page: self.per_page,
            total,
            num_pages,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            num_pages: self.num_pages,
        }
    }
}
