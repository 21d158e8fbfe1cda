use serde::Serialize;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct Params {
    page: Option<i64>,
    per_page: Option<i64>,
}

impl Params {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self::from_query(Some(page), Some(per_page))
    }

    pub const fn from_query(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// 1-based.
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .filter(|p| *p > 0)
            .map(|p| p.min(MAX_PER_PAGE))
            .unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Saturates for absurd pages; the store then returns an empty page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    items: Vec<T>,
    total: i64,
    pages: i64,
    current_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &Params) -> Self {
        let per_page = params.per_page();
        Self {
            items,
            total,
            pages: (total + per_page - 1) / per_page,
            current_page: params.page(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub const fn total(&self) -> i64 {
        self.total
    }

    pub const fn pages(&self) -> i64 {
        self.pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pages: self.pages,
            current_page: self.current_page,
        }
    }
}
