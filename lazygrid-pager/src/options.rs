use crate::FilterSet;

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Configuration for [`crate::PaginationCoordinator`] and [`crate::Pager`].
#[derive(Clone, Debug, PartialEq)]
pub struct PagerOptions {
    /// Clamped to at least 1.
    pub page_size: usize,
    pub query: Option<String>,
    pub filters: FilterSet,
}

impl Default for PagerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            filters: FilterSet::default(),
        }
    }
}

impl PagerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }
}
