use async_trait::async_trait;

use crate::{FetchError, FilterSet};

/// One page request, built by the coordinator from its pagination state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    /// Text search; `None` when the query is blank.
    pub query: Option<String>,
    pub filters: FilterSet,
}

/// Records returned for a [`PageRequest`], in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<R> {
    pub items: Vec<R>,
}

impl<R> Page<R> {
    pub fn new(items: Vec<R>) -> Self {
        Self { items }
    }

    pub fn returned_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<R> From<Vec<R>> for Page<R> {
    fn from(items: Vec<R>) -> Self {
        Self::new(items)
    }
}

/// Anything that can serve pages of records: an HTTP API, a database, an in-memory catalog.
///
/// A page shorter than `request.limit` tells the pager the source is exhausted.
#[cfg_attr(test, mockall::automock(type Record = u32;))]
#[async_trait]
pub trait ItemSource: Send + Sync {
    type Record: Send + 'static;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Self::Record>, FetchError>;
}
