use std::sync::Arc;

use crate::ListItem;

/// A mutation of the [`ListModel`], delivered to observers after it has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeEvent {
    /// A single entry (the loading sentinel) was inserted at `index`.
    Inserted { index: usize },
    /// `count` records were appended starting at `start`.
    Appended { start: usize, count: usize },
    Removed { index: usize },
    /// Every entry was dropped. Indexes seen before this event no longer refer to the same records.
    Cleared { previous_len: usize },
}

/// Observer of [`ListModel`] mutations.
pub type OnItemsChanged = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// The ordered sequence of records shown by the grid, plus at most one trailing loading
/// sentinel.
///
/// Hosts get read access only. Every mutation goes through the pagination coordinator.
#[derive(Clone)]
pub struct ListModel<R> {
    items: Vec<ListItem<R>>,
    real_len: usize,
    observers: Vec<OnItemsChanged>,
}

impl<R> Default for ListModel<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ListModel<R> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            real_len: 0,
            observers: Vec::new(),
        }
    }

    /// Number of entries, sentinel included. This is the count the grid lays out.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of real records.
    pub fn real_len(&self) -> usize {
        self.real_len
    }

    pub fn has_sentinel(&self) -> bool {
        self.items.last().is_some_and(ListItem::is_loading)
    }

    pub fn get(&self, index: usize) -> Option<&ListItem<R>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListItem<R>> {
        self.items.iter()
    }

    /// Real records in order, skipping the sentinel.
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.items.iter().filter_map(ListItem::as_real)
    }

    /// Number of display rows for a fixed column count.
    pub fn row_count(&self, columns: usize) -> usize {
        self.items.len().div_ceil(columns.max(1))
    }

    pub fn subscribe(&mut self, observer: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        self.observers.push(Arc::new(observer));
    }

    fn emit(&self, event: ChangeEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    pub(crate) fn push_sentinel(&mut self) {
        if self.has_sentinel() {
            pwarn!("push_sentinel: sentinel already present");
            return;
        }
        self.items.push(ListItem::Loading);
        self.emit(ChangeEvent::Inserted {
            index: self.items.len() - 1,
        });
    }

    /// Removes the trailing sentinel, if any.
    pub(crate) fn remove_sentinel(&mut self) -> bool {
        if !self.has_sentinel() {
            return false;
        }
        self.items.pop();
        self.emit(ChangeEvent::Removed {
            index: self.items.len(),
        });
        true
    }

    pub(crate) fn append(&mut self, records: Vec<R>) {
        debug_assert!(!self.has_sentinel(), "records appended behind the sentinel");
        let count = records.len();
        if count == 0 {
            return;
        }
        let start = self.items.len();
        self.items.extend(records.into_iter().map(ListItem::Real));
        self.real_len += count;
        self.emit(ChangeEvent::Appended { start, count });
    }

    pub(crate) fn clear(&mut self) {
        let previous_len = self.items.len();
        if previous_len == 0 {
            return;
        }
        self.items.clear();
        self.real_len = 0;
        self.emit(ChangeEvent::Cleared { previous_len });
    }
}

impl<R: core::fmt::Debug> core::fmt::Debug for ListModel<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListModel")
            .field("items", &self.items)
            .field("real_len", &self.real_len)
            .field("observers", &self.observers.len())
            .finish()
    }
}
