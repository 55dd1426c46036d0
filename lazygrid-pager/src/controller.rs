use std::sync::Arc;

use lazygrid::{Axis, Grid, LayoutInputError, LayoutResult};

use crate::{Completion, FetchKind, FilterSet, ItemSource, Pager};

/// Called once the first page of a new search has been merged.
pub type OnSearchCompleted = Arc<dyn Fn() + Send + Sync>;

/// Glue between a [`Grid`] and a [`Pager`].
///
/// Scroll and viewport input goes to the grid; whenever the realized range gets close to the
/// last cell, the next page is requested. Applied fetch results update the grid's item count
/// (the loading sentinel occupies a cell too).
pub struct GridController<S: ItemSource> {
    grid: Grid,
    pager: Pager<S>,
    on_search_completed: Option<OnSearchCompleted>,
}

impl<S> GridController<S>
where
    S: ItemSource + 'static,
{
    pub fn new(grid: Grid, pager: Pager<S>) -> Self {
        let mut controller = Self {
            grid,
            pager,
            on_search_completed: None,
        };
        controller.sync_item_count();
        controller
    }

    pub fn with_on_search_completed(
        mut self,
        on_search_completed: Option<impl Fn() + Send + Sync + 'static>,
    ) -> Self {
        self.on_search_completed = on_search_completed.map(|f| Arc::new(f) as _);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access. Call [`GridController::check_proximity`] after scrolling through it.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn pager(&self) -> &Pager<S> {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut Pager<S> {
        &mut self.pager
    }

    pub fn layout(&self) -> LayoutResult {
        self.grid.layout()
    }

    /// Display rows for a fixed column count, sentinel included.
    pub fn grid_row_count(&self, columns: usize) -> usize {
        self.pager.model().row_count(columns)
    }

    pub fn on_viewport(
        &mut self,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), LayoutInputError> {
        self.grid.set_viewport(width, height)?;
        self.check_proximity();
        Ok(())
    }

    pub fn on_scroll(&mut self, vertical_offset: f64) {
        self.grid.set_offset(Axis::Vertical, vertical_offset);
        self.check_proximity();
    }

    pub fn on_horizontal_scroll(&mut self, horizontal_offset: f64) {
        self.grid.set_offset(Axis::Horizontal, horizontal_offset);
    }

    pub fn line_up(&mut self) {
        self.grid.line_up();
    }

    pub fn line_down(&mut self) {
        self.grid.line_down();
        self.check_proximity();
    }

    pub fn page_up(&mut self) {
        self.grid.page_up();
    }

    pub fn page_down(&mut self) {
        self.grid.page_down();
        self.check_proximity();
    }

    pub fn mouse_wheel_up(&mut self) {
        self.grid.mouse_wheel_up();
    }

    pub fn mouse_wheel_down(&mut self) {
        self.grid.mouse_wheel_down();
        self.check_proximity();
    }

    pub fn scroll_index_into_view(&mut self, index: usize) -> bool {
        let moved = self.grid.scroll_index_into_view(index);
        self.check_proximity();
        moved
    }

    /// Requests the next page when the realized range is near the last cell.
    ///
    /// Returns whether a fetch was issued.
    pub fn check_proximity(&mut self) -> bool {
        if !self.pager.can_load_more() || !self.grid.is_near_end() {
            return false;
        }
        self.request_load_more()
    }

    pub fn request_load_more(&mut self) -> bool {
        let issued = self.pager.request_load_more();
        if issued {
            self.sync_item_count();
        }
        issued
    }

    pub fn refresh(&mut self) {
        self.pager.refresh();
        self.sync_item_count();
    }

    pub fn search(&mut self, query: &str, filters: FilterSet) {
        self.pager.search(query, filters);
        self.sync_item_count();
    }

    /// Applies every fetch result that has already arrived.
    pub fn poll_completions(&mut self) -> Vec<Completion> {
        let completions = self.pager.poll_completions();
        for completion in &completions {
            self.after_completion(completion);
        }
        completions
    }

    /// Waits for the next fetch result and applies it. `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let completion = self.pager.next_completion().await?;
        self.after_completion(&completion);
        Some(completion)
    }

    /// Applies results until nothing is outstanding, including pages requested because the
    /// grid was still near its end after a merge.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_completion().await {
            completions.push(completion);
        }
        completions
    }

    fn after_completion(&mut self, completion: &Completion) {
        match completion {
            Completion::Stale { .. } => return,
            Completion::Merged {
                kind: FetchKind::Search,
                ..
            } => {
                let len = self.pager.model().len();
                self.grid.batch_update(|grid| {
                    grid.set_item_count(len);
                    grid.scroll_to_top();
                });
                if let Some(cb) = &self.on_search_completed {
                    cb();
                }
            }
            Completion::Merged { .. } | Completion::Failed { .. } => self.sync_item_count(),
        }
        if matches!(completion, Completion::Merged { .. }) {
            self.check_proximity();
        }
    }

    fn sync_item_count(&mut self) {
        self.grid.set_item_count(self.pager.model().len());
    }
}

impl<S> core::fmt::Debug for GridController<S>
where
    S: ItemSource,
    S::Record: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridController")
            .field("grid", &self.grid)
            .field("pager", &self.pager)
            .finish_non_exhaustive()
    }
}
