use std::sync::Arc;

use crate::{CellGeometry, DEFAULT_BUFFER_ROWS, LayoutResult, Offset, Size};

/// A callback fired after every layout pass of a [`crate::Grid`].
///
/// Hosts use it to realize/derealize and position visual elements (see [`crate::Realizer`]).
pub type OnLayoutChanged = Arc<dyn Fn(&LayoutResult) + Send + Sync>;

/// Scroll distance of a single line step (arrow key / wheel notch).
pub const DEFAULT_LINE_SCROLL: f64 = 20.0;

/// Configuration for [`crate::Grid`].
///
/// Cheap to clone: the callback is stored in an `Arc`.
#[derive(Clone)]
pub struct GridOptions {
    pub geometry: CellGeometry,
    pub item_count: usize,
    /// Rows realized above and below the visible rows.
    pub buffer_rows: usize,
    /// Distance moved by `line_*` and `mouse_wheel_*` commands.
    pub line_scroll: f64,
    /// The viewport used before the host reports one.
    pub initial_viewport: Option<Size>,
    /// Requested initial offset (clamped once the grid is built).
    pub initial_offset: Offset,
    pub on_change: Option<OnLayoutChanged>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self::new(CellGeometry::default())
    }
}

impl GridOptions {
    pub fn new(geometry: CellGeometry) -> Self {
        Self {
            geometry,
            item_count: 0,
            buffer_rows: DEFAULT_BUFFER_ROWS,
            line_scroll: DEFAULT_LINE_SCROLL,
            initial_viewport: None,
            initial_offset: Offset::ZERO,
            on_change: None,
        }
    }

    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    pub fn with_line_scroll(mut self, line_scroll: f64) -> Self {
        self.line_scroll = line_scroll;
        self
    }

    pub fn with_initial_viewport(mut self, viewport: Option<Size>) -> Self {
        self.initial_viewport = viewport;
        self
    }

    pub fn with_initial_offset(mut self, offset: Offset) -> Self {
        self.initial_offset = offset;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&LayoutResult) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for GridOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridOptions")
            .field("geometry", &self.geometry)
            .field("item_count", &self.item_count)
            .field("buffer_rows", &self.buffer_rows)
            .field("line_scroll", &self.line_scroll)
            .field("initial_viewport", &self.initial_viewport)
            .field("initial_offset", &self.initial_offset)
            .finish_non_exhaustive()
    }
}
