use core::cell::Cell;
use std::sync::Arc;

use crate::layout::{self, compute};
use crate::{
    Axis, CellGeometry, GridOptions, GridSnapshot, LayoutInputError, LayoutResult, Offset, Rect,
    Size,
};

/// A headless virtualizing wrap grid.
///
/// `Grid` owns the only mutable scroll state (the offset) together with the inputs of the
/// layout: viewport, cell geometry and item count. Every query is answered from a fresh
/// [`layout::layout`]-equivalent pass, so there is no cached layout to go stale.
///
/// The grid never looks at item data. The host reports the item count, the viewport and
/// scroll requests; rendering is driven from [`Grid::layout`] or the `on_change` callback.
#[derive(Clone, Debug)]
pub struct Grid {
    options: GridOptions,
    viewport: Size,
    actual_size: Size,
    offset: Offset,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Grid {
    /// Creates a grid from options.
    ///
    /// Fails if the cell geometry or the initial viewport is invalid.
    pub fn new(options: GridOptions) -> Result<Self, LayoutInputError> {
        options.geometry.validate()?;
        let viewport = match options.initial_viewport {
            Some(size) => {
                check_dimension("width", size.width)?;
                check_dimension("height", size.height)?;
                size
            }
            None => Size::ZERO,
        };
        gdebug!(
            item_count = options.item_count,
            buffer_rows = options.buffer_rows,
            "Grid::new"
        );
        let initial = options.initial_offset;
        let mut grid = Self {
            options,
            viewport,
            actual_size: viewport,
            offset: Offset::ZERO,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        };
        if initial.x.is_finite() {
            grid.offset.x = grid.clamp_offset(Axis::Horizontal, initial.x);
        }
        if initial.y.is_finite() {
            grid.offset.y = grid.clamp_offset(Axis::Vertical, initial.y);
        }
        Ok(grid)
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Replaces all options, keeping the current viewport and (re-clamped) offset.
    pub fn set_options(&mut self, options: GridOptions) -> Result<(), LayoutInputError> {
        options.geometry.validate()?;
        self.options = options;
        self.reclamp_offset();
        self.notify();
        Ok(())
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&LayoutResult) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
        self.notify();
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            let layout = self.layout();
            cb(&layout);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    ///
    /// A typical host frame updates the viewport, the item count and the offset together;
    /// batching keeps that to one layout pass on the host side.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        let out = f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
        out
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.options.geometry
    }

    pub fn set_geometry(&mut self, geometry: CellGeometry) -> Result<(), LayoutInputError> {
        geometry.validate()?;
        if self.options.geometry == geometry {
            return Ok(());
        }
        self.options.geometry = geometry;
        self.reclamp_offset();
        self.notify();
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        self.options.item_count
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        if self.options.item_count == item_count {
            return;
        }
        gtrace!(
            from = self.options.item_count,
            to = item_count,
            "Grid::set_item_count"
        );
        self.options.item_count = item_count;
        self.reclamp_offset();
        self.notify();
    }

    pub fn buffer_rows(&self) -> usize {
        self.options.buffer_rows
    }

    pub fn set_buffer_rows(&mut self, buffer_rows: usize) {
        if self.options.buffer_rows == buffer_rows {
            return;
        }
        self.options.buffer_rows = buffer_rows;
        self.notify();
    }

    pub fn line_scroll(&self) -> f64 {
        self.options.line_scroll
    }

    pub fn set_line_scroll(&mut self, line_scroll: f64) {
        if !line_scroll.is_finite() || line_scroll <= 0.0 {
            gwarn!(line_scroll, "ignoring invalid line scroll step");
            return;
        }
        self.options.line_scroll = line_scroll;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// The last size the host actually rendered the grid at.
    pub fn actual_size(&self) -> Size {
        self.actual_size
    }

    /// Records the size the host actually rendered the grid at.
    ///
    /// It is the fallback for viewport dimensions the host cannot provide.
    pub fn set_actual_size(&mut self, size: Size) {
        if !size.is_finite_non_negative() {
            gwarn!(width = size.width, height = size.height, "ignoring invalid actual size");
            return;
        }
        self.actual_size = size;
    }

    /// Sets the viewport.
    ///
    /// A missing or non-finite dimension falls back to the last actual size (at least `1.0`);
    /// a negative one is rejected.
    pub fn set_viewport(
        &mut self,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), LayoutInputError> {
        let viewport = Size {
            width: resolve_dimension("width", width, self.actual_size.width)?,
            height: resolve_dimension("height", height, self.actual_size.height)?,
        };
        if self.viewport == viewport {
            return Ok(());
        }
        gtrace!(
            width = viewport.width,
            height = viewport.height,
            "Grid::set_viewport"
        );
        self.viewport = viewport;
        self.reclamp_offset();
        self.notify();
        Ok(())
    }

    pub fn set_viewport_size(&mut self, size: Size) -> Result<(), LayoutInputError> {
        self.set_viewport(Some(size.width), Some(size.height))
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn items_per_row(&self) -> usize {
        layout::items_per_row(self.viewport.width, &self.options.geometry)
    }

    pub fn row_count(&self) -> usize {
        layout::row_count(self.options.item_count, self.items_per_row())
    }

    /// Full content size; `{0, 0}` for an empty grid.
    pub fn extent(&self) -> Size {
        if self.options.item_count == 0 {
            return Size::ZERO;
        }
        let eff = self.options.geometry.effective_size();
        Size {
            width: self.items_per_row() as f64 * eff.width,
            height: self.row_count() as f64 * eff.height,
        }
    }

    /// Largest valid offset on `axis`.
    pub fn max_offset(&self, axis: Axis) -> f64 {
        (self.extent().along(axis) - self.viewport.along(axis)).max(0.0)
    }

    /// Clamps `value` into `[0, extent - viewport]`, or to `0` when the viewport covers the extent.
    pub fn clamp_offset(&self, axis: Axis, value: f64) -> f64 {
        let extent = self.extent().along(axis);
        let view = self.viewport.along(axis);
        if value.is_nan() || value <= 0.0 || view >= extent {
            return 0.0;
        }
        value.min(extent - view)
    }

    fn reclamp_offset(&mut self) {
        self.offset = Offset {
            x: self.clamp_offset(Axis::Horizontal, self.offset.x),
            y: self.clamp_offset(Axis::Vertical, self.offset.y),
        };
    }

    /// Sets the offset on one axis, clamped.
    ///
    /// Returns `true` if the offset changed. Non-finite values are ignored.
    pub fn set_offset(&mut self, axis: Axis, value: f64) -> bool {
        if !value.is_finite() {
            gwarn!(?axis, value, "ignoring non-finite scroll offset");
            return false;
        }
        let clamped = self.clamp_offset(axis, value);
        if self.offset.along(axis) == clamped {
            return false;
        }
        self.offset.set_along(axis, clamped);
        match axis {
            // Rows are the unit of realization, so only a vertical move can change the range.
            Axis::Vertical => {
                gtrace!(offset = clamped, "vertical offset changed, relayout");
            }
            Axis::Horizontal => {
                gtrace!(offset = clamped, "horizontal offset changed, rearrange");
            }
        }
        self.notify();
        true
    }

    pub fn set_vertical_offset(&mut self, value: f64) -> bool {
        self.set_offset(Axis::Vertical, value)
    }

    pub fn set_horizontal_offset(&mut self, value: f64) -> bool {
        self.set_offset(Axis::Horizontal, value)
    }

    pub fn line_up(&mut self) -> bool {
        self.set_vertical_offset(self.offset.y - self.options.line_scroll)
    }

    pub fn line_down(&mut self) -> bool {
        self.set_vertical_offset(self.offset.y + self.options.line_scroll)
    }

    pub fn line_left(&mut self) -> bool {
        self.set_horizontal_offset(self.offset.x - self.options.line_scroll)
    }

    pub fn line_right(&mut self) -> bool {
        self.set_horizontal_offset(self.offset.x + self.options.line_scroll)
    }

    pub fn mouse_wheel_up(&mut self) -> bool {
        self.line_up()
    }

    pub fn mouse_wheel_down(&mut self) -> bool {
        self.line_down()
    }

    pub fn mouse_wheel_left(&mut self) -> bool {
        self.line_left()
    }

    pub fn mouse_wheel_right(&mut self) -> bool {
        self.line_right()
    }

    pub fn page_up(&mut self) -> bool {
        self.set_vertical_offset(self.offset.y - self.viewport.height)
    }

    pub fn page_down(&mut self) -> bool {
        self.set_vertical_offset(self.offset.y + self.viewport.height)
    }

    pub fn page_left(&mut self) -> bool {
        self.set_horizontal_offset(self.offset.x - self.viewport.width)
    }

    pub fn page_right(&mut self) -> bool {
        self.set_horizontal_offset(self.offset.x + self.viewport.width)
    }

    pub fn scroll_to_top(&mut self) -> bool {
        self.set_vertical_offset(0.0)
    }

    /// Scrolls vertically by the minimum amount that brings the row of `index` into view.
    ///
    /// Out-of-range indexes target the last item. Returns `true` if the offset changed.
    pub fn scroll_index_into_view(&mut self, index: usize) -> bool {
        let count = self.options.item_count;
        if count == 0 {
            return false;
        }
        let index = index.min(count - 1);
        let row = index / self.items_per_row();
        let row_height = self.options.geometry.effective_size().height;

        let top = row as f64 * row_height;
        if top < self.offset.y {
            return self.set_vertical_offset(top);
        }

        let bottom = top + row_height;
        if bottom > self.offset.y + self.viewport.height {
            // A viewport shorter than the row shows the row's top.
            return self.set_vertical_offset((bottom - self.viewport.height).min(top));
        }
        false
    }

    /// Whether the vertical offset sits at the end of the scrollable range.
    pub fn is_at_bottom(&self) -> bool {
        self.offset.y >= self.max_offset(Axis::Vertical)
    }

    /// Runs a layout pass over the current state.
    pub fn layout(&self) -> LayoutResult {
        compute(
            self.viewport,
            self.offset,
            &self.options.geometry,
            self.options.item_count,
            self.options.buffer_rows,
        )
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        self.layout().cell_rect(index)
    }

    /// Whether the realized range is within the buffer rows of the last item.
    pub fn is_near_end(&self) -> bool {
        self.layout().is_near_end(self.options.buffer_rows)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            viewport: self.viewport,
            offset: self.offset,
        }
    }

    /// Restores a snapshot taken with [`Grid::snapshot`], re-clamping the offset.
    pub fn restore(&mut self, snapshot: GridSnapshot) -> Result<(), LayoutInputError> {
        self.batch_update(|g| {
            g.set_viewport_size(snapshot.viewport)?;
            g.set_offset(Axis::Horizontal, snapshot.offset.x);
            g.set_offset(Axis::Vertical, snapshot.offset.y);
            Ok(())
        })
    }
}

fn check_dimension(field: &'static str, value: f64) -> Result<(), LayoutInputError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LayoutInputError::InvalidViewport { field, value });
    }
    Ok(())
}

fn resolve_dimension(
    field: &'static str,
    requested: Option<f64>,
    actual: f64,
) -> Result<f64, LayoutInputError> {
    match requested {
        Some(value) if value.is_finite() => {
            check_dimension(field, value)?;
            Ok(value)
        }
        _ => Ok(actual.max(1.0)),
    }
}
