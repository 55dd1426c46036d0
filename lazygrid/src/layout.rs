use core::cmp;

use crate::{CellGeometry, LayoutInputError, Offset, RealizedRange, Rect, Size};

/// Rows realized above and below the visible rows when no explicit value is given.
pub const DEFAULT_BUFFER_ROWS: usize = 1;

/// The outcome of a single layout pass.
///
/// A `LayoutResult` is a plain value: it carries the inputs it was computed from so that
/// `cell_rect` can be answered without going back to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutResult {
    pub viewport: Size,
    pub offset: Offset,
    pub geometry: CellGeometry,
    pub item_count: usize,
    pub items_per_row: usize,
    pub row_count: usize,
    /// Full content size. `{0, 0}` when there are no items.
    pub content_extent: Size,
    /// Indexes that must have a visual representation; `None` when nothing is realized.
    pub realized: Option<RealizedRange>,
}

impl LayoutResult {
    /// Number of realized indexes.
    pub fn realized_len(&self) -> usize {
        self.realized.map_or(0, |r| r.len())
    }

    pub fn is_realized(&self, index: usize) -> bool {
        self.realized.is_some_and(|r| r.contains(index))
    }

    /// Screen rectangle of `index`, relative to the viewport origin.
    ///
    /// This is defined for every index, realized or not.
    pub fn cell_rect(&self, index: usize) -> Rect {
        let eff = self.geometry.effective_size();
        let arranged = self.geometry.arranged_size();
        let per_row = self.items_per_row.max(1);
        let row = index / per_row;
        let col = index % per_row;
        Rect {
            x: col as f64 * eff.width - self.offset.x + self.geometry.margin.left,
            y: row as f64 * eff.height - self.offset.y + self.geometry.margin.top,
            width: arranged.width,
            height: arranged.height,
        }
    }

    /// Calls `f` for every realized index in ascending order, with its screen rectangle.
    pub fn for_each_realized(&self, mut f: impl FnMut(usize, Rect)) {
        let Some(range) = self.realized else {
            return;
        };
        for i in range.indexes() {
            f(i, self.cell_rect(i));
        }
    }

    /// Whether the realized range has come within `buffer_rows` rows of the last item.
    ///
    /// An empty grid is always "near the end".
    pub fn is_near_end(&self, buffer_rows: usize) -> bool {
        if self.item_count == 0 {
            return true;
        }
        let Some(range) = self.realized else {
            return false;
        };
        let slack = buffer_rows.saturating_mul(self.items_per_row);
        range.end_index.saturating_add(slack) >= self.item_count - 1
    }
}

/// Number of cells per row for a viewport width.
pub fn items_per_row(viewport_width: f64, geometry: &CellGeometry) -> usize {
    let eff = geometry.effective_size();
    let fit = (viewport_width / eff.width).floor();
    if fit.is_finite() && fit >= 1.0 {
        fit as usize
    } else {
        1
    }
}

/// Number of rows needed for `item_count` cells.
pub fn row_count(item_count: usize, items_per_row: usize) -> usize {
    if item_count == 0 {
        0
    } else {
        item_count.div_ceil(items_per_row.max(1))
    }
}

/// Lays out `item_count` uniform cells with [`DEFAULT_BUFFER_ROWS`] buffer rows.
pub fn layout(
    viewport: Size,
    offset: Offset,
    geometry: &CellGeometry,
    item_count: usize,
) -> Result<LayoutResult, LayoutInputError> {
    layout_with_buffer(viewport, offset, geometry, item_count, DEFAULT_BUFFER_ROWS)
}

/// Lays out `item_count` uniform cells in a row-major wrapping grid.
///
/// The result only depends on the arguments. Invalid geometry or a negative/non-finite
/// viewport is rejected.
pub fn layout_with_buffer(
    viewport: Size,
    offset: Offset,
    geometry: &CellGeometry,
    item_count: usize,
    buffer_rows: usize,
) -> Result<LayoutResult, LayoutInputError> {
    geometry.validate()?;
    if !viewport.width.is_finite() || viewport.width < 0.0 {
        return Err(LayoutInputError::InvalidViewport {
            field: "width",
            value: viewport.width,
        });
    }
    if !viewport.height.is_finite() || viewport.height < 0.0 {
        return Err(LayoutInputError::InvalidViewport {
            field: "height",
            value: viewport.height,
        });
    }
    if !offset.x.is_finite() {
        return Err(LayoutInputError::InvalidOffset {
            field: "x",
            value: offset.x,
        });
    }
    if !offset.y.is_finite() {
        return Err(LayoutInputError::InvalidOffset {
            field: "y",
            value: offset.y,
        });
    }
    Ok(compute(viewport, offset, geometry, item_count, buffer_rows))
}

/// Layout without input validation. Callers guarantee finite, non-negative inputs.
pub(crate) fn compute(
    viewport: Size,
    offset: Offset,
    geometry: &CellGeometry,
    item_count: usize,
    buffer_rows: usize,
) -> LayoutResult {
    debug_assert!(viewport.is_finite_non_negative());
    let eff = geometry.effective_size();
    let per_row = items_per_row(viewport.width, geometry);
    let rows = row_count(item_count, per_row);

    let mut result = LayoutResult {
        viewport,
        offset,
        geometry: *geometry,
        item_count,
        items_per_row: per_row,
        row_count: rows,
        content_extent: Size::ZERO,
        realized: None,
    };

    if item_count == 0 {
        gtrace!("layout: no items");
        return result;
    }

    result.content_extent = Size {
        width: per_row as f64 * eff.width,
        height: rows as f64 * eff.height,
    };

    let first_visible_row = (offset.y / eff.height).floor();
    let last_visible_row = ((offset.y + viewport.height) / eff.height).floor();
    let buffer = buffer_rows as f64;
    let max_row = (rows - 1) as f64;
    let start_row = (first_visible_row - buffer).max(0.0);
    let end_row = (last_visible_row + buffer).min(max_row);

    if end_row >= start_row {
        let start_row = start_row as usize;
        let end_row = end_row as usize;
        let start_index = start_row * per_row;
        let end_index = cmp::min(item_count - 1, (end_row + 1) * per_row - 1);
        result.realized = Some(RealizedRange {
            start_index,
            end_index,
        });
    }

    gtrace!(
        items_per_row = per_row,
        rows,
        offset_y = offset.y,
        realized = ?result.realized,
        "layout"
    );
    result
}
