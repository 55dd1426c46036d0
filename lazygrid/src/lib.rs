//! A headless virtualizing wrap grid.
//!
//! `lazygrid` lays out an unbounded number of uniformly sized cells in rows that wrap at the
//! viewport width, and tells the host which indexes need a visual representation: only the rows
//! intersecting the viewport plus a small buffer. Everything else can be released.
//!
//! It is UI-agnostic. A GUI/TUI layer is expected to provide:
//! - the viewport size (and the last size it actually rendered at)
//! - the item count
//! - scroll requests (offsets, line/page commands, "bring index into view")
//!
//! and to realize/derealize cells from each [`LayoutResult`], typically through a [`Realizer`].
//!
//! For lazily paging data into the grid, see the `lazygrid-pager` crate.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod error;
mod geometry;
mod grid;
mod layout;
mod options;
mod realizer;
mod state;
mod types;


pub use error::LayoutInputError;
pub use geometry::{CellGeometry, Thickness};
pub use grid::Grid;
pub use layout::{
    DEFAULT_BUFFER_ROWS, LayoutResult, items_per_row, layout, layout_with_buffer, row_count,
};
pub use options::{DEFAULT_LINE_SCROLL, GridOptions, OnLayoutChanged};
pub use realizer::{RealizeReport, Realizer};
pub use state::GridSnapshot;
pub use types::{Axis, Offset, RealizedRange, Rect, Size};
