use crate::{Offset, Size};

/// A lightweight snapshot of the grid's scroll state.
///
/// Capture it before the host navigates away from the grid and hand it back to
/// [`crate::Grid::restore`] afterwards. The offset is re-clamped against the extent at restore
/// time, so it stays valid even if the item count changed in between.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSnapshot {
    pub viewport: Size,
    pub offset: Offset,
}
