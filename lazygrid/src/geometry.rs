use crate::{LayoutInputError, Size};

/// Per-side spacing around an item inside its cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thickness {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Thickness {
    pub const fn uniform(value: f64) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Size of every cell in the grid.
///
/// All cells share the same geometry. The *effective* cell size (item plus margins) drives the
/// row/column arithmetic and is clamped to at least `1.0` on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellGeometry {
    pub item_width: f64,
    pub item_height: f64,
    pub margin: Thickness,
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self {
            item_width: 200.0,
            item_height: 300.0,
            margin: Thickness::uniform(10.0),
        }
    }
}

impl CellGeometry {
    pub const fn new(item_width: f64, item_height: f64) -> Self {
        Self {
            item_width,
            item_height,
            margin: Thickness::uniform(0.0),
        }
    }

    pub fn with_margin(mut self, margin: Thickness) -> Self {
        self.margin = margin;
        self
    }

    /// Checks that every dimension is finite and non-negative.
    pub fn validate(&self) -> Result<(), LayoutInputError> {
        let fields = [
            ("item_width", self.item_width),
            ("item_height", self.item_height),
            ("margin.left", self.margin.left),
            ("margin.top", self.margin.top),
            ("margin.right", self.margin.right),
            ("margin.bottom", self.margin.bottom),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                gwarn!(field, value, "rejecting cell geometry");
                return Err(LayoutInputError::InvalidGeometry { field, value });
            }
        }
        Ok(())
    }

    /// Item size plus margins, clamped to at least `1.0` per axis.
    pub fn effective_size(&self) -> Size {
        Size {
            width: (self.item_width + self.margin.horizontal()).max(1.0),
            height: (self.item_height + self.margin.vertical()).max(1.0),
        }
    }

    /// The arranged item size inside a cell: effective size minus margins, never negative.
    pub fn arranged_size(&self) -> Size {
        let eff = self.effective_size();
        Size {
            width: (eff.width - self.margin.horizontal()).max(0.0),
            height: (eff.height - self.margin.vertical()).max(0.0),
        }
    }
}
