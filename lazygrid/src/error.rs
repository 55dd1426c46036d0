use thiserror::Error;

/// Invalid input handed to the layout engine.
///
/// These are programming errors on the host side: the engine refuses to produce a layout
/// instead of silently computing a wrong one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutInputError {
    #[error("cell {field} must be finite and non-negative, got {value}")]
    InvalidGeometry { field: &'static str, value: f64 },

    #[error("viewport {field} must be finite and non-negative, got {value}")]
    InvalidViewport { field: &'static str, value: f64 },

    #[error("scroll offset {field} must be finite, got {value}")]
    InvalidOffset { field: &'static str, value: f64 },
}
