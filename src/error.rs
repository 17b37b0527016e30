//! Grid construction errors.
//!
//! These surface at level-load time only. The decision loop never fails;
//! see `ai` for how missing data degrades instead.

/// Errors raised while parsing tile layers or building a `PathingGrid`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Cell width must be a positive, finite number of world units.
    #[error("cell width must be positive and finite, got {0}")]
    NonPositiveCellWidth(f64),

    /// Tile width must be a positive, finite number of world units.
    #[error("tile width must be positive and finite, got {0}")]
    NonPositiveTileWidth(f64),

    /// The requested grid has no cells.
    #[error("grid of size {0}x{1} has no cells")]
    EmptyGrid(i32, i32),

    /// The builder was asked to sample zero collision layers.
    #[error("no collision layers to sample")]
    NoLayers,

    /// A row of an ASCII map has a different length than the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedMap { row: usize, expected: usize, found: usize },

    /// An ASCII map contains a character missing from the tile legend.
    #[error("unknown tile {ch:?} at row {row}, column {col}")]
    UnknownTile { ch: char, row: usize, col: usize },

    /// A diagonal step must never be cheaper than a straight one.
    #[error("diagonal cost {diagonal} is below straight cost {straight}")]
    InadmissibleCosts { straight: i32, diagonal: i32 },
}

pub type Result<T> = std::result::Result<T, GridError>;
