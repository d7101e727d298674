//! Wall geometry: dimensions, panel coordinates, and the video wall layout code.
//!
//! Panels are addressed two ways.  A [`PanelCoordinate`] is a 0-based
//! `(x, y)` pair where `x` is the column and `y` the row.  A panel *number* is
//! the 1-based row-major index used by the button surface:
//!
//! ```text
//! 4 × 2 wall
//!
//!   x:   0   1   2   3
//! y=0 [  1 ][ 2 ][ 3 ][ 4 ]
//! y=1 [  5 ][ 6 ][ 7 ][ 8 ]
//! ```
//!
//! # Layout codes
//!
//! Each receiver in a video wall shows one tile of a stretched image.  It is
//! told which tile with a four-digit code:
//!
//! ```text
//! W * 1000 + H * 100 + (X + 1) * 10 + (Y + 1)
//! ```
//!
//! where `W × H` is the size of the selection in tiles and `(X, Y)` is the
//! tile's offset inside that selection.  Every component occupies a single
//! decimal digit, which is why wall dimensions are capped at
//! [`MAX_WALL_DIMENSION`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::wall::WallError;

/// Largest width or height a wall may have.
pub const MAX_WALL_DIMENSION: u16 = 9;

/// Width of the wall built by [`WallDimensions::default`].
pub const DEFAULT_WALL_WIDTH: u16 = 4;

/// Height of the wall built by [`WallDimensions::default`].
pub const DEFAULT_WALL_HEIGHT: u16 = 2;

/// Size of a video wall in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WallDimensions {
    width: u16,
    height: u16,
}

impl WallDimensions {
    /// Creates validated wall dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::InvalidDimensions`] when either side is zero or
    /// larger than [`MAX_WALL_DIMENSION`].
    pub fn new(width: u16, height: u16) -> Result<Self, WallError> {
        let valid = 1..=MAX_WALL_DIMENSION;
        if !valid.contains(&width) || !valid.contains(&height) {
            return Err(WallError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Total number of panels, which is also the highest valid panel number.
    pub fn panel_count(&self) -> u16 {
        self.width * self.height
    }

    /// Returns `true` if `(x, y)` lies on the wall.
    pub fn contains(&self, coord: PanelCoordinate) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Returns `true` if `number` is a valid 1-based panel number.
    pub fn contains_panel_number(&self, number: u16) -> bool {
        (1..=self.panel_count()).contains(&number)
    }
}

impl Default for WallDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WALL_WIDTH,
            height: DEFAULT_WALL_HEIGHT,
        }
    }
}

/// A panel's position on the wall (0-based column `x`, row `y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelCoordinate {
    pub x: u16,
    pub y: u16,
}

impl PanelCoordinate {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Converts a 1-based panel number to its coordinate.
    ///
    /// The number is not range-checked against the wall height; callers
    /// validate it with [`WallDimensions::contains_panel_number`] first.
    pub fn from_panel_number(number: u16, dims: WallDimensions) -> Self {
        let index = number.saturating_sub(1);
        Self {
            x: index % dims.width(),
            y: index / dims.width(),
        }
    }

    /// Converts this coordinate to its 1-based panel number.
    pub fn to_panel_number(self, dims: WallDimensions) -> u16 {
        self.y * dims.width() + self.x + 1
    }

    /// Returns the orthogonal neighbours (left, right, up, down) that lie on the wall.
    pub fn neighbors(self, dims: WallDimensions) -> Vec<PanelCoordinate> {
        let candidates = [
            self.x.checked_sub(1).map(|x| PanelCoordinate::new(x, self.y)),
            Some(PanelCoordinate::new(self.x + 1, self.y)),
            self.y.checked_sub(1).map(|y| PanelCoordinate::new(self.x, y)),
            Some(PanelCoordinate::new(self.x, self.y + 1)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(|c| dims.contains(*c))
            .collect()
    }
}

/// Bounding box of the high panels, in tiles.
///
/// `x`/`y` is the top-left tile of the box; `w`/`h` its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighPanelInfo {
    pub w: u16,
    pub h: u16,
    pub x: u16,
    pub y: u16,
}

/// The same bounding box, under the name the button surface uses for it.
pub type HighPanelPosition = HighPanelInfo;

impl HighPanelInfo {
    /// Computes the bounding box of `coords`, or `None` if the iterator is empty.
    pub fn bounding(coords: impl IntoIterator<Item = PanelCoordinate>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for c in iter {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }
        Some(Self {
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
            x: min_x,
            y: min_y,
        })
    }

    /// Offset of `coord` inside this box.
    ///
    /// Coordinates outside the box saturate at zero on the low side.
    pub fn offset_of(&self, coord: PanelCoordinate) -> (u16, u16) {
        (coord.x.saturating_sub(self.x), coord.y.saturating_sub(self.y))
    }

    /// Returns `true` if `coord` lies inside the box.
    pub fn contains(&self, coord: PanelCoordinate) -> bool {
        coord.x >= self.x && coord.x < self.x + self.w && coord.y >= self.y && coord.y < self.y + self.h
    }

    /// Layout code for the tile at offset `(x, y)` inside this box.
    pub fn encode_layout(&self, x: u16, y: u16) -> u32 {
        encode_layout(self.w, self.h, x, y)
    }
}

impl fmt::Display for HighPanelInfo {
    /// Formats as `WxH@(x,y)`, e.g. `2x1@(1,0)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.w, self.h, self.x, self.y)
    }
}

/// Packs a selection size and tile offset into a layout code.
pub fn encode_layout(width: u16, height: u16, x: u16, y: u16) -> u32 {
    u32::from(width) * 1000 + u32::from(height) * 100 + (u32::from(x) + 1) * 10 + u32::from(y) + 1
}

/// A decoded layout code: selection size plus the 0-based tile offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPosition {
    pub width: u16,
    pub height: u16,
    pub x: u16,
    pub y: u16,
}

/// Splits a layout code back into its parts.
///
/// Returns `None` for `0` (no layout) and for codes whose digits cannot have
/// come from [`encode_layout`].
pub fn decode_layout(code: u32) -> Option<LayoutPosition> {
    if code == 0 || code > 9999 {
        return None;
    }
    let digit = |div: u32| ((code / div) % 10) as u16;
    let (width, height, col, row) = (digit(1000), digit(100), digit(10), digit(1));
    if width == 0 || height == 0 || col == 0 || row == 0 || col > width || row > height {
        return None;
    }
    Some(LayoutPosition {
        width,
        height,
        x: col - 1,
        y: row - 1,
    })
}
