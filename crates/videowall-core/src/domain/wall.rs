//! The video wall: panel selection, source routing, and layout calculation.
//!
//! # Selection rules
//!
//! Panels are selected ("set high") one button press at a time:
//!
//! 1. Pressing a high panel sets it low and changes nothing else.
//! 2. Pressing a low panel that touches a high panel (left, right, above, or
//!    below) adds it to the selection.
//! 3. Pressing a low panel that touches no high panel starts a new selection:
//!    every panel is reset to low first.
//!
//! # Layout
//!
//! [`VideoWall::calculate_high_panel_layout`] takes the bounding box of the
//! high panels and gives every high panel its tile offset inside that box,
//! encoded with [`encode_layout`].  The box is used as-is even when the
//! selection is not a full rectangle.

use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::domain::layout::{encode_layout, HighPanelInfo, PanelCoordinate, WallDimensions};
use crate::domain::panel::{Panel, NO_LAYOUT};

/// Errors raised by wall operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WallError {
    /// A panel number outside `1..=max` was pressed.
    #[error("invalid panel number {number}: must be in the range [1, {max}]")]
    PanelNumberOutOfRange { number: u16, max: u16 },

    /// A coordinate outside the wall was addressed.
    #[error(
        "invalid panel coordinates ({x}, {y}): x must be in [0, {width}) and y in [0, {height})"
    )]
    CoordinatesOutOfRange {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },

    /// The wall size is zero or too large to encode in a layout code.
    #[error("invalid wall dimensions {width}x{height}: each side must be in [1, 9]")]
    InvalidDimensions { width: u16, height: u16 },
}

/// The full grid of panels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoWall {
    dims: WallDimensions,
    /// Row-major: index `y * width + x`.
    panels: Vec<Panel>,
}

impl VideoWall {
    /// Creates a wall of low panels.
    pub fn new(dims: WallDimensions) -> Self {
        Self {
            dims,
            panels: vec![Panel::new(); usize::from(dims.panel_count())],
        }
    }

    pub fn dimensions(&self) -> WallDimensions {
        self.dims
    }

    /// Borrows the panel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::CoordinatesOutOfRange`] if the coordinate is off the wall.
    pub fn panel(&self, x: u16, y: u16) -> Result<&Panel, WallError> {
        let index = self.index_of(PanelCoordinate::new(x, y))?;
        Ok(&self.panels[index])
    }

    /// Borrows a panel by its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::PanelNumberOutOfRange`] for an invalid number.
    pub fn panel_by_number(&self, number: u16) -> Result<&Panel, WallError> {
        self.validate_panel_number(number)?;
        Ok(&self.panels[usize::from(number - 1)])
    }

    /// Iterates over `(panel_number, panel)` pairs in panel-number order.
    pub fn panels(&self) -> impl Iterator<Item = (u16, &Panel)> {
        (1u16..).zip(self.panels.iter())
    }

    /// Returns whether the panel at `(x, y)` is high.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::CoordinatesOutOfRange`] if the coordinate is off the wall.
    pub fn get_is_high(&self, x: u16, y: u16) -> Result<bool, WallError> {
        Ok(self.panel(x, y)?.is_high())
    }

    /// Returns the source routed to the panel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::CoordinatesOutOfRange`] if the coordinate is off the wall.
    pub fn get_panel_source(&self, x: u16, y: u16) -> Result<u16, WallError> {
        Ok(self.panel(x, y)?.source())
    }

    /// Returns the layout code of the panel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::CoordinatesOutOfRange`] if the coordinate is off the wall.
    pub fn get_panel_layout(&self, x: u16, y: u16) -> Result<u32, WallError> {
        Ok(self.panel(x, y)?.panel_layout)
    }

    /// Panel numbers of every high panel.
    ///
    /// The wall is scanned column by column (all rows of column 0, then
    /// column 1, ...), so the result is not sorted by panel number.
    pub fn get_high_panels(&self) -> Vec<u16> {
        self.high_coordinates()
            .map(|c| c.to_panel_number(self.dims))
            .collect()
    }

    /// Applies one panel button press using the selection rules in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::PanelNumberOutOfRange`] for an invalid number; the
    /// wall is left unchanged.
    pub fn set_panel(&mut self, number: u16) -> Result<(), WallError> {
        self.validate_panel_number(number)?;
        let coord = PanelCoordinate::from_panel_number(number, self.dims);
        let index = usize::from(number - 1);

        if self.panels[index].is_high() {
            trace!(number, "panel already high; setting low");
            self.panels[index].set_low();
            return Ok(());
        }

        if !self.is_neighbor_of_any_high_panel(coord) {
            trace!(number, "panel not adjacent to selection; starting new selection");
            self.reset_all_panels();
        }

        self.panels[index].set_high();
        Ok(())
    }

    /// Routes `source` to every high panel and returns the numbers of the
    /// panels it was routed to.  Low panels keep their current source.
    pub fn route_source_to_high_panels(&mut self, source: u16) -> Vec<u16> {
        let routed = self.get_high_panels();
        for &number in &routed {
            self.panels[usize::from(number - 1)].set_source(source);
        }
        routed
    }

    /// Recomputes the layout of every panel from the current selection.
    ///
    /// High panels get the selection size, their offset inside it, and the
    /// matching layout code.  Low panels (and every panel, when nothing is
    /// high) are cleared to [`NO_LAYOUT`].
    pub fn calculate_high_panel_layout(&mut self) {
        let Some(info) = self.current_high_panel_layout() else {
            for panel in &mut self.panels {
                panel.clear_layout();
            }
            return;
        };

        let dims = self.dims;
        for (number, panel) in (1u16..).zip(self.panels.iter_mut()) {
            if !panel.is_high() {
                panel.clear_layout();
                continue;
            }
            let coord = PanelCoordinate::from_panel_number(number, dims);
            let (x, y) = info.offset_of(coord);
            panel.current_width = info.w;
            panel.current_height = info.h;
            panel.current_x = x;
            panel.current_y = y;
            panel.panel_layout = encode_layout(info.w, info.h, x, y);
        }
        debug_assert!(self
            .panels
            .iter()
            .all(|p| p.is_high() || p.panel_layout == NO_LAYOUT));
    }

    /// Bounding box of the high panels, or `None` when nothing is high.
    pub fn current_high_panel_layout(&self) -> Option<HighPanelInfo> {
        HighPanelInfo::bounding(self.high_coordinates())
    }

    /// Sets every panel low.  Sources and layouts are left untouched.
    pub fn reset_all_panels(&mut self) {
        for panel in &mut self.panels {
            panel.set_low();
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn high_coordinates(&self) -> impl Iterator<Item = PanelCoordinate> + '_ {
        let (width, height) = (self.dims.width(), self.dims.height());
        (0..width)
            .flat_map(move |x| (0..height).map(move |y| PanelCoordinate::new(x, y)))
            .filter(move |c| self.panels[self.raw_index(*c)].is_high())
    }

    fn is_neighbor_of_any_high_panel(&self, coord: PanelCoordinate) -> bool {
        coord
            .neighbors(self.dims)
            .into_iter()
            .any(|n| self.panels[self.raw_index(n)].is_high())
    }

    fn index_of(&self, coord: PanelCoordinate) -> Result<usize, WallError> {
        if !self.dims.contains(coord) {
            return Err(WallError::CoordinatesOutOfRange {
                x: coord.x,
                y: coord.y,
                width: self.dims.width(),
                height: self.dims.height(),
            });
        }
        Ok(self.raw_index(coord))
    }

    fn raw_index(&self, coord: PanelCoordinate) -> usize {
        usize::from(coord.y) * usize::from(self.dims.width()) + usize::from(coord.x)
    }

    fn validate_panel_number(&self, number: u16) -> Result<(), WallError> {
        if self.dims.contains_panel_number(number) {
            Ok(())
        } else {
            Err(WallError::PanelNumberOutOfRange {
                number,
                max: self.dims.panel_count(),
            })
        }
    }
}

impl Default for VideoWall {
    fn default() -> Self {
        Self::new(WallDimensions::default())
    }
}

/// Draws the wall one row per line; `*` marks high panels, the number after
/// it is the routed source.
impl fmt::Display for VideoWall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VideoWall {}x{}", self.dims.width(), self.dims.height())?;
        for row in self.panels.chunks(usize::from(self.dims.width())) {
            let cells: Vec<String> = row
                .iter()
                .map(|p| format!("[{}{:>3}]", if p.is_high() { '*' } else { ' ' }, p.source()))
                .collect();
            writeln!(f, "{}", cells.join(""))?;
        }
        Ok(())
    }
}
