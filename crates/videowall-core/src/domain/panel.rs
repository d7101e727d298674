//! A single video wall tile.

use std::fmt;

/// Source value of a panel that has never had anything routed to it.
pub const NO_SOURCE: u16 = 0;

/// Layout value of a panel that is not part of a selection.
pub const NO_LAYOUT: u32 = 0;

/// One display tile of the wall.
///
/// A panel is either *low* (idle) or *high* (selected).  High panels receive
/// routed sources and carry a layout describing their place in the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Panel {
    source: u16,
    is_high: bool,
    /// Width of the selection this panel belongs to, in tiles.
    pub current_width: u16,
    /// Height of the selection this panel belongs to, in tiles.
    pub current_height: u16,
    /// Column of this panel inside its selection (0-based).
    pub current_x: u16,
    /// Row of this panel inside its selection (0-based).
    pub current_y: u16,
    /// Encoded layout code, see [`crate::domain::layout::encode_layout`].
    pub panel_layout: u32,
}

impl Panel {
    /// Creates a low panel with no source and no layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// The source currently routed to this panel.
    pub fn source(&self) -> u16 {
        self.source
    }

    pub fn set_source(&mut self, source: u16) {
        self.source = source;
    }

    pub fn is_high(&self) -> bool {
        self.is_high
    }

    /// `1` when high, `0` when low; the value driven onto button feedback.
    pub fn is_high_value(&self) -> u16 {
        u16::from(self.is_high)
    }

    pub fn set_high(&mut self) {
        self.is_high = true;
    }

    pub fn set_low(&mut self) {
        self.is_high = false;
    }

    /// Clears the selection geometry and layout code.
    pub fn clear_layout(&mut self) {
        self.current_width = 0;
        self.current_height = 0;
        self.current_x = 0;
        self.current_y = 0;
        self.panel_layout = NO_LAYOUT;
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Panel({}, source={}, layout={})",
            if self.is_high { "high" } else { "low" },
            self.source,
            self.panel_layout
        )
    }
}
