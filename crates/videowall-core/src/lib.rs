//! # videowall-core
//!
//! Shared library for the NVX video wall controller: the domain model and the
//! binary control protocol.
//!
//! It has no dependencies on sockets, files, or an async runtime, so the
//! controller service and any tool that talks to it can share it.
//!
//! # Overview
//!
//! A video wall is a grid of display tiles ("panels").  An operator selects
//! a group of adjacent panels with panel buttons, then presses a video input
//! button to send that input to the whole group.  Each receiver behind a
//! selected panel is given a layout code telling it which tile of the
//! stretched image to show.
//!
//! - **`domain`** – panels, the wall, selection rules, layout calculation.
//! - **`protocol`** – the framed binary messages exchanged with the control
//!   surface: button presses in, feedback out.

pub mod domain;
pub mod protocol;

pub use domain::layout::{
    decode_layout, encode_layout, HighPanelInfo, HighPanelPosition, LayoutPosition,
    PanelCoordinate, WallDimensions,
};
pub use domain::panel::Panel;
pub use domain::wall::{VideoWall, WallError};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::WallMessage;
