//! Network infrastructure for the video wall controller.
//!
//! # Sub-modules
//!
//! - **`control_server`** – TCP listener for control surfaces.  Sends each
//!   new session a wall snapshot, feeds button presses to the shared
//!   controller, and fans feedback out to every connected session.

pub mod control_server;

pub use control_server::{BroadcastFeedbackSink, ControlServer, ServerError, SharedController};
