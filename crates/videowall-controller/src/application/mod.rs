//! Application layer use cases for the video wall controller.
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the wall's selection and layout rules in `videowall_core`) and the
//! infrastructure (sockets, configuration files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "route the
//!   pressed video input to every selected panel").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no network I/O and no file system access**.
//!
//! # Sub-modules
//!
//! - **`wall_controller`** – Handles panel and video input button presses,
//!   keeps the active input, and publishes feedback for every change.

pub mod wall_controller;

pub use wall_controller::{ControlError, FeedbackSink, WallController};
