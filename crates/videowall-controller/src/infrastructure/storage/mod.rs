//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory (or an explicit path), supplies defaults
//! on first run, and validates the wall and input settings before the
//! controller starts.

pub mod config;
