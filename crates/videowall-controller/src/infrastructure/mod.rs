//! Infrastructure layer for the video wall controller.
//!
//! Contains OS-facing adapters: the TCP control server and file-system
//! configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `videowall_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod network;
pub mod storage;
