//! Domain entities for the video wall.
//!
//! Pure business logic: no sockets, no files, no async.  Everything in here
//! can be unit-tested on any platform without setup.
//!
//! - [`panel`] – a single tile and its state.
//! - [`layout`] – wall dimensions, coordinates, bounding boxes, layout codes.
//! - [`wall`] – the [`wall::VideoWall`] aggregate: selection, routing, layout.

pub mod layout;
pub mod panel;
pub mod wall;
