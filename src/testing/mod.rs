//! Headless testing framework: adapter, Pilot, snapshot helpers.
//!
//! [`HeadlessAdapter`] is an in-memory [`WidgetAdapter`](crate::adapter::WidgetAdapter)
//! that records every call. Use the [`Pilot`] to drive a runtime built on it
//! and [`tree_to_string`] to capture widget trees as plain text for
//! snapshot-style assertions.

pub mod headless;
pub mod pilot;
pub mod snapshot;

pub use headless::{HeadlessAdapter, HeadlessWidget, Op};
pub use pilot::Pilot;
pub use snapshot::{tree_to_string, widget_line};
