//! Widget adapter: the narrow contract the reconciler drives.
//!
//! A [`WidgetAdapter`] owns the native widgets. The reconciler only ever asks
//! it to create, destroy, mutate, and re-parent widgets by [`WidgetHandle`];
//! it never touches a native widget directly. A recording, in-memory
//! implementation lives in [`crate::testing::HeadlessAdapter`].

use std::any::Any;

use slotmap::new_key_type;

use crate::element::attrs::{Layout, Style};

new_key_type! {
    /// Handle to a live widget owned by an adapter. Copy, lightweight.
    pub struct WidgetHandle;
}

/// The concrete widget kinds an adapter must be able to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Button,
    Label,
    Input,
    Container,
    Checkbox,
}

/// Errors reported by a widget backend.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("unknown widget handle {0:?}")]
    UnknownWidget(WidgetHandle),
    #[error("widget {0:?} cannot hold children")]
    NotAContainer(WidgetHandle),
    #[error("widget backend failure: {0}")]
    Backend(String),
}

/// Contract required from a native widget backend.
///
/// All calls happen on the UI thread. `destroy_widget` must be deferred-safe:
/// the widget may still be referenced by the current call stack, so release
/// happens later (e.g. on the next event-loop turn), never synchronously.
/// Destroying a widget also releases its native children.
pub trait WidgetAdapter {
    /// Create a new, detached widget.
    fn create_widget(&mut self, kind: WidgetKind) -> Result<WidgetHandle, AdapterError>;

    /// Schedule a widget (and its children) for release.
    fn destroy_widget(&mut self, handle: WidgetHandle) -> Result<(), AdapterError>;

    /// Set the displayed text (label, button caption, input value, checkbox label).
    fn set_text(&mut self, handle: WidgetHandle, text: &str) -> Result<(), AdapterError>;

    /// Set the placeholder shown by an empty input.
    fn set_placeholder(&mut self, handle: WidgetHandle, text: &str) -> Result<(), AdapterError>;

    /// Replace the inline style.
    fn set_style(&mut self, handle: WidgetHandle, style: &Style) -> Result<(), AdapterError>;

    fn set_enabled(&mut self, handle: WidgetHandle, enabled: bool) -> Result<(), AdapterError>;

    fn set_visible(&mut self, handle: WidgetHandle, visible: bool) -> Result<(), AdapterError>;

    fn set_checked(&mut self, handle: WidgetHandle, checked: bool) -> Result<(), AdapterError>;

    /// Configure a container's layout.
    fn set_layout(&mut self, handle: WidgetHandle, layout: &Layout) -> Result<(), AdapterError>;

    /// Insert `child` into `parent` at `index` (clamped to the child count).
    ///
    /// A child that already has a parent is detached first.
    fn insert_child(
        &mut self,
        parent: WidgetHandle,
        child: WidgetHandle,
        index: usize,
    ) -> Result<(), AdapterError>;

    /// Detach `child` from `parent` without destroying it.
    fn remove_child(&mut self, parent: WidgetHandle, child: WidgetHandle)
        -> Result<(), AdapterError>;

    /// Whether the widget currently holds input focus.
    fn has_focus(&self, handle: WidgetHandle) -> bool;

    /// Downcast to `&dyn Any` for backend-specific inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
