//! Listener registry.
//!
//! [`ListenerRegistry`] maps (widget, event) pairs to the [`MethodCall`] the
//! event should invoke. Each reconciler owns one; entries are replaced when
//! an element's handler attribute changes and dropped when its widget is
//! torn down.

use std::collections::HashMap;

use super::{EventKind, MethodCall};
use crate::adapter::WidgetHandle;

/// Registry of listeners, mapping (WidgetHandle, EventKind) -> MethodCall.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<(WidgetHandle, EventKind), MethodCall>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, replacing any existing one for the same pair.
    pub fn bind(&mut self, widget: WidgetHandle, event: EventKind, call: MethodCall) {
        self.listeners.insert((widget, event), call);
    }

    /// Remove one listener.
    pub fn unbind(&mut self, widget: WidgetHandle, event: EventKind) -> Option<MethodCall> {
        self.listeners.remove(&(widget, event))
    }

    /// Remove every listener on a widget. Returns how many were removed.
    pub fn unbind_widget(&mut self, widget: WidgetHandle) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|(w, _), _| *w != widget);
        before - self.listeners.len()
    }

    /// Look up the call bound to an event on a widget.
    pub fn resolve(&self, widget: WidgetHandle, event: EventKind) -> Option<&MethodCall> {
        self.listeners.get(&(widget, event))
    }

    /// Whether any listener is bound on the widget.
    pub fn contains_widget(&self, widget: WidgetHandle) -> bool {
        self.listeners.keys().any(|(w, _)| *w == widget)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
