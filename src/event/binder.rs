//! Event binding: handler attributes to registered listeners.

use super::{parse_call, parse_handler, EventKind, ListenerRegistry, MethodCall};
use crate::adapter::WidgetHandle;
use crate::element::{Attributes, ElementKind};

/// Read access to the method names a component exposes.
pub trait MethodLookup {
    fn has_method(&self, name: &str) -> bool;
}

impl<const N: usize> MethodLookup for [&str; N] {
    fn has_method(&self, name: &str) -> bool {
        self.iter().any(|m| *m == name)
    }
}

impl MethodLookup for Vec<String> {
    fn has_method(&self, name: &str) -> bool {
        self.iter().any(|m| m == name)
    }
}

/// Register `call` on `widget` for `event` if the method exists.
///
/// A missing method is not an error: the widget stays inert and a
/// diagnostic is logged. Returns whether a listener was registered.
pub fn attach_callback(
    registry: &mut ListenerRegistry,
    widget: WidgetHandle,
    event: EventKind,
    call: MethodCall,
    methods: &dyn MethodLookup,
) -> bool {
    if methods.has_method(&call.method) {
        registry.bind(widget, event, call);
        true
    } else {
        tracing::warn!(method = %call.method, ?event, "callback not found in methods, widget left inert");
        false
    }
}

/// (Re)bind the handler attributes of an element.
///
/// Any previous listeners on `widget` are dropped first so a changed or
/// removed attribute never leaves a stale binding. Returns the number of
/// listeners registered.
pub fn bind_element(
    registry: &mut ListenerRegistry,
    kind: ElementKind,
    widget: WidgetHandle,
    attributes: &Attributes,
    methods: &dyn MethodLookup,
) -> usize {
    registry.unbind_widget(widget);

    let event = match kind {
        ElementKind::Button => EventKind::Click,
        ElementKind::Input => EventKind::Change,
        ElementKind::Checkbox => EventKind::Checked,
        _ => return 0,
    };
    let Some(expression) = attributes.get(event.attribute()) else {
        return 0;
    };

    let call = match event {
        EventKind::Click => parse_call(expression),
        EventKind::Change | EventKind::Checked => parse_handler(expression),
    };
    let Some(call) = call else {
        tracing::warn!(
            attribute = event.attribute(),
            expression = %expression,
            "malformed call expression, widget left inert"
        );
        return 0;
    };

    usize::from(attach_callback(registry, widget, event, call, methods))
}
