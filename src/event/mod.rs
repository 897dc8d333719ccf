//! Events: call-expression parsing, listener bindings, widget events.
//!
//! Element attributes such as `on_click="remove_todo(3)"` name a component
//! method and literal argument tokens. [`parse_call`] splits the expression,
//! [`binder`] checks the method exists and records a listener in the
//! [`ListenerRegistry`], and the runtime resolves a [`WidgetEvent`] raised by
//! the backend back into a method invocation.

pub mod binder;
pub mod listener;

pub use binder::{attach_callback, bind_element, MethodLookup};
pub use listener::ListenerRegistry;

use crate::adapter::WidgetHandle;

// ---------------------------------------------------------------------------
// MethodCall
// ---------------------------------------------------------------------------

/// A parsed call expression: method name plus literal argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Arguments passed when `event` fires: the literal tokens followed by
    /// the event payload, if any.
    pub fn invocation_args(&self, event: &WidgetEventKind) -> Vec<String> {
        let mut args = self.args.clone();
        match event {
            WidgetEventKind::Clicked => {}
            WidgetEventKind::TextChanged(value) => args.push(value.clone()),
            WidgetEventKind::Toggled(checked) => args.push(checked.to_string()),
        }
        args
    }
}

/// Parse `identifier(arg, arg, ...)`.
///
/// The identifier must start the expression and be immediately followed by
/// `(`. Arguments run to the first `)`, are split on `,` and trimmed; they are
/// kept as literal tokens. Anything after the `)` is ignored. Returns `None`
/// for a malformed expression.
///
/// ```
/// use gilt_reconcile::event::parse_call;
///
/// let call = parse_call("remove_todo(3)").unwrap();
/// assert_eq!(call.method, "remove_todo");
/// assert_eq!(call.args, vec!["3"]);
/// assert!(parse_call("remove_todo").is_none());
/// ```
pub fn parse_call(expression: &str) -> Option<MethodCall> {
    let name_len = expression
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(expression.len());
    if name_len == 0 {
        return None;
    }
    let (method, rest) = expression.split_at(name_len);
    let inner = rest.strip_prefix('(')?;
    let close = inner.find(')')?;
    let args = &inner[..close];

    let args = if args.is_empty() {
        Vec::new()
    } else {
        args.split(',').map(|a| a.trim().to_owned()).collect()
    };
    Some(MethodCall::new(method, args))
}

/// Parse a handler attribute that may be a bare method name (`on_change`
/// style) or a full call expression.
pub fn parse_handler(expression: &str) -> Option<MethodCall> {
    let expression = expression.trim();
    if !expression.is_empty() && expression.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Some(MethodCall::new(expression, Vec::new()));
    }
    parse_call(expression)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Which widget signal a listener is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Button press (`on_click`).
    Click,
    /// Input text edit (`on_change`).
    Change,
    /// Checkbox toggle (`on_checked`).
    Checked,
}

impl EventKind {
    /// The attribute that declares a handler for this event.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Click => "on_click",
            Self::Change => "on_change",
            Self::Checked => "on_checked",
        }
    }
}

/// Payload of an event raised by the widget backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEventKind {
    Clicked,
    TextChanged(String),
    Toggled(bool),
}

impl WidgetEventKind {
    pub fn event_kind(&self) -> EventKind {
        match self {
            Self::Clicked => EventKind::Click,
            Self::TextChanged(_) => EventKind::Change,
            Self::Toggled(_) => EventKind::Checked,
        }
    }
}

/// An event raised on a specific widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetEvent {
    pub widget: WidgetHandle,
    pub kind: WidgetEventKind,
}

impl WidgetEvent {
    pub fn clicked(widget: WidgetHandle) -> Self {
        Self {
            widget,
            kind: WidgetEventKind::Clicked,
        }
    }

    pub fn text_changed(widget: WidgetHandle, value: impl Into<String>) -> Self {
        Self {
            widget,
            kind: WidgetEventKind::TextChanged(value.into()),
        }
    }

    pub fn toggled(widget: WidgetHandle, checked: bool) -> Self {
        Self {
            widget,
            kind: WidgetEventKind::Toggled(checked),
        }
    }
}
