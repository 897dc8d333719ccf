//! Pilot: programmatic interaction with a headless runtime.
//!
//! The `Pilot` owns a [`Runtime`] backed by a [`HeadlessAdapter`] and
//! provides methods to simulate user input (clicks, typing, toggles, focus)
//! and to inspect the resulting widget tree.

use serde_json::Value;

use super::headless::HeadlessAdapter;
use super::snapshot::tree_to_string;
use crate::adapter::WidgetHandle;
use crate::event::WidgetEvent;
use crate::props::Props;
use crate::runtime::{Component, ComponentId, Runtime, RuntimeConfig, RuntimeError};
use crate::template::TemplateEngine;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless runtime driver for testing.
///
/// # Examples
///
/// ```
/// use gilt_reconcile::runtime::{Component, Methods};
/// use gilt_reconcile::template::TemplateRegistry;
/// use gilt_reconcile::testing::Pilot;
/// use serde_json::{json, Value};
/// # use gilt_reconcile::props::Props;
///
/// #[derive(Default)]
/// struct Counter;
///
/// impl Component for Counter {
///     fn name(&self) -> &str { "Counter" }
///     fn template(&self) -> &str { "counter" }
///     fn initial_state(&self, _: &Props) -> Value { json!({"n": 0}) }
///     fn methods(&self, m: &mut Methods) {
///         m.add("inc", |ctx, _| {
///             let n = ctx.get("n").and_then(Value::as_i64).unwrap_or(0);
///             ctx.set_state(json!({"n": n + 1})).map(drop)
///         });
///     }
/// }
///
/// let templates = TemplateRegistry::new().with("counter", |ctx| {
///     Ok(format!(r#"<button id="inc" on_click="inc()">{}</button>"#, ctx.text("n")))
/// });
/// let mut pilot = Pilot::new(templates);
/// pilot.mount(Counter).unwrap();
/// pilot.click_id("inc").unwrap();
/// assert_eq!(pilot.text_of("inc").as_deref(), Some("1"));
/// ```
pub struct Pilot {
    runtime: Runtime,
}

impl Pilot {
    /// Create a headless runtime rendering with `templates`.
    pub fn new(templates: impl TemplateEngine + 'static) -> Self {
        Self {
            runtime: Runtime::new(HeadlessAdapter::new(), templates),
        }
    }

    /// Create a headless runtime with an explicit config.
    pub fn with_config(templates: impl TemplateEngine + 'static, config: RuntimeConfig) -> Self {
        Self {
            runtime: Runtime::new(HeadlessAdapter::new(), templates).with_config(config),
        }
    }

    /// Mount `component` as the root with no props.
    pub fn mount<C: Component>(&mut self, component: C) -> Result<ComponentId, RuntimeError> {
        self.runtime.mount_root(component, Props::new())
    }

    /// Mount `component` as the root with `props`.
    pub fn mount_with<C: Component>(
        &mut self,
        component: C,
        props: Props,
    ) -> Result<ComponentId, RuntimeError> {
        self.runtime.mount_root(component, props)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Simulate a click on `widget`, which also takes focus. Returns
    /// whether a listener ran.
    pub fn click(&mut self, widget: WidgetHandle) -> Result<bool, RuntimeError> {
        self.focus(widget);
        self.runtime.dispatch(WidgetEvent::clicked(widget))
    }

    /// Click the element with `id` in the root component's tree.
    pub fn click_id(&mut self, id: &str) -> Result<bool, RuntimeError> {
        let widget = self.expect_id(id)?;
        self.click(widget)
    }

    /// Simulate typing into `widget`: focus it, replace its text, then
    /// deliver the change event.
    pub fn type_text(&mut self, widget: WidgetHandle, text: &str) -> Result<bool, RuntimeError> {
        self.focus(widget);
        self.runtime.adapter_mut().set_text(widget, text)?;
        self.runtime.dispatch(WidgetEvent::text_changed(widget, text))
    }

    /// Type into the element with `id` in the root component's tree.
    pub fn type_id(&mut self, id: &str, text: &str) -> Result<bool, RuntimeError> {
        let widget = self.expect_id(id)?;
        self.type_text(widget, text)
    }

    /// Simulate a user toggling a checkbox.
    pub fn toggle(&mut self, widget: WidgetHandle, checked: bool) -> Result<bool, RuntimeError> {
        self.runtime.adapter_mut().set_checked(widget, checked)?;
        self.runtime.dispatch(WidgetEvent::toggled(widget, checked))
    }

    pub fn focus(&mut self, widget: WidgetHandle) {
        self.adapter_mut().focus(widget);
    }

    pub fn blur(&mut self) {
        self.adapter_mut().blur();
    }

    /// Release widgets destroyed so far; the deferred-deletion turn.
    pub fn flush(&mut self) -> usize {
        self.adapter_mut().flush()
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn root(&self) -> Option<ComponentId> {
        self.runtime.root()
    }

    pub fn adapter(&self) -> &HeadlessAdapter {
        match self.runtime.adapter_as::<HeadlessAdapter>() {
            Some(adapter) => adapter,
            None => unreachable!("pilot runtimes are always headless"),
        }
    }

    pub fn adapter_mut(&mut self) -> &mut HeadlessAdapter {
        match self.runtime.adapter_as_mut::<HeadlessAdapter>() {
            Some(adapter) => adapter,
            None => unreachable!("pilot runtimes are always headless"),
        }
    }

    /// Widget of the element with `id` in the root component's tree.
    pub fn find(&self, id: &str) -> Option<WidgetHandle> {
        self.runtime.find_by_id(self.root()?, id)
    }

    /// Displayed text of the element with `id`.
    pub fn text_of(&self, id: &str) -> Option<String> {
        let widget = self.find(id)?;
        self.adapter().widget(widget).map(|w| w.text.clone())
    }

    /// A top-level value of the root component's state.
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.runtime.state(self.root()?)?.get(key)
    }

    /// Text dump of the root component's main widget.
    pub fn tree(&self) -> String {
        self.root()
            .and_then(|id| self.runtime.host_widget(id))
            .map(|host| tree_to_string(self.adapter(), host))
            .unwrap_or_default()
    }

    fn expect_id(&self, id: &str) -> Result<WidgetHandle, RuntimeError> {
        self.find(id)
            .ok_or_else(|| RuntimeError::handler(format!("no element with id '{id}'")))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
