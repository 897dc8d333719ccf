//! The component runtime: owns every component instance and drives renders.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;
use slotmap::SlotMap;

use super::component::{Component, ComponentId, Methods};
use super::instance::ComponentInstance;
use super::{ComponentCtx, LifecycleEvent, LifecycleTracker, RuntimeConfig, RuntimeError, State};
use crate::adapter::{WidgetAdapter, WidgetHandle, WidgetKind};
use crate::element::attrs::flag_attr;
use crate::element::{ElementNode, Layout, Margins, Style};
use crate::event::{parse_handler, MethodCall, MethodLookup, WidgetEvent};
use crate::markup;
use crate::props::{coerce, Props, PropsSchema};
use crate::reconcile::{Embed, EmbedUpdate, ReconcileContext, Reconciler, RefTarget};
use crate::template::{TemplateContext, TemplateEngine, TemplateError};

/// The window that hosts the root component.
///
/// Called after every successful render of the root so the host can
/// repaint.
pub trait Shell {
    fn redraw(&mut self, root: WidgetHandle);
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Owns component instances, the widget adapter and the template engine.
///
/// Every component gets a main widget (its host) on first render; the
/// element tree produced by its template lives inside that host and is
/// maintained by the component's own [`Reconciler`]. Child components are
/// embedded with `<component name="...">` and render independently.
pub struct Runtime {
    adapter: Box<dyn WidgetAdapter>,
    templates: Box<dyn TemplateEngine>,
    components: SlotMap<ComponentId, ComponentInstance>,
    root: Option<ComponentId>,
    shell: Option<Box<dyn Shell>>,
    config: RuntimeConfig,
    lifecycle: LifecycleTracker,
}

impl Runtime {
    pub fn new(
        adapter: impl WidgetAdapter + 'static,
        templates: impl TemplateEngine + 'static,
    ) -> Self {
        Self {
            adapter: Box::new(adapter),
            templates: Box::new(templates),
            components: SlotMap::with_key(),
            root: None,
            shell: None,
            config: RuntimeConfig::default(),
            lifecycle: LifecycleTracker::new(),
        }
    }

    /// Replace the configuration (builder).
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the hosting shell (builder).
    pub fn with_shell(mut self, shell: impl Shell + 'static) -> Self {
        self.shell = Some(Box::new(shell));
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Mounting
    // -----------------------------------------------------------------------

    /// Mount `component` as the root, replacing any previous root.
    ///
    /// The component is registered even when its first render fails; the
    /// failure is shown inline and returned.
    pub fn mount_root<C: Component>(
        &mut self,
        component: C,
        props: Props,
    ) -> Result<ComponentId, RuntimeError> {
        if let Some(previous) = self.root.take() {
            self.unmount(previous, true)?;
        }

        let behavior: Rc<dyn Component> = Rc::new(component);
        let schema = behavior.props_schema();
        let emits = behavior.emits();
        let id = self.instantiate(behavior, schema, emits, props, None)?;
        self.root = Some(id);

        self.render(id)?;
        self.redraw_shell(id);
        Ok(id)
    }

    fn instantiate(
        &mut self,
        behavior: Rc<dyn Component>,
        schema: PropsSchema,
        emits: Vec<String>,
        props: Props,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId, RuntimeError> {
        let state = match behavior.initial_state(&props) {
            Value::Object(map) => map,
            Value::Null => State::new(),
            other => return Err(RuntimeError::StateNotObject(other)),
        };
        let instance = ComponentInstance::new(behavior, schema, emits, state, props, parent);
        tracing::debug!(component = %instance.name, "instantiated component");
        Ok(self.components.insert(instance))
    }

    /// Tear a component down.
    ///
    /// Child components are unmounted first. The main widget is destroyed
    /// only when `destroy_host` is set; an embedded component's host belongs
    /// to its parent's tree.
    ///
    /// A component that is rendering is torn down once its pass ends, so
    /// children mounted by that pass are unmounted too.
    pub fn unmount(&mut self, id: ComponentId, destroy_host: bool) -> Result<(), RuntimeError> {
        let instance = self.instance_mut(id)?;
        if instance.rendering {
            tracing::debug!(component = %instance.name, "unmount requested mid-render, deferred");
            instance.doomed = Some(destroy_host);
            return Ok(());
        }
        let reconciler = std::mem::take(&mut instance.reconciler);
        self.finish_unmount(id, reconciler, destroy_host)
    }

    fn finish_unmount(
        &mut self,
        id: ComponentId,
        mut reconciler: Reconciler,
        destroy_host: bool,
    ) -> Result<(), RuntimeError> {
        let teardown = reconciler.teardown_all(&mut Scope { runtime: self, id }, false);

        let Some(instance) = self.components.remove(id) else {
            return Err(RuntimeError::UnknownComponent(id));
        };
        if let Some(parent) = instance.parent.and_then(|p| self.components.get_mut(p)) {
            parent.children.retain(|_, child| *child != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.lifecycle.on_unmount(id);
        instance.behavior.component_did_unmount();
        tracing::debug!(component = %instance.name, "unmounted component");

        if destroy_host {
            if let Some(host) = instance.host {
                self.adapter.destroy_widget(host)?;
            }
        }
        teardown
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render a component: produce its markup and reconcile it.
    ///
    /// A render requested while the same component is rendering (from a
    /// mount hook, say) runs once the current pass completes.
    pub fn render(&mut self, id: ComponentId) -> Result<(), RuntimeError> {
        let instance = self.instance_mut(id)?;
        if instance.rendering {
            instance.pending = true;
            tracing::trace!(component = %instance.name, "render requested mid-render, deferred");
            return Ok(());
        }
        instance.rendering = true;

        let result = loop {
            let result = self.render_once(id);
            match self.components.get_mut(id) {
                Some(instance)
                    if result.is_ok() && instance.pending && instance.doomed.is_none() =>
                {
                    instance.pending = false
                }
                _ => break result,
            }
        };

        let Some(instance) = self.components.get_mut(id) else {
            return result;
        };
        instance.rendering = false;
        instance.pending = false;
        if let Some(destroy_host) = instance.doomed.take() {
            let reconciler = std::mem::take(&mut instance.reconciler);
            return self.finish_unmount(id, reconciler, destroy_host);
        }
        result
    }

    fn render_once(&mut self, id: ComponentId) -> Result<(), RuntimeError> {
        let host = self.ensure_host(id)?;

        let tree = match self.produce_tree(id) {
            Ok(tree) => tree,
            Err(error) => {
                tracing::error!(
                    component = %self.components[id].name,
                    %error,
                    "template failed, keeping previous tree"
                );
                self.show_diagnostic(id, host, &error)?;
                return Err(error.into());
            }
        };
        self.clear_diagnostic(id, host)?;

        let mut reconciler = std::mem::take(&mut self.instance_mut(id)?.reconciler);
        let result = reconciler.reconcile_root(&mut Scope { runtime: self, id }, host, &tree);
        let instance = self.instance_mut(id)?;
        instance.reconciler = reconciler;
        if instance.doomed.is_some() {
            return Ok(());
        }
        result?;

        let instance = self.instance_mut(id)?;
        if instance.mounted {
            self.lifecycle.on_update(id);
            return Ok(());
        }
        instance.mounted = true;
        let behavior = Rc::clone(&instance.behavior);
        self.lifecycle.on_mount(id);
        behavior.component_did_mount(&mut ComponentCtx::new(self, id))
    }

    /// Ask the template engine for markup and parse it.
    fn produce_tree(&self, id: ComponentId) -> Result<ElementNode, TemplateError> {
        let instance = &self.components[id];
        let context = TemplateContext {
            component: &instance.name,
            state: &instance.state,
            props: &instance.props,
            computed: instance.computed.evaluate_all(&instance.state),
            methods: instance.methods.names().collect(),
        };
        let markup = self.templates.render(&instance.template, &context)?;
        Ok(markup::parse(&markup)?)
    }

    /// Create the component's main widget if it does not exist yet.
    pub(crate) fn ensure_host(&mut self, id: ComponentId) -> Result<WidgetHandle, RuntimeError> {
        if let Some(host) = self.instance(id)?.host {
            return Ok(host);
        }
        let host = self.adapter.create_widget(WidgetKind::Container)?;
        let layout = Layout::default()
            .with_spacing(self.config.host_spacing)
            .with_margins(Margins::uniform(self.config.host_margin));
        self.adapter.set_layout(host, &layout)?;
        self.instance_mut(id)?.host = Some(host);
        Ok(host)
    }

    fn show_diagnostic(
        &mut self,
        id: ComponentId,
        host: WidgetHandle,
        error: &TemplateError,
    ) -> Result<(), RuntimeError> {
        let text = format!("Error rendering template: {error}");
        let instance = &self.components[id];
        if let Some(root) = instance.reconciler.root_widget() {
            self.adapter.set_visible(root, false)?;
        }
        if let Some(label) = instance.diagnostic {
            self.adapter.set_text(label, &text)?;
            return Ok(());
        }

        let label = self.adapter.create_widget(WidgetKind::Label)?;
        self.adapter.set_text(label, &text)?;
        self.adapter
            .set_style(label, &Style::parse(&self.config.diagnostic_style))?;
        self.adapter.insert_child(host, label, 1)?;
        self.instance_mut(id)?.diagnostic = Some(label);
        Ok(())
    }

    fn clear_diagnostic(&mut self, id: ComponentId, host: WidgetHandle) -> Result<(), RuntimeError> {
        let Some(label) = self.instance_mut(id)?.diagnostic.take() else {
            return Ok(());
        };
        self.adapter.remove_child(host, label)?;
        self.adapter.destroy_widget(label)?;

        let reconciler = &self.components[id].reconciler;
        if let Some(state) = reconciler.root().and_then(|root| reconciler.get(root)) {
            let visible = !flag_attr(state.attributes(), "hidden");
            self.adapter.set_visible(state.widget(), visible)?;
        }
        Ok(())
    }

    fn redraw_shell(&mut self, id: ComponentId) {
        let host = self.components.get(id).and_then(|c| c.host);
        if let (Some(shell), Some(host)) = (self.shell.as_mut(), host) {
            shell.redraw(host);
        }
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Merge `partial` into the component's state and re-render if anything
    /// changed. Returns the changed keys.
    pub fn set_state(
        &mut self,
        id: ComponentId,
        partial: Value,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        self.set_state_with(id, partial, true)
    }

    /// Merge `partial` into state; re-render only if `rerender` is set and
    /// at least one key changed value.
    pub fn set_state_with(
        &mut self,
        id: ComponentId,
        partial: Value,
        rerender: bool,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        let Value::Object(partial) = partial else {
            return Err(RuntimeError::StateNotObject(partial));
        };

        let instance = self.instance_mut(id)?;
        let mut changed = BTreeSet::new();
        for (key, value) in partial {
            if instance.state.get(&key) != Some(&value) {
                changed.insert(key.clone());
            }
            instance.state.insert(key, value);
        }

        if !rerender {
            tracing::trace!(component = %instance.name, ?changed, "state merged without re-render");
        } else if changed.is_empty() {
            tracing::trace!(component = %instance.name, "state unchanged, skipping re-render");
        } else {
            tracing::debug!(component = %instance.name, ?changed, "state changed");
            self.rerender_component(id)?;
        }
        Ok(changed)
    }

    /// Re-render after a state change.
    ///
    /// The root renders and the shell redraws. A child first notifies its
    /// parent's `child_updated` hook, then renders its own subtree.
    fn rerender_component(&mut self, id: ComponentId) -> Result<(), RuntimeError> {
        let instance = self.instance(id)?;
        if instance.host.is_none() {
            return Ok(());
        }
        let parent = instance.parent;
        match parent {
            None => {
                self.render(id)?;
                self.redraw_shell(id);
            }
            Some(parent) => {
                if let Some(behavior) = self.components.get(parent).map(|p| Rc::clone(&p.behavior)) {
                    behavior.child_updated(&mut ComponentCtx::new(self, parent), id)?;
                }
                self.render(id)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Methods and events
    // -----------------------------------------------------------------------

    /// Invoke a component method with literal argument tokens.
    pub fn call_method(
        &mut self,
        id: ComponentId,
        method: &str,
        args: &[String],
    ) -> Result<(), RuntimeError> {
        let instance = self.instance(id)?;
        let Some(handler) = instance.methods.get(method) else {
            return Err(RuntimeError::UnknownMethod {
                component: instance.name.clone(),
                method: method.to_owned(),
            });
        };
        tracing::debug!(component = %instance.name, method, ?args, "invoking method");
        handler(&mut ComponentCtx::new(self, id), args)
    }

    /// Emit `event` from a child to the parent method bound to it.
    ///
    /// The bound call's own arguments come first, then `args`. Returns
    /// `false` when nothing is bound.
    pub fn emit(
        &mut self,
        id: ComponentId,
        event: &str,
        args: Vec<String>,
    ) -> Result<bool, RuntimeError> {
        let instance = self.instance(id)?;
        if !instance.emits.iter().any(|e| e == event) {
            tracing::warn!(component = %instance.name, event, "emitting an undeclared event");
        }
        let (Some(parent), Some(call)) = (instance.parent, instance.events.get(event)) else {
            tracing::debug!(component = %instance.name, event, "event has no listener");
            return Ok(false);
        };

        let method = call.method.clone();
        let mut full = call.args.clone();
        full.extend(args);
        self.call_method(parent, &method, &full)?;
        Ok(true)
    }

    /// Route a backend widget event to its bound listener.
    ///
    /// Returns `false` when the widget has no listener for the event.
    pub fn dispatch(&mut self, event: WidgetEvent) -> Result<bool, RuntimeError> {
        let owner = self.components.iter_mut().find_map(|(id, instance)| {
            let owns = instance.reconciler.state_of(event.widget).is_some();
            owns.then_some((id, instance))
        });
        let Some((id, instance)) = owner else {
            tracing::trace!(widget = ?event.widget, "event from an unmanaged widget");
            return Ok(false);
        };

        instance.reconciler.record_input(event.widget, &event.kind);
        let Some(call) = instance
            .reconciler
            .listener(event.widget, event.kind.event_kind())
            .cloned()
        else {
            return Ok(false);
        };

        let args = call.invocation_args(&event.kind);
        self.call_method(id, &call.method, &args)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn instance(&self, id: ComponentId) -> Result<&ComponentInstance, RuntimeError> {
        self.components
            .get(id)
            .ok_or(RuntimeError::UnknownComponent(id))
    }

    fn instance_mut(&mut self, id: ComponentId) -> Result<&mut ComponentInstance, RuntimeError> {
        self.components
            .get_mut(id)
            .ok_or(RuntimeError::UnknownComponent(id))
    }

    /// The root component, if mounted.
    pub fn root(&self) -> Option<ComponentId> {
        self.root
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// Number of live component instances.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.components.get(id).map(|c| c.name.as_str())
    }

    pub fn state(&self, id: ComponentId) -> Option<&State> {
        self.components.get(id).map(|c| &c.state)
    }

    pub fn props(&self, id: ComponentId) -> Option<&Props> {
        self.components.get(id).map(|c| &c.props)
    }

    /// Evaluate one computed value against current state.
    pub fn computed(&self, id: ComponentId, name: &str) -> Option<Value> {
        let instance = self.components.get(id)?;
        instance.computed.evaluate(name, &instance.state)
    }

    /// The component's main widget.
    pub fn host_widget(&self, id: ComponentId) -> Option<WidgetHandle> {
        self.components.get(id).and_then(|c| c.host)
    }

    pub fn reconciler(&self, id: ComponentId) -> Option<&Reconciler> {
        self.components.get(id).map(|c| &c.reconciler)
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.components.get(id).and_then(|c| c.parent)
    }

    /// Mounted child components, keyed by their `id` attribute or name.
    pub fn children(&self, id: ComponentId) -> Option<&BTreeMap<String, ComponentId>> {
        self.components.get(id).map(|c| &c.children)
    }

    /// The child mounted under `key`.
    pub fn child(&self, id: ComponentId, key: &str) -> Option<ComponentId> {
        self.children(id)?.get(key).copied()
    }

    /// Widget of the first element in `id`'s tree with the given `id` attribute.
    pub fn find_by_id(&self, id: ComponentId, element_id: &str) -> Option<WidgetHandle> {
        let reconciler = self.reconciler(id)?;
        let state = reconciler.find_by_id(element_id)?;
        reconciler.get(state).map(|s| s.widget())
    }

    pub fn ref_target(&self, id: ComponentId, name: &str) -> Option<RefTarget> {
        self.reconciler(id)?.ref_target(name)
    }

    pub fn adapter(&self) -> &dyn WidgetAdapter {
        self.adapter.as_ref()
    }

    pub fn adapter_mut(&mut self) -> &mut dyn WidgetAdapter {
        self.adapter.as_mut()
    }

    /// Downcast the adapter to its concrete type.
    pub fn adapter_as<T: Any>(&self) -> Option<&T> {
        self.adapter.as_any().downcast_ref()
    }

    pub fn adapter_as_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.adapter.as_any_mut().downcast_mut()
    }

    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Drain recorded lifecycle events, oldest first.
    pub fn drain_lifecycle(&mut self) -> Vec<LifecycleEvent> {
        self.lifecycle.drain()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("components", &self.components.len())
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

static NO_METHODS: [&str; 0] = [];

/// Reconciliation context for the component whose tree is being diffed.
struct Scope<'r> {
    runtime: &'r mut Runtime,
    id: ComponentId,
}

impl Scope<'_> {
    fn methods_of(&self, id: ComponentId) -> Option<&Methods> {
        self.runtime.components.get(id).map(|c| &c.methods)
    }

    /// Key a child is stored under in its parent.
    fn child_key(node: &ElementNode, name: &str) -> String {
        node.id().unwrap_or(name).to_owned()
    }
}

/// Resolve `on_<event>` attributes against the parent's methods.
fn bind_emits(
    emits: &[String],
    node: &ElementNode,
    methods: Option<&Methods>,
    component: &str,
) -> BTreeMap<String, MethodCall> {
    let mut events = BTreeMap::new();
    for event in emits {
        let attribute = format!("on_{event}");
        let Some(expression) = node.attr(&attribute) else {
            continue;
        };
        let Some(call) = parse_handler(expression) else {
            tracing::warn!(component, %attribute, expression, "malformed event handler");
            continue;
        };
        if !methods.is_some_and(|m| m.has_method(&call.method)) {
            tracing::warn!(component, event = %event, method = %call.method, "event handler not found in parent");
            continue;
        }
        events.insert(event.clone(), call);
    }
    events
}

impl ReconcileContext for Scope<'_> {
    fn adapter(&mut self) -> &mut dyn WidgetAdapter {
        self.runtime.adapter.as_mut()
    }

    fn config(&self) -> &RuntimeConfig {
        &self.runtime.config
    }

    fn methods(&self) -> &dyn MethodLookup {
        match self.methods_of(self.id) {
            Some(methods) => methods as &dyn MethodLookup,
            None => &NO_METHODS,
        }
    }

    fn mount_component(&mut self, node: &ElementNode) -> Result<Embed, RuntimeError> {
        let name = node.attr("name").unwrap_or_default();
        let parent = self.runtime.instance(self.id)?;
        let Some(registration) = parent.registry.get(name).cloned() else {
            return Ok(Embed::NotFound(name.to_owned()));
        };

        let props = match coerce(node.attributes(), registration.schema()) {
            Ok(props) => props,
            Err(error) => {
                return Ok(Embed::Invalid {
                    name: name.to_owned(),
                    error,
                })
            }
        };
        let events = bind_emits(registration.emits(), node, Some(&parent.methods), name);

        let behavior: Rc<dyn Component> = Rc::from(registration.instantiate());
        let child = self.runtime.instantiate(
            behavior,
            registration.schema().clone(),
            registration.emits().to_vec(),
            props,
            Some(self.id),
        )?;
        self.runtime.instance_mut(child)?.events = events;
        self.runtime
            .instance_mut(self.id)?
            .children
            .insert(Self::child_key(node, name), child);

        let widget = self.runtime.ensure_host(child)?;
        if let Err(error) = self.runtime.render(child) {
            if !error.is_template() {
                if self.runtime.contains(child) {
                    self.runtime.unmount(child, true)?;
                }
                return Err(error);
            }
        }
        tracing::debug!(component = name, parent = ?self.id, "mounted child component");
        Ok(Embed::Mounted { id: child, widget })
    }

    fn update_component(
        &mut self,
        id: ComponentId,
        node: &ElementNode,
    ) -> Result<EmbedUpdate, RuntimeError> {
        let child = self.runtime.instance(id)?;
        let props = match coerce(node.attributes(), &child.schema) {
            Ok(props) => props,
            Err(error) => return Ok(EmbedUpdate::Invalid(error)),
        };
        let name = child.name.clone();
        let events = bind_emits(&child.emits, node, self.methods_of(self.id), &name);

        let child = self.runtime.instance_mut(id)?;
        child.props = props;
        child.events = events;

        let key = Self::child_key(node, node.attr("name").unwrap_or(name.as_str()));
        let parent = self.runtime.instance_mut(self.id)?;
        parent.children.retain(|_, c| *c != id);
        parent.children.insert(key, id);

        match self.runtime.render(id) {
            Err(error) if !error.is_template() => Err(error),
            _ => Ok(EmbedUpdate::Updated),
        }
    }

    fn unmount_component(&mut self, id: ComponentId) -> Result<(), RuntimeError> {
        self.runtime.unmount(id, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Attributes;
    use crate::event::WidgetEventKind;
    use crate::props::{PropError, PropType};
    use crate::template::TemplateRegistry;
    use crate::testing::headless::{HeadlessAdapter, Op};
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Greeter;

    impl Component for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn template(&self) -> &str {
            "greeter"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"name": "world", "clicks": 0})
        }

        fn methods(&self, methods: &mut Methods) {
            methods.add("rename", |ctx, args| {
                let name = args.first().cloned().unwrap_or_default();
                ctx.set_state(json!({ "name": name }))?;
                Ok(())
            });
        }
    }

    fn templates() -> TemplateRegistry {
        TemplateRegistry::new().with("greeter", |ctx| {
            Ok(format!(
                r#"<div><label id="greeting">Hello {}</label><button on_click="rename(you)">Go</button></div>"#,
                ctx.text("name")
            ))
        })
    }

    fn runtime() -> Runtime {
        Runtime::new(HeadlessAdapter::new(), templates())
    }

    fn headless(runtime: &Runtime) -> &HeadlessAdapter {
        runtime.adapter_as::<HeadlessAdapter>().unwrap()
    }

    // -----------------------------------------------------------------------
    // Render
    // -----------------------------------------------------------------------

    #[test]
    fn mount_renders_into_host() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();

        let host = rt.host_widget(id).unwrap();
        let label = rt.find_by_id(id, "greeting").unwrap();
        let adapter = headless(&rt);
        assert_eq!(adapter.children(host).len(), 1);
        assert_eq!(adapter.widget(label).unwrap().text, "Hello world");
        assert_eq!(rt.reconciler(id).unwrap().passes(), 1);
        assert_eq!(rt.drain_lifecycle(), vec![LifecycleEvent::Mount(id)]);
    }

    #[test]
    fn unchanged_state_skips_render() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();
        rt.adapter_as_mut::<HeadlessAdapter>().unwrap().clear_ops();

        let changed = rt.set_state(id, json!({"name": "world"})).unwrap();

        assert!(changed.is_empty());
        assert!(headless(&rt).ops().is_empty());
        assert_eq!(rt.reconciler(id).unwrap().passes(), 1);
    }

    #[test]
    fn quiet_set_state_defers_render() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();

        let changed = rt.set_state_with(id, json!({"name": "later"}), false).unwrap();
        assert_eq!(changed.into_iter().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(rt.reconciler(id).unwrap().passes(), 1);
        assert_eq!(rt.state(id).unwrap()["name"], "later");
    }

    #[test]
    fn non_object_state_is_rejected() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();
        assert!(matches!(
            rt.set_state(id, json!([1])),
            Err(RuntimeError::StateNotObject(_))
        ));
    }

    #[test]
    fn click_dispatches_bound_method() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();
        let root = rt.reconciler(id).unwrap().root_widget().unwrap();
        let button = headless(&rt).children(root)[1];

        assert!(rt.dispatch(WidgetEvent::clicked(button)).unwrap());

        let label = rt.find_by_id(id, "greeting").unwrap();
        assert_eq!(headless(&rt).widget(label).unwrap().text, "Hello you");
        assert_eq!(rt.reconciler(id).unwrap().passes(), 2);
    }

    #[test]
    fn unknown_method_is_an_error() {
        let mut rt = runtime();
        let id = rt.mount_root(Greeter, Props::new()).unwrap();
        let err = rt.call_method(id, "nope", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownMethod { .. }));
    }

    // -----------------------------------------------------------------------
    // Template errors
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Fragile;

    impl Component for Fragile {
        fn name(&self) -> &str {
            "Fragile"
        }

        fn template(&self) -> &str {
            "fragile"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"broken": false})
        }
    }

    fn fragile_templates() -> TemplateRegistry {
        TemplateRegistry::new().with("fragile", |ctx| {
            if ctx.lookup("broken") == Some(&json!(true)) {
                Err(TemplateError::Render {
                    template: "fragile".into(),
                    message: "boom".into(),
                })
            } else {
                Ok("<label>fine</label>".into())
            }
        })
    }

    #[test]
    fn template_error_shows_diagnostic_and_keeps_tree() {
        let mut rt = Runtime::new(HeadlessAdapter::new(), fragile_templates());
        let id = rt.mount_root(Fragile, Props::new()).unwrap();
        let host = rt.host_widget(id).unwrap();
        let root = rt.reconciler(id).unwrap().root_widget().unwrap();

        let err = rt.set_state(id, json!({"broken": true})).unwrap_err();
        assert!(err.is_template());

        let adapter = headless(&rt);
        let children = adapter.children(host);
        assert_eq!(children.len(), 2);
        let label = adapter.widget(children[1]).unwrap();
        assert!(label.text.starts_with("Error rendering template:"));
        assert_eq!(label.style.get("color"), Some("red"));
        assert!(!adapter.widget(root).unwrap().visible);
        assert_eq!(rt.reconciler(id).unwrap().root_widget(), Some(root));

        rt.set_state(id, json!({"broken": false})).unwrap();
        let adapter = headless(&rt);
        assert_eq!(adapter.children(host), vec![root]);
        assert!(adapter.widget(root).unwrap().visible);
    }

    #[test]
    fn invalid_markup_is_a_template_error() {
        let templates = |_: &str, _: &TemplateContext<'_>| Ok::<_, TemplateError>(String::new());
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates);
        let err = rt.mount_root(Greeter, Props::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::Template(TemplateError::Markup(_))));
        assert!(rt.root().is_some());
    }

    // -----------------------------------------------------------------------
    // Child components
    // -----------------------------------------------------------------------

    thread_local! {
        static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    #[derive(Default)]
    struct Badge;

    impl Component for Badge {
        fn name(&self) -> &str {
            "Badge"
        }

        fn template(&self) -> &str {
            "badge"
        }

        fn props_schema(&self) -> PropsSchema {
            PropsSchema::new("Badge").required("count", PropType::Int)
        }

        fn emits(&self) -> Vec<String> {
            vec!["cleared".into()]
        }

        fn methods(&self, methods: &mut Methods) {
            methods.add("clear", |ctx, _| {
                ctx.emit("cleared", ["badge"])?;
                Ok(())
            });
        }

        fn component_did_unmount(&self) {
            LOG.with(|log| log.borrow_mut().push("badge unmounted".into()));
        }
    }

    #[derive(Default)]
    struct Panel;

    impl Component for Panel {
        fn name(&self) -> &str {
            "Panel"
        }

        fn template(&self) -> &str {
            "panel"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"count": "3", "show": true})
        }

        fn components(&self, registry: &mut crate::runtime::ComponentRegistry) {
            registry.register::<Badge>();
        }

        fn methods(&self, methods: &mut Methods) {
            methods.add("on_clear", |ctx, args| {
                LOG.with(|log| log.borrow_mut().push(format!("cleared by {}", args.join(","))));
                ctx.set_state(json!({"show": false}))?;
                Ok(())
            });
        }
    }

    fn panel_templates() -> TemplateRegistry {
        TemplateRegistry::new()
            .with("panel", |ctx| {
                let badge = if ctx.lookup("show") == Some(&json!(true)) {
                    format!(
                        r#"<component name="Badge" ref="badge" count="{}" on_cleared="on_clear" />"#,
                        ctx.text("count")
                    )
                } else {
                    String::new()
                };
                Ok(format!("<div><label>panel</label>{badge}</div>"))
            })
            .with("badge", |ctx| Ok(format!("<label>{}</label>", ctx.text("count"))))
    }

    #[test]
    fn child_component_mounts_with_coerced_props() {
        let mut rt = Runtime::new(HeadlessAdapter::new(), panel_templates());
        let id = rt.mount_root(Panel, Props::new()).unwrap();

        let child = rt.child(id, "Badge").unwrap();
        assert_eq!(rt.props(child).unwrap()["count"], json!(3));
        assert_eq!(rt.parent(child), Some(id));
        assert_eq!(rt.ref_target(id, "badge"), Some(RefTarget::Component(child)));

        let root = rt.reconciler(id).unwrap().root_widget().unwrap();
        let child_host = rt.host_widget(child).unwrap();
        assert_eq!(headless(&rt).children(root)[1], child_host);
    }

    #[test]
    fn emit_reaches_parent_and_unmounts_child() {
        LOG.with(|log| log.borrow_mut().clear());
        let mut rt = Runtime::new(HeadlessAdapter::new(), panel_templates());
        let id = rt.mount_root(Panel, Props::new()).unwrap();
        let child = rt.child(id, "Badge").unwrap();
        let child_host = rt.host_widget(child).unwrap();

        rt.call_method(child, "clear", &[]).unwrap();

        assert!(!rt.contains(child));
        assert!(rt.child(id, "Badge").is_none());
        assert!(headless(&rt).ops().contains(&Op::Destroy(child_host)));
        LOG.with(|log| {
            assert_eq!(
                *log.borrow(),
                vec!["cleared by badge".to_owned(), "badge unmounted".to_owned()]
            );
        });
    }

    #[test]
    fn invalid_child_props_render_marker() {
        let templates = panel_templates().with("panel", |_| {
            Ok(r#"<div><component name="Badge" count="many" /></div>"#.into())
        });
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates);
        let id = rt.mount_root(Panel, Props::new()).unwrap();

        assert!(rt.children(id).unwrap().is_empty());
        let root = rt.reconciler(id).unwrap().root_widget().unwrap();
        let marker = headless(&rt).children(root)[0];
        let text = &headless(&rt).widget(marker).unwrap().text;
        assert!(text.starts_with("Invalid component Badge:"), "{text}");
        let expected = PropError::Invalid {
            field: "count".into(),
            value: "many".into(),
            reason: "expected an integer".into(),
        };
        assert!(text.ends_with(&expected.to_string()), "{text}");
    }

    #[test]
    fn unregistered_child_renders_not_found_marker() {
        let templates = panel_templates()
            .with("panel", |_| Ok(r#"<div><component name="Ghost" /></div>"#.into()));
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates);
        let id = rt.mount_root(Panel, Props::new()).unwrap();

        let root = rt.reconciler(id).unwrap().root_widget().unwrap();
        let marker = headless(&rt).children(root)[0];
        assert_eq!(headless(&rt).widget(marker).unwrap().text, "Component not found: Ghost");
    }

    // -----------------------------------------------------------------------
    // Scoped child renders
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Tally;

    impl Component for Tally {
        fn name(&self) -> &str {
            "Tally"
        }

        fn template(&self) -> &str {
            "tally"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"n": 0})
        }

        fn methods(&self, methods: &mut Methods) {
            methods.add("bump", |ctx, _| {
                let n = ctx.get("n").and_then(Value::as_i64).unwrap_or(0);
                ctx.set_state(json!({"n": n + 1}))?;
                Ok(())
            });
        }
    }

    #[derive(Default)]
    struct Shelf;

    impl Component for Shelf {
        fn name(&self) -> &str {
            "Shelf"
        }

        fn template(&self) -> &str {
            "shelf"
        }

        fn components(&self, registry: &mut crate::runtime::ComponentRegistry) {
            registry.register::<Tally>();
        }

        fn child_updated(
            &self,
            _ctx: &mut ComponentCtx<'_>,
            _child: ComponentId,
        ) -> Result<(), RuntimeError> {
            LOG.with(|log| log.borrow_mut().push("child updated".into()));
            Ok(())
        }
    }

    struct Redraws(Rc<std::cell::Cell<usize>>);

    impl Shell for Redraws {
        fn redraw(&mut self, _root: WidgetHandle) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn child_set_state_renders_only_the_child() {
        LOG.with(|log| log.borrow_mut().clear());
        let templates = TemplateRegistry::new()
            .with("shelf", |_| Ok(r#"<div><label>shelf</label><component name="Tally" /></div>"#.into()))
            .with("tally", |ctx| Ok(format!(r#"<label id="n">{}</label>"#, ctx.text("n"))));
        let redraws = Rc::new(std::cell::Cell::new(0));
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates)
            .with_shell(Redraws(Rc::clone(&redraws)));
        let root = rt.mount_root(Shelf, Props::new()).unwrap();
        let child = rt.child(root, "Tally").unwrap();
        assert_eq!(redraws.get(), 1);

        rt.call_method(child, "bump", &[]).unwrap();

        assert_eq!(rt.reconciler(root).unwrap().passes(), 1);
        assert_eq!(rt.reconciler(child).unwrap().passes(), 2);
        assert_eq!(redraws.get(), 1);
        let label = rt.find_by_id(child, "n").unwrap();
        assert_eq!(headless(&rt).widget(label).unwrap().text, "1");
        LOG.with(|log| assert_eq!(*log.borrow(), vec!["child updated".to_owned()]));
    }

    // -----------------------------------------------------------------------
    // Unmount during render
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Outer;

    impl Component for Outer {
        fn name(&self) -> &str {
            "Outer"
        }

        fn template(&self) -> &str {
            "outer"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"show": true})
        }

        fn components(&self, registry: &mut crate::runtime::ComponentRegistry) {
            registry.register::<Middle>();
        }

        fn methods(&self, methods: &mut Methods) {
            methods.add("hide", |ctx, _| {
                ctx.set_state(json!({"show": false}))?;
                Ok(())
            });
        }
    }

    #[derive(Default)]
    struct Middle;

    impl Component for Middle {
        fn name(&self) -> &str {
            "Middle"
        }

        fn template(&self) -> &str {
            "middle"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"grown": false})
        }

        fn emits(&self) -> Vec<String> {
            vec!["done".into()]
        }

        fn components(&self, registry: &mut crate::runtime::ComponentRegistry) {
            registry.register::<Inner>();
        }

        fn methods(&self, methods: &mut Methods) {
            methods
                .add("grow", |ctx, _| {
                    ctx.set_state(json!({"grown": true}))?;
                    Ok(())
                })
                .add("inner_ready", |ctx, _| {
                    ctx.emit("done", Vec::<String>::new())?;
                    Ok(())
                });
        }
    }

    #[derive(Default)]
    struct Inner;

    impl Component for Inner {
        fn name(&self) -> &str {
            "Inner"
        }

        fn template(&self) -> &str {
            "inner"
        }

        fn emits(&self) -> Vec<String> {
            vec!["ready".into()]
        }

        fn component_did_mount(&self, ctx: &mut ComponentCtx<'_>) -> Result<(), RuntimeError> {
            ctx.emit("ready", Vec::<String>::new())?;
            Ok(())
        }
    }

    fn nested_templates() -> TemplateRegistry {
        TemplateRegistry::new()
            .with("outer", |ctx| {
                let middle = if ctx.lookup("show") == Some(&json!(true)) {
                    r#"<component name="Middle" on_done="hide" />"#
                } else {
                    ""
                };
                Ok(format!("<div>{middle}</div>"))
            })
            .with("middle", |ctx| {
                let inner = if ctx.lookup("grown") == Some(&json!(true)) {
                    r#"<component name="Inner" on_ready="inner_ready" />"#
                } else {
                    ""
                };
                Ok(format!(r#"<div><button id="grow" on_click="grow()">grow</button>{inner}</div>"#))
            })
            .with("inner", |_| Ok("<label>inner</label>".into()))
    }

    #[test]
    fn unmount_mid_render_tears_down_new_children() {
        let mut rt = Runtime::new(HeadlessAdapter::new(), nested_templates());
        let root = rt.mount_root(Outer, Props::new()).unwrap();
        let middle = rt.child(root, "Middle").unwrap();
        let grow = rt.find_by_id(middle, "grow").unwrap();
        rt.drain_lifecycle();

        assert!(rt.dispatch(WidgetEvent::clicked(grow)).unwrap());

        assert!(!rt.contains(middle));
        assert_eq!(rt.len(), 1);
        assert!(rt.children(root).unwrap().is_empty());
        assert_eq!(rt.state(root).unwrap()["show"], json!(false));
        let events = rt.drain_lifecycle();
        assert!(
            matches!(
                events.as_slice(),
                [
                    LifecycleEvent::Mount(inner),
                    LifecycleEvent::Update(updated),
                    LifecycleEvent::Unmount(gone),
                    LifecycleEvent::Unmount(last),
                ] if inner == gone && *updated == root && *last == middle
            ),
            "{events:?}"
        );
    }

    #[derive(Default)]
    struct Brittle;

    impl Component for Brittle {
        fn name(&self) -> &str {
            "Brittle"
        }

        fn template(&self) -> &str {
            "brittle"
        }

        fn component_did_mount(&self, _ctx: &mut ComponentCtx<'_>) -> Result<(), RuntimeError> {
            Err(RuntimeError::handler("not ready"))
        }
    }

    #[derive(Default)]
    struct Holder;

    impl Component for Holder {
        fn name(&self) -> &str {
            "Holder"
        }

        fn template(&self) -> &str {
            "holder"
        }

        fn components(&self, registry: &mut crate::runtime::ComponentRegistry) {
            registry.register::<Brittle>();
        }
    }

    #[test]
    fn failed_child_mount_is_unmounted() {
        let templates = TemplateRegistry::new()
            .with("holder", |_| Ok(r#"<div><component name="Brittle" /></div>"#.into()))
            .with("brittle", |_| Ok("<label>brittle</label>".into()));
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates);

        let err = rt.mount_root(Holder, Props::new()).unwrap_err();

        assert!(matches!(err, RuntimeError::Handler(_)));
        let root = rt.root().unwrap();
        assert_eq!(rt.len(), 1);
        assert!(rt.children(root).unwrap().is_empty());
        let events = rt.drain_lifecycle();
        assert!(matches!(
            events.as_slice(),
            [LifecycleEvent::Mount(a), LifecycleEvent::Unmount(b)] if a == b && *a != root
        ));
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Field;

    impl Component for Field {
        fn name(&self) -> &str {
            "Field"
        }

        fn template(&self) -> &str {
            "field"
        }

        fn initial_state(&self, _props: &Props) -> Value {
            json!({"draft": ""})
        }

        fn methods(&self, methods: &mut Methods) {
            methods
                .add("typed", |ctx, args| {
                    let value = args.first().cloned().unwrap_or_default();
                    ctx.set_state_with(json!({"draft": value}), false)?;
                    Ok(())
                })
                .add("submit", |ctx, _| {
                    ctx.set_state(json!({"draft": ""}))?;
                    Ok(())
                });
        }
    }

    #[test]
    fn typed_text_is_cleared_by_reset_state() {
        let templates = TemplateRegistry::new().with("field", |ctx| {
            Ok(format!(
                r#"<div><input id="draft" value="{}" on_change="typed" /><button id="go" on_click="submit()">Add</button></div>"#,
                ctx.text("draft")
            ))
        });
        let mut rt = Runtime::new(HeadlessAdapter::new(), templates);
        let id = rt.mount_root(Field, Props::new()).unwrap();
        let input = rt.find_by_id(id, "draft").unwrap();
        let button = rt.find_by_id(id, "go").unwrap();

        rt.adapter_mut().set_text(input, "milk").unwrap();
        rt.dispatch(WidgetEvent {
            widget: input,
            kind: WidgetEventKind::TextChanged("milk".into()),
        })
        .unwrap();
        assert_eq!(rt.state(id).unwrap()["draft"], "milk");

        rt.dispatch(WidgetEvent::clicked(button)).unwrap();
        assert_eq!(headless(&rt).widget(input).unwrap().text, "");
        let committed: &Attributes = rt
            .reconciler(id)
            .unwrap()
            .get(rt.reconciler(id).unwrap().state_of(input).unwrap())
            .unwrap()
            .attributes();
        assert_eq!(committed.get("value").map(String::as_str), Some(""));
    }
}
