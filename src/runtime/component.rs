//! The Component trait and the tables a component declares.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};
use slotmap::new_key_type;

use super::{ComponentCtx, RuntimeError, State};
use crate::event::MethodLookup;
use crate::props::{Props, PropsSchema};

new_key_type! {
    /// Handle to a component instance in the runtime's arena.
    pub struct ComponentId;
}

/// Behavior of a component type.
///
/// A component names its template, declares its props schema, emitted
/// events, methods, computed values and embeddable child components, and
/// may hook into mount/unmount. Everything except `name` and `template` has
/// a default.
///
/// ```
/// use gilt_reconcile::runtime::{Component, Methods};
/// use serde_json::{json, Value};
/// # use gilt_reconcile::props::Props;
///
/// #[derive(Default)]
/// struct Counter;
///
/// impl Component for Counter {
///     fn name(&self) -> &str { "Counter" }
///     fn template(&self) -> &str { "counter" }
///     fn initial_state(&self, _props: &Props) -> Value { json!({"count": 0}) }
///     fn methods(&self, methods: &mut Methods) {
///         methods.add("increment", |ctx, _args| {
///             let n = ctx.get("count").and_then(Value::as_i64).unwrap_or(0);
///             ctx.set_state(json!({"count": n + 1}))?;
///             Ok(())
///         });
///     }
/// }
/// ```
pub trait Component: 'static {
    /// Name used for lookup and diagnostics.
    fn name(&self) -> &str;

    /// Template name handed to the template engine.
    fn template(&self) -> &str;

    fn props_schema(&self) -> PropsSchema {
        PropsSchema::new(self.name())
    }

    /// Events this component may emit to its parent.
    fn emits(&self) -> Vec<String> {
        Vec::new()
    }

    /// Initial state; must be a JSON object (or null for empty).
    fn initial_state(&self, _props: &Props) -> Value {
        Value::Object(Map::new())
    }

    fn methods(&self, _methods: &mut Methods) {}

    fn computed(&self, _computed: &mut Computed) {}

    /// Child component types this component's template may embed.
    fn components(&self, _registry: &mut ComponentRegistry) {}

    /// Called once, after the first successful render.
    fn component_did_mount(&self, _ctx: &mut ComponentCtx<'_>) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Called when the component is torn down.
    fn component_did_unmount(&self) {}

    /// Called on a parent before a child component re-renders itself.
    fn child_updated(
        &self,
        _ctx: &mut ComponentCtx<'_>,
        _child: ComponentId,
    ) -> Result<(), RuntimeError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// A component method. Receives the literal argument tokens of the call.
pub type Method = Rc<dyn Fn(&mut ComponentCtx<'_>, &[String]) -> Result<(), RuntimeError>>;

/// Methods exposed to the template and event bindings.
#[derive(Clone, Default)]
pub struct Methods {
    methods: BTreeMap<String, Method>,
}

impl Methods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method, replacing one of the same name.
    pub fn add<F>(&mut self, name: impl Into<String>, method: F) -> &mut Self
    where
        F: Fn(&mut ComponentCtx<'_>, &[String]) -> Result<(), RuntimeError> + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn get(&self, name: &str) -> Option<Method> {
        self.methods.get(name).cloned()
    }

    /// Method names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl MethodLookup for Methods {
    fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// Computed
// ---------------------------------------------------------------------------

/// A computed value: a pure function of state.
pub type ComputedFn = Rc<dyn Fn(&State) -> Value>;

/// Named computed values.
#[derive(Clone, Default)]
pub struct Computed {
    values: BTreeMap<String, ComputedFn>,
}

impl Computed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, name: impl Into<String>, compute: F) -> &mut Self
    where
        F: Fn(&State) -> Value + 'static,
    {
        self.values.insert(name.into(), Rc::new(compute));
        self
    }

    /// Evaluate one value.
    pub fn evaluate(&self, name: &str, state: &State) -> Option<Value> {
        self.values.get(name).map(|f| f(state))
    }

    /// Evaluate every value against `state`.
    pub fn evaluate_all(&self, state: &State) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(name, f)| (name.clone(), f(state)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

type Factory = Rc<dyn Fn() -> Box<dyn Component>>;

/// A registered component type. Schema and emitted events are read once,
/// at registration.
#[derive(Clone)]
pub struct Registration {
    name: String,
    factory: Factory,
    schema: PropsSchema,
    emits: Vec<String>,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &PropsSchema {
        &self.schema
    }

    pub fn emits(&self) -> &[String] {
        &self.emits
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("emits", &self.emits)
            .finish()
    }
}

/// Component types embeddable by name through `<component name="...">`.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: BTreeMap<String, Registration>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `Default`-constructible component under its own name.
    pub fn register<C: Component + Default>(&mut self) -> &mut Self {
        self.register_with(C::default)
    }

    /// Register a component factory under the component's own name.
    pub fn register_with<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        let name = factory().name().to_owned();
        self.register_as(name, factory)
    }

    /// Register a component factory under an explicit name.
    pub fn register_as<C, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        let prototype = factory();
        let name = name.into();
        let registration = Registration {
            name: name.clone(),
            schema: prototype.props_schema(),
            emits: prototype.emits(),
            factory: Rc::new(move || Box::new(factory()) as Box<dyn Component>),
        };
        self.entries.insert(name, registration);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
