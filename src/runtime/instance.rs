//! A live component: its behavior plus everything it owns.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::component::{Component, ComponentId, ComponentRegistry, Computed, Methods};
use super::State;
use crate::adapter::WidgetHandle;
use crate::event::MethodCall;
use crate::props::{Props, PropsSchema};
use crate::reconcile::Reconciler;

pub(crate) struct ComponentInstance {
    pub(crate) behavior: Rc<dyn Component>,
    pub(crate) name: String,
    pub(crate) template: String,
    pub(crate) schema: PropsSchema,
    pub(crate) emits: Vec<String>,
    pub(crate) state: State,
    pub(crate) props: Props,
    pub(crate) computed: Computed,
    pub(crate) methods: Methods,
    pub(crate) registry: ComponentRegistry,
    /// Emitted event name → parent method bound through `on_<event>`.
    pub(crate) events: BTreeMap<String, MethodCall>,
    pub(crate) parent: Option<ComponentId>,
    /// Mounted child components, keyed by their `id` attribute or name.
    pub(crate) children: BTreeMap<String, ComponentId>,
    pub(crate) reconciler: Reconciler,
    /// Main widget; created on first render and never replaced.
    pub(crate) host: Option<WidgetHandle>,
    /// Inline template-error label inside the main widget.
    pub(crate) diagnostic: Option<WidgetHandle>,
    pub(crate) mounted: bool,
    pub(crate) rendering: bool,
    pub(crate) pending: bool,
    /// Unmount requested mid-render; holds whether the host is destroyed.
    pub(crate) doomed: Option<bool>,
}

impl ComponentInstance {
    pub(crate) fn new(
        behavior: Rc<dyn Component>,
        schema: PropsSchema,
        emits: Vec<String>,
        state: State,
        props: Props,
        parent: Option<ComponentId>,
    ) -> Self {
        let mut methods = Methods::new();
        behavior.methods(&mut methods);
        let mut computed = Computed::new();
        behavior.computed(&mut computed);
        let mut registry = ComponentRegistry::new();
        behavior.components(&mut registry);

        Self {
            name: behavior.name().to_owned(),
            template: behavior.template().to_owned(),
            behavior,
            schema,
            emits,
            state,
            props,
            computed,
            methods,
            registry,
            events: BTreeMap::new(),
            parent,
            children: BTreeMap::new(),
            reconciler: Reconciler::new(),
            host: None,
            diagnostic: None,
            mounted: false,
            rendering: false,
            pending: false,
            doomed: None,
        }
    }
}
