//! The handle a component method or hook works through.

use std::collections::BTreeSet;

use serde_json::Value;

use super::{ComponentId, Runtime, RuntimeError, State};
use crate::adapter::{WidgetAdapter, WidgetHandle};
use crate::props::Props;
use crate::reconcile::RefTarget;

/// Scoped access to the runtime on behalf of one component.
pub struct ComponentCtx<'a> {
    runtime: &'a mut Runtime,
    id: ComponentId,
}

impl<'a> ComponentCtx<'a> {
    pub(crate) fn new(runtime: &'a mut Runtime, id: ComponentId) -> Self {
        Self { runtime, id }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.runtime.component_name(self.id).unwrap_or_default()
    }

    pub fn state(&self) -> Option<&State> {
        self.runtime.state(self.id)
    }

    /// One top-level state value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state()?.get(key)
    }

    pub fn props(&self) -> Option<&Props> {
        self.runtime.props(self.id)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props()?.get(key)
    }

    /// Evaluate a computed value against current state.
    pub fn computed(&self, name: &str) -> Option<Value> {
        self.runtime.computed(self.id, name)
    }

    /// Merge into state and re-render if anything changed.
    pub fn set_state(&mut self, partial: Value) -> Result<BTreeSet<String>, RuntimeError> {
        self.runtime.set_state(self.id, partial)
    }

    /// Merge into state, re-rendering only when `rerender` is set.
    pub fn set_state_with(
        &mut self,
        partial: Value,
        rerender: bool,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        self.runtime.set_state_with(self.id, partial, rerender)
    }

    /// Emit an event to the parent method bound through `on_<event>`.
    pub fn emit<I, S>(&mut self, event: &str, args: I) -> Result<bool, RuntimeError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let args = args.into_iter().map(|a| a.to_string()).collect();
        self.runtime.emit(self.id, event, args)
    }

    /// Call another method of this component.
    pub fn call(&mut self, method: &str, args: &[String]) -> Result<(), RuntimeError> {
        self.runtime.call_method(self.id, method, args)
    }

    pub fn ref_target(&self, name: &str) -> Option<RefTarget> {
        self.runtime.ref_target(self.id, name)
    }

    pub fn find_by_id(&self, element_id: &str) -> Option<WidgetHandle> {
        self.runtime.find_by_id(self.id, element_id)
    }

    /// A mounted child component by its `id` attribute or name.
    pub fn child(&self, key: &str) -> Option<ComponentId> {
        self.runtime.child(self.id, key)
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.runtime.parent(self.id)
    }

    pub fn adapter(&mut self) -> &mut dyn WidgetAdapter {
        self.runtime.adapter_mut()
    }

    pub fn runtime(&mut self) -> &mut Runtime {
        self.runtime
    }
}
