//! The diff itself: mount, patch, keyed children, teardown.

use std::collections::{HashMap, HashSet, VecDeque};

use super::context::{Embed, EmbedUpdate, ReconcileContext};
use super::state::{ChildKey, ElementState, RefTarget, StateId};
use super::Reconciler;
use crate::adapter::{WidgetHandle, WidgetKind};
use crate::element::node::EMPTY_ATTRIBUTES;
use crate::element::{ElementKind, ElementNode, PatchOptions, Style};
use crate::event::bind_element;
use crate::runtime::{RuntimeConfig, RuntimeError};

/// One reconciliation pass: the context plus options derived from its config.
pub(crate) struct Pass<'c, 'o> {
    pub(crate) cx: &'c mut dyn ReconcileContext,
    options: PatchOptions<'o>,
    diagnostic_style: &'o str,
}

impl<'c, 'o> Pass<'c, 'o> {
    pub(crate) fn new(cx: &'c mut dyn ReconcileContext, config: &'o RuntimeConfig) -> Self {
        Self {
            cx,
            options: PatchOptions {
                guard_focus: config.guard_focused_inputs,
                default_button_text: &config.default_button_text,
            },
            diagnostic_style: &config.diagnostic_style,
        }
    }
}

impl Reconciler {
    /// Reconcile one node against its previous state.
    ///
    /// Returns the state now representing `desired`, or `None` when the node
    /// has no widget mapping. When the previous node is replaced it is
    /// detached from `parent`; placing the new widget is up to the caller.
    pub(crate) fn reconcile_node(
        &mut self,
        pass: &mut Pass<'_, '_>,
        previous: Option<StateId>,
        desired: &ElementNode,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<StateId>, RuntimeError> {
        if desired.kind().is_none() {
            tracing::warn!(tag = desired.tag(), "unknown element type, skipping node");
            if let Some(prev) = previous {
                self.remove_subtree(pass, prev, parent)?;
            }
            return Ok(None);
        }

        if let Some(prev) = previous {
            if self.same_type(prev, desired) && self.patch(pass, prev, desired)? {
                return Ok(Some(prev));
            }
            tracing::debug!(
                from = self.states[prev].tag(),
                to = desired.tag(),
                "replacing node"
            );
            self.remove_subtree(pass, prev, parent)?;
        }
        self.mount(pass, desired)
    }

    fn same_type(&self, id: StateId, node: &ElementNode) -> bool {
        let state = &self.states[id];
        if state.tag != node.tag() {
            return false;
        }
        state.kind != ElementKind::Component || state.attr("name") == node.attr("name")
    }

    // -----------------------------------------------------------------------
    // Mount
    // -----------------------------------------------------------------------

    /// Create the widget subtree for `node`. The new top widget is detached.
    pub(crate) fn mount(
        &mut self,
        pass: &mut Pass<'_, '_>,
        node: &ElementNode,
    ) -> Result<Option<StateId>, RuntimeError> {
        let Some(kind) = node.kind() else {
            tracing::warn!(tag = node.tag(), "unknown element type, skipping node");
            return Ok(None);
        };
        let Some(widget_kind) = kind.widget_kind() else {
            return self.mount_component(pass, node).map(Some);
        };

        let options = pass.options;
        let adapter = pass.cx.adapter();
        let widget = adapter.create_widget(widget_kind)?;
        kind.apply_attributes(adapter, widget, &EMPTY_ATTRIBUTES, node.attributes(), options)?;
        kind.mount_text(adapter, widget, node.text(), options)?;

        bind_element(
            &mut self.listeners,
            kind,
            widget,
            node.attributes(),
            pass.cx.methods(),
        );
        self.set_ref(None, node.attr("ref"), RefTarget::Element(widget));

        let id = self
            .states
            .insert(ElementState::from_node(node, kind, widget, None));
        tracing::trace!(tag = node.tag(), ?widget, "mounted element");

        if kind.is_container() {
            let mut children = Vec::with_capacity(node.children().len());
            for child in node.children() {
                if let Some(child_id) = self.mount(pass, child)? {
                    let child_widget = self.states[child_id].widget;
                    pass.cx
                        .adapter()
                        .insert_child(widget, child_widget, children.len())?;
                    children.push(child_id);
                }
            }
            self.states[id].children = children;
        } else if !node.children().is_empty() {
            tracing::debug!(tag = node.tag(), "ignoring children of a non-container element");
        }

        Ok(Some(id))
    }

    fn mount_component(
        &mut self,
        pass: &mut Pass<'_, '_>,
        node: &ElementNode,
    ) -> Result<StateId, RuntimeError> {
        let (widget, component) = match pass.cx.mount_component(node)? {
            Embed::Mounted { id, widget } => (widget, Some(id)),
            Embed::NotFound(name) => {
                tracing::warn!(component = %name, "component not found");
                let text = format!("Component not found: {name}");
                (self.marker(pass, &text)?, None)
            }
            Embed::Invalid { name, error } => {
                tracing::warn!(component = %name, %error, "invalid component props");
                let text = format!("Invalid component {name}: {error}");
                (self.marker(pass, &text)?, None)
            }
        };

        let target = match component {
            Some(c) => RefTarget::Component(c),
            None => RefTarget::Element(widget),
        };
        self.set_ref(None, node.attr("ref"), target);

        let state = ElementState::from_node(node, ElementKind::Component, widget, component);
        Ok(self.states.insert(state))
    }

    /// Inline diagnostic shown in place of a component that failed to mount.
    fn marker(&mut self, pass: &mut Pass<'_, '_>, text: &str) -> Result<WidgetHandle, RuntimeError> {
        let style = Style::parse(pass.diagnostic_style);
        let adapter = pass.cx.adapter();
        let widget = adapter.create_widget(WidgetKind::Label)?;
        adapter.set_text(widget, text)?;
        adapter.set_style(widget, &style)?;
        Ok(widget)
    }

    // -----------------------------------------------------------------------
    // Patch
    // -----------------------------------------------------------------------

    /// Patch a node of the same type in place. Returns `false` when the node
    /// must be replaced instead.
    fn patch(
        &mut self,
        pass: &mut Pass<'_, '_>,
        id: StateId,
        node: &ElementNode,
    ) -> Result<bool, RuntimeError> {
        let kind = self.states[id].kind;
        if kind == ElementKind::Component {
            return self.patch_component(pass, id, node);
        }

        let widget = self.states[id].widget;
        let options = pass.options;

        if self.states[id].attributes != *node.attributes() {
            let old = &self.states[id].attributes;
            let report =
                kind.apply_attributes(pass.cx.adapter(), widget, old, node.attributes(), options)?;
            let old_ref = old.get("ref").cloned();
            let old_value = old.get("value").cloned();

            bind_element(
                &mut self.listeners,
                kind,
                widget,
                node.attributes(),
                pass.cx.methods(),
            );
            self.set_ref(old_ref.as_deref(), node.attr("ref"), RefTarget::Element(widget));

            let mut committed = node.attributes().clone();
            if report.value_guarded {
                match old_value {
                    Some(v) => committed.insert("value".to_owned(), v),
                    None => committed.remove("value"),
                };
            }
            tracing::trace!(tag = node.tag(), ?widget, mutations = report.mutations, "patched attributes");
            self.states[id].attributes = committed;
        }

        if self.states[id].text != node.text() {
            if kind.apply_text(pass.cx.adapter(), widget, node.text(), options)? {
                self.states[id].text = node.text().to_owned();
            }
        }

        if kind.is_container() {
            self.reconcile_children(pass, id, widget, node.children())?;
        }
        Ok(true)
    }

    fn patch_component(
        &mut self,
        pass: &mut Pass<'_, '_>,
        id: StateId,
        node: &ElementNode,
    ) -> Result<bool, RuntimeError> {
        let Some(component) = self.states[id].component else {
            // A marker stays until the node changes; then mounting is retried.
            return Ok(self.states[id].attributes == *node.attributes());
        };

        match pass.cx.update_component(component, node)? {
            EmbedUpdate::Updated => {
                let old_ref = self.states[id].attributes.get("ref").cloned();
                self.set_ref(
                    old_ref.as_deref(),
                    node.attr("ref"),
                    RefTarget::Component(component),
                );
                let state = &mut self.states[id];
                state.attributes = node.attributes().clone();
                state.text = node.text().to_owned();
                Ok(true)
            }
            EmbedUpdate::Invalid(error) => {
                tracing::warn!(%error, "embedded component rejected new props");
                Ok(false)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    /// Keyed reconciliation of a container's children.
    ///
    /// Previous children are matched by [`ChildKey`]; duplicates of a key are
    /// matched in order. Matched children are patched in place, unmatched
    /// desired children are mounted and inserted at their desired index, and
    /// unmatched previous children are removed and destroyed.
    fn reconcile_children(
        &mut self,
        pass: &mut Pass<'_, '_>,
        id: StateId,
        parent: WidgetHandle,
        desired: &[ElementNode],
    ) -> Result<(), RuntimeError> {
        let previous = std::mem::take(&mut self.states[id].children);

        let mut by_key: HashMap<ChildKey, VecDeque<StateId>> = HashMap::new();
        for &child in &previous {
            by_key
                .entry(self.states[child].key())
                .or_default()
                .push_back(child);
        }

        let mut consumed = HashSet::new();
        let mut next: Vec<(StateId, bool)> = Vec::with_capacity(desired.len());
        for node in desired {
            let matched = by_key
                .get_mut(&ChildKey::of(node))
                .and_then(VecDeque::pop_front);
            if let Some(old) = matched {
                consumed.insert(old);
                if let Some(kept) = self.reconcile_node(pass, Some(old), node, Some(parent))? {
                    next.push((kept, kept != old));
                }
            } else if let Some(fresh) = self.mount(pass, node)? {
                next.push((fresh, true));
            }
        }

        for old in previous.iter().copied().filter(|c| !consumed.contains(c)) {
            tracing::trace!(key = %self.states[old].key(), "removing child");
            self.remove_subtree(pass, old, Some(parent))?;
        }

        // Retained children are still attached in their previous order.
        let retained: HashSet<StateId> = next
            .iter()
            .filter(|(_, fresh)| !fresh)
            .map(|(c, _)| *c)
            .collect();
        let mut live: Vec<WidgetHandle> = previous
            .iter()
            .filter(|c| retained.contains(c))
            .map(|c| self.states[*c].widget)
            .collect();

        for (index, &(child, fresh)) in next.iter().enumerate() {
            let widget = self.states[child].widget;
            if !fresh {
                if live.get(index) == Some(&widget) {
                    continue;
                }
                pass.cx.adapter().remove_child(parent, widget)?;
                live.retain(|w| *w != widget);
            }
            pass.cx.adapter().insert_child(parent, widget, index)?;
            live.insert(index.min(live.len()), widget);
        }

        self.states[id].children = next.into_iter().map(|(c, _)| c).collect();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Detach a subtree from `parent` and tear it down, destroying its widget.
    pub(crate) fn remove_subtree(
        &mut self,
        pass: &mut Pass<'_, '_>,
        id: StateId,
        parent: Option<WidgetHandle>,
    ) -> Result<(), RuntimeError> {
        if let Some(parent) = parent {
            let widget = self.states[id].widget;
            pass.cx.adapter().remove_child(parent, widget)?;
        }
        self.teardown(pass, id, true)
    }

    /// Drop the states of a subtree, its listeners, refs and child
    /// components. Only the top widget is destroyed (and only when
    /// `destroy` is set); the backend releases native children with it.
    pub(crate) fn teardown(
        &mut self,
        pass: &mut Pass<'_, '_>,
        id: StateId,
        destroy: bool,
    ) -> Result<(), RuntimeError> {
        let Some(state) = self.states.remove(id) else {
            return Ok(());
        };
        for child in state.children {
            self.teardown(pass, child, false)?;
        }

        self.listeners.unbind_widget(state.widget);
        self.refs
            .retain(|_, target| !target.points_into(state.widget, state.component));

        if let Some(component) = state.component {
            pass.cx.unmount_component(component)?;
        }
        if destroy {
            pass.cx.adapter().destroy_widget(state.widget)?;
        }
        Ok(())
    }

    fn set_ref(&mut self, old: Option<&str>, new: Option<&str>, target: RefTarget) {
        let new = new.filter(|n| !n.is_empty());
        if let Some(old) = old.filter(|o| Some(*o) != new) {
            if self.refs.get(old) == Some(&target) {
                self.refs.remove(old);
            }
        }
        if let Some(name) = new {
            self.refs.insert(name.to_owned(), target);
        }
    }
}
