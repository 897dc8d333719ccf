//! Reconciler: diffs desired element trees against mounted widgets.
//!
//! Each component owns one [`Reconciler`]. It keeps an arena of
//! [`ElementState`]s (one per widget it created), the listeners bound to
//! those widgets and the component's element refs. A pass compares a fresh
//! [`ElementNode`] tree against the committed states and issues the minimal
//! adapter calls to converge:
//!
//! - different type (tag, or component name): the old subtree is detached and
//!   destroyed, a new one is mounted in its place;
//! - same type: recognized attribute deltas and changed text are applied to
//!   the existing widget and children are reconciled by key.

mod context;
mod diff;
mod state;

use std::collections::BTreeMap;

use slotmap::SlotMap;

pub use context::{Embed, EmbedUpdate, ReconcileContext, StandaloneContext};
pub use state::{ChildKey, ElementState, RefTarget, StateId};

use crate::adapter::WidgetHandle;
use crate::element::ElementNode;
use crate::event::{EventKind, ListenerRegistry, MethodCall, WidgetEventKind};
use crate::runtime::RuntimeError;
use diff::Pass;

/// Committed element tree of one component.
#[derive(Debug, Default)]
pub struct Reconciler {
    states: SlotMap<StateId, ElementState>,
    root: Option<StateId>,
    listeners: ListenerRegistry,
    refs: BTreeMap<String, RefTarget>,
    passes: usize,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile `desired` as the single root inside `host`.
    ///
    /// The root widget lives at index 0 of `host`. Returns the live root
    /// widget, or `None` if the root element has no widget mapping.
    pub fn reconcile_root(
        &mut self,
        cx: &mut dyn ReconcileContext,
        host: WidgetHandle,
        desired: &ElementNode,
    ) -> Result<Option<WidgetHandle>, RuntimeError> {
        self.passes += 1;
        let config = cx.config().clone();
        let mut pass = Pass::new(cx, &config);

        let previous = self.root;
        let previous_widget = previous.map(|id| self.states[id].widget);
        let next = self.reconcile_node(&mut pass, previous, desired, Some(host))?;
        self.root = next;

        let widget = next.map(|id| self.states[id].widget);
        if let Some(widget) = widget.filter(|w| Some(*w) != previous_widget) {
            pass.cx.adapter().insert_child(host, widget, 0)?;
        }
        tracing::debug!(pass = self.passes, states = self.states.len(), "reconciled tree");
        Ok(widget)
    }

    /// Reconcile one node against an optional previous state.
    ///
    /// When `previous` is replaced it is detached from `parent` and
    /// destroyed; the new widget is returned detached for the caller to place.
    pub fn reconcile(
        &mut self,
        cx: &mut dyn ReconcileContext,
        previous: Option<StateId>,
        desired: &ElementNode,
        parent: Option<WidgetHandle>,
    ) -> Result<Option<StateId>, RuntimeError> {
        let config = cx.config().clone();
        let mut pass = Pass::new(cx, &config);
        self.reconcile_node(&mut pass, previous, desired, parent)
    }

    /// Tear down the whole tree.
    ///
    /// Listeners, refs and child components are released. The root widget
    /// is destroyed only if `destroy` is set; otherwise it is left to
    /// whoever owns the surrounding widget.
    pub fn teardown_all(
        &mut self,
        cx: &mut dyn ReconcileContext,
        destroy: bool,
    ) -> Result<(), RuntimeError> {
        let Some(root) = self.root.take() else {
            return Ok(());
        };
        let config = cx.config().clone();
        let mut pass = Pass::new(cx, &config);
        self.teardown(&mut pass, root, destroy)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn root(&self) -> Option<StateId> {
        self.root
    }

    pub fn root_widget(&self) -> Option<WidgetHandle> {
        self.root.map(|id| self.states[id].widget)
    }

    pub fn get(&self, id: StateId) -> Option<&ElementState> {
        self.states.get(id)
    }

    /// Number of mounted element states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// How many root passes have run.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// First element in document order whose `id` attribute matches.
    pub fn find_by_id(&self, id: &str) -> Option<StateId> {
        let mut stack: Vec<StateId> = self.root.into_iter().collect();
        while let Some(current) = stack.pop() {
            let state = &self.states[current];
            if state.attr("id") == Some(id) {
                return Some(current);
            }
            stack.extend(state.children.iter().rev().copied());
        }
        None
    }

    /// The state holding `widget`, if this reconciler created it.
    pub fn state_of(&self, widget: WidgetHandle) -> Option<StateId> {
        self.states
            .iter()
            .find(|(_, s)| s.widget == widget)
            .map(|(id, _)| id)
    }

    pub fn ref_target(&self, name: &str) -> Option<RefTarget> {
        self.refs.get(name).copied()
    }

    pub fn refs(&self) -> &BTreeMap<String, RefTarget> {
        &self.refs
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// The call bound to `event` on `widget`.
    pub fn listener(&self, widget: WidgetHandle, event: EventKind) -> Option<&MethodCall> {
        self.listeners.resolve(widget, event)
    }

    /// Fold a user edit back into the committed state of `widget`.
    ///
    /// The widget already shows the new value, so the next pass diffs the
    /// template against what is on screen.
    pub(crate) fn record_input(&mut self, widget: WidgetHandle, event: &WidgetEventKind) {
        let Some(id) = self.state_of(widget) else {
            return;
        };
        let state = &mut self.states[id];
        match event {
            WidgetEventKind::TextChanged(value) => {
                if let Some(committed) = state.attributes.get_mut("value") {
                    committed.clone_from(value);
                } else {
                    state.text.clone_from(value);
                }
            }
            WidgetEventKind::Toggled(checked) => {
                if let Some(committed) = state.attributes.get_mut("checked") {
                    *committed = checked.to_string();
                }
            }
            WidgetEventKind::Clicked => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{WidgetAdapter, WidgetKind};
    use crate::runtime::RuntimeConfig;
    use crate::testing::headless::{HeadlessAdapter, Op};
    use pretty_assertions::assert_eq;

    fn host(adapter: &mut HeadlessAdapter) -> WidgetHandle {
        let host = adapter.create_widget(WidgetKind::Container).unwrap();
        adapter.clear_ops();
        host
    }

    fn pass(
        rec: &mut Reconciler,
        adapter: &mut HeadlessAdapter,
        host: WidgetHandle,
        node: &ElementNode,
    ) -> Option<WidgetHandle> {
        let mut cx = StandaloneContext::new(adapter).with_methods(["add", "remove"]);
        rec.reconcile_root(&mut cx, host, node).unwrap()
    }

    fn keyed_list(ids: &[&str]) -> ElementNode {
        ElementNode::new("div").with_children(
            ids.iter()
                .map(|id| ElementNode::new("label").with_attr("id", *id).with_text(*id)),
        )
    }

    // -----------------------------------------------------------------------
    // Root
    // -----------------------------------------------------------------------

    #[test]
    fn first_pass_mounts_into_host() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let root = pass(&mut rec, &mut adapter, host, &keyed_list(&["a", "b"])).unwrap();

        assert_eq!(adapter.children(host), vec![root]);
        assert_eq!(adapter.children(root).len(), 2);
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.passes(), 1);
    }

    #[test]
    fn identical_tree_issues_no_mutations() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let tree = keyed_list(&["a", "b"]).with_attr("style", "color: blue");

        pass(&mut rec, &mut adapter, host, &tree);
        adapter.clear_ops();
        pass(&mut rec, &mut adapter, host, &tree.clone());

        assert!(adapter.ops().is_empty(), "{:?}", adapter.ops());
    }

    #[test]
    fn value_change_keeps_handle() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let first = pass(&mut rec, &mut adapter, host, &ElementNode::new("input").with_attr("value", "a"));
        adapter.clear_ops();
        let second = pass(&mut rec, &mut adapter, host, &ElementNode::new("input").with_attr("value", "b"));

        assert_eq!(first, second);
        let h = second.unwrap();
        assert_eq!(adapter.ops(), &[Op::SetText(h, "b".into())]);
    }

    #[test]
    fn root_type_change_replaces_widget() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let old = pass(&mut rec, &mut adapter, host, &ElementNode::new("label").with_text("x")).unwrap();
        let new = pass(&mut rec, &mut adapter, host, &ElementNode::new("button").with_text("x")).unwrap();

        assert_ne!(old, new);
        assert!(adapter.ops().contains(&Op::Destroy(old)));
        assert_eq!(adapter.children(host), vec![new]);
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn unknown_root_type_is_skipped() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        assert_eq!(pass(&mut rec, &mut adapter, host, &ElementNode::new("marquee")), None);
        assert!(adapter.children(host).is_empty());
        assert!(rec.is_empty());
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    #[test]
    fn keyed_children_shift() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let root = pass(&mut rec, &mut adapter, host, &keyed_list(&["a", "b", "c"])).unwrap();
        let before = adapter.children(root);
        adapter.clear_ops();

        pass(&mut rec, &mut adapter, host, &keyed_list(&["b", "c", "d"]));
        let after = adapter.children(root);

        assert_eq!(&after[..2], &before[1..]);
        let d = after[2];
        assert_eq!(
            adapter.ops(),
            &[
                Op::Create(d, WidgetKind::Label),
                Op::SetText(d, "d".into()),
                Op::Remove(root, before[0]),
                Op::Destroy(before[0]),
                Op::Insert(root, d, 2),
            ]
        );
    }

    #[test]
    fn reordered_children_are_moved_not_recreated() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let root = pass(&mut rec, &mut adapter, host, &keyed_list(&["a", "b", "c"])).unwrap();
        let before = adapter.children(root);
        pass(&mut rec, &mut adapter, host, &keyed_list(&["c", "a", "b"]));

        assert_eq!(adapter.children(root), vec![before[2], before[0], before[1]]);
        assert!(!adapter.ops().iter().any(|op| matches!(op, Op::Destroy(_))));
    }

    #[test]
    fn content_keys_match_duplicates_in_order() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let list = |n: usize| {
            ElementNode::new("div")
                .with_children((0..n).map(|_| ElementNode::new("label").with_text("same")))
        };

        let root = pass(&mut rec, &mut adapter, host, &list(3)).unwrap();
        let before = adapter.children(root);
        pass(&mut rec, &mut adapter, host, &list(2));

        assert_eq!(adapter.children(root), before[..2].to_vec());
    }

    #[test]
    fn changed_child_type_is_replaced_in_place() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let tree = |tag: &str| {
            ElementNode::new("div")
                .with_child(ElementNode::new("label").with_text("first"))
                .with_child(ElementNode::new(tag).with_attr("id", "x"))
                .with_child(ElementNode::new("label").with_text("last"))
        };

        let root = pass(&mut rec, &mut adapter, host, &tree("label")).unwrap();
        let before = adapter.children(root);
        pass(&mut rec, &mut adapter, host, &tree("checkbox"));
        let after = adapter.children(root);

        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_ne!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
        assert_eq!(adapter.widget(after[1]).unwrap().kind, WidgetKind::Checkbox);
    }

    #[test]
    fn nested_teardown_destroys_only_top_widget() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();

        let inner = ElementNode::new("div")
            .with_attr("id", "inner")
            .with_child(ElementNode::new("button").with_attr("on_click", "add()"));
        let root = pass(&mut rec, &mut adapter, host, &ElementNode::new("div").with_child(inner)).unwrap();
        assert_eq!(rec.listeners().len(), 1);
        let inner_widget = adapter.children(root)[0];

        adapter.clear_ops();
        pass(&mut rec, &mut adapter, host, &ElementNode::new("div"));

        let destroys: Vec<_> = adapter
            .ops()
            .iter()
            .filter(|op| matches!(op, Op::Destroy(_)))
            .collect();
        assert_eq!(destroys, vec![&Op::Destroy(inner_widget)]);
        assert!(rec.listeners().is_empty());
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn unknown_child_types_are_skipped() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let tree = ElementNode::new("div")
            .with_child(ElementNode::new("blink"))
            .with_child(ElementNode::new("label").with_text("ok"));

        let root = pass(&mut rec, &mut adapter, host, &tree).unwrap();
        assert_eq!(adapter.children(root).len(), 1);
    }

    // -----------------------------------------------------------------------
    // Focus guard
    // -----------------------------------------------------------------------

    #[test]
    fn focused_input_keeps_value_until_blur() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let input = |v: &str| ElementNode::new("input").with_attr("value", v);

        let h = pass(&mut rec, &mut adapter, host, &input("")).unwrap();
        adapter.focus(h);
        adapter.set_text(h, "typed").unwrap();

        pass(&mut rec, &mut adapter, host, &input("server"));
        assert_eq!(adapter.widget(h).unwrap().text, "typed");

        adapter.blur();
        pass(&mut rec, &mut adapter, host, &input("server"));
        assert_eq!(adapter.widget(h).unwrap().text, "server");
    }

    #[test]
    fn guard_can_be_disabled() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let config = RuntimeConfig::new().with_guard_focused_inputs(false);

        let mut cx = StandaloneContext::new(&mut adapter).with_config(config.clone());
        let h = rec
            .reconcile_root(&mut cx, host, &ElementNode::new("input"))
            .unwrap()
            .unwrap();
        adapter.focus(h);

        let mut cx = StandaloneContext::new(&mut adapter).with_config(config);
        rec.reconcile_root(&mut cx, host, &ElementNode::new("input").with_attr("value", "v"))
            .unwrap();
        assert_eq!(adapter.widget(h).unwrap().text, "v");
    }

    // -----------------------------------------------------------------------
    // Lookup, refs, listeners
    // -----------------------------------------------------------------------

    #[test]
    fn find_by_id_and_refs() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let tree = ElementNode::new("div").with_child(
            ElementNode::new("input")
                .with_attr("id", "new-todo")
                .with_attr("ref", "field"),
        );

        let root = pass(&mut rec, &mut adapter, host, &tree).unwrap();
        let field = adapter.children(root)[0];

        let id = rec.find_by_id("new-todo").unwrap();
        assert_eq!(rec.get(id).unwrap().widget(), field);
        assert_eq!(rec.ref_target("field"), Some(RefTarget::Element(field)));

        pass(&mut rec, &mut adapter, host, &ElementNode::new("div"));
        assert!(rec.find_by_id("new-todo").is_none());
        assert!(rec.refs().is_empty());
    }

    #[test]
    fn listener_follows_attribute_changes() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let button = |call: &str| ElementNode::new("button").with_attr("on_click", call);

        let h = pass(&mut rec, &mut adapter, host, &button("add()")).unwrap();
        assert_eq!(rec.listener(h, EventKind::Click).unwrap().method, "add");

        pass(&mut rec, &mut adapter, host, &button("remove(1)"));
        let call = rec.listener(h, EventKind::Click).unwrap();
        assert_eq!((call.method.as_str(), call.args.as_slice()), ("remove", &["1".to_owned()][..]));
    }

    #[test]
    fn missing_component_renders_marker() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        let node = ElementNode::new("component").with_attr("name", "Nope");

        let marker = pass(&mut rec, &mut adapter, host, &node).unwrap();
        let widget = adapter.widget(marker).unwrap();
        assert_eq!(widget.kind, WidgetKind::Label);
        assert_eq!(widget.text, "Component not found: Nope");
        assert_eq!(widget.style.get("color"), Some("red"));

        adapter.clear_ops();
        assert_eq!(pass(&mut rec, &mut adapter, host, &node), Some(marker));
        assert!(adapter.ops().is_empty());
    }

    #[test]
    fn teardown_all_releases_everything() {
        let mut adapter = HeadlessAdapter::new();
        let host = host(&mut adapter);
        let mut rec = Reconciler::new();
        pass(&mut rec, &mut adapter, host, &keyed_list(&["a"]));

        let mut cx = StandaloneContext::new(&mut adapter);
        rec.teardown_all(&mut cx, false).unwrap();
        assert!(rec.is_empty());
        assert!(rec.root().is_none());
    }
}
