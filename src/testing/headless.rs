//! HeadlessAdapter: an in-memory widget backend that records every call.

use std::any::Any;

use slotmap::SlotMap;

use crate::adapter::{AdapterError, WidgetAdapter, WidgetHandle, WidgetKind};
use crate::element::{Layout, Style};

// ---------------------------------------------------------------------------
// Op
// ---------------------------------------------------------------------------

/// One adapter call, as recorded by [`HeadlessAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create(WidgetHandle, WidgetKind),
    Destroy(WidgetHandle),
    SetText(WidgetHandle, String),
    SetPlaceholder(WidgetHandle, String),
    SetStyle(WidgetHandle, Style),
    SetEnabled(WidgetHandle, bool),
    SetVisible(WidgetHandle, bool),
    SetChecked(WidgetHandle, bool),
    SetLayout(WidgetHandle, Layout),
    /// `(parent, child, requested index)`.
    Insert(WidgetHandle, WidgetHandle, usize),
    Remove(WidgetHandle, WidgetHandle),
}

impl Op {
    /// The widget the call targeted (the parent for insert/remove).
    pub fn widget(&self) -> WidgetHandle {
        match self {
            Op::Create(h, _)
            | Op::Destroy(h)
            | Op::SetText(h, _)
            | Op::SetPlaceholder(h, _)
            | Op::SetStyle(h, _)
            | Op::SetEnabled(h, _)
            | Op::SetVisible(h, _)
            | Op::SetChecked(h, _)
            | Op::SetLayout(h, _)
            | Op::Insert(h, _, _)
            | Op::Remove(h, _) => *h,
        }
    }

    /// Whether the call changed a live widget (anything but create/destroy).
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Op::Create(..) | Op::Destroy(_))
    }
}

// ---------------------------------------------------------------------------
// HeadlessWidget
// ---------------------------------------------------------------------------

/// The observable state of one headless widget.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWidget {
    pub kind: WidgetKind,
    pub text: String,
    pub placeholder: String,
    pub style: Style,
    pub enabled: bool,
    pub visible: bool,
    pub checked: bool,
    pub layout: Layout,
    pub parent: Option<WidgetHandle>,
    pub children: Vec<WidgetHandle>,
}

impl HeadlessWidget {
    fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            text: String::new(),
            placeholder: String::new(),
            style: Style::new(),
            enabled: true,
            visible: true,
            checked: false,
            layout: Layout::default(),
            parent: None,
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// HeadlessAdapter
// ---------------------------------------------------------------------------

/// A widget backend without a display.
///
/// Widgets live in a slotmap; every trait call is appended to an op log so
/// tests can assert exactly which mutations a pass issued. Destruction is
/// deferred like a real toolkit's: destroyed widgets stay inspectable until
/// [`flush`](Self::flush).
///
/// ```
/// use gilt_reconcile::adapter::{WidgetAdapter, WidgetKind};
/// use gilt_reconcile::testing::{HeadlessAdapter, Op};
///
/// let mut adapter = HeadlessAdapter::new();
/// let label = adapter.create_widget(WidgetKind::Label).unwrap();
/// adapter.set_text(label, "hi").unwrap();
/// assert_eq!(adapter.ops()[1], Op::SetText(label, "hi".into()));
/// ```
#[derive(Debug, Default)]
pub struct HeadlessAdapter {
    widgets: SlotMap<WidgetHandle, HeadlessWidget>,
    ops: Vec<Op>,
    doomed: Vec<WidgetHandle>,
    focused: Option<WidgetHandle>,
    failing: bool,
}

impl HeadlessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn widget(&self, handle: WidgetHandle) -> Option<&HeadlessWidget> {
        self.widgets.get(handle)
    }

    /// Children of `handle` in order; empty for unknown handles.
    pub fn children(&self, handle: WidgetHandle) -> Vec<WidgetHandle> {
        self.widgets
            .get(handle)
            .map(|w| w.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, handle: WidgetHandle) -> Option<WidgetHandle> {
        self.widgets.get(handle).and_then(|w| w.parent)
    }

    /// Recorded calls since the last [`clear_ops`](Self::clear_ops).
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Whether `handle` was destroyed (released or still pending).
    pub fn is_destroyed(&self, handle: WidgetHandle) -> bool {
        !self.widgets.contains_key(handle) || self.doomed.contains(&handle)
    }

    /// Number of widgets not yet released.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    // ── Simulation ───────────────────────────────────────────────────

    /// Give input focus to `handle`.
    pub fn focus(&mut self, handle: WidgetHandle) {
        self.focused = Some(handle);
    }

    /// Clear input focus.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<WidgetHandle> {
        self.focused
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Release widgets scheduled for destruction, with their descendants.
    ///
    /// Returns how many widgets were released.
    pub fn flush(&mut self) -> usize {
        let mut released = 0;
        for handle in std::mem::take(&mut self.doomed) {
            if let Some(parent) = self.parent(handle) {
                if let Some(p) = self.widgets.get_mut(parent) {
                    p.children.retain(|c| *c != handle);
                }
            }
            let mut stack = vec![handle];
            while let Some(current) = stack.pop() {
                if let Some(widget) = self.widgets.remove(current) {
                    stack.extend(widget.children);
                    released += 1;
                    if self.focused == Some(current) {
                        self.focused = None;
                    }
                }
            }
        }
        released
    }

    // ── Internals ────────────────────────────────────────────────────

    fn check(&self) -> Result<(), AdapterError> {
        if self.failing {
            return Err(AdapterError::Backend("injected failure".into()));
        }
        Ok(())
    }

    fn get_mut(&mut self, handle: WidgetHandle) -> Result<&mut HeadlessWidget, AdapterError> {
        self.check()?;
        self.widgets
            .get_mut(handle)
            .ok_or(AdapterError::UnknownWidget(handle))
    }

    fn detach(&mut self, child: WidgetHandle) {
        let Some(parent) = self.widgets.get_mut(child).and_then(|w| w.parent.take()) else {
            return;
        };
        if let Some(p) = self.widgets.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
    }
}

impl WidgetAdapter for HeadlessAdapter {
    fn create_widget(&mut self, kind: WidgetKind) -> Result<WidgetHandle, AdapterError> {
        self.check()?;
        let handle = self.widgets.insert(HeadlessWidget::new(kind));
        self.ops.push(Op::Create(handle, kind));
        Ok(handle)
    }

    fn destroy_widget(&mut self, handle: WidgetHandle) -> Result<(), AdapterError> {
        self.get_mut(handle)?;
        if !self.doomed.contains(&handle) {
            self.doomed.push(handle);
        }
        self.ops.push(Op::Destroy(handle));
        Ok(())
    }

    fn set_text(&mut self, handle: WidgetHandle, text: &str) -> Result<(), AdapterError> {
        self.get_mut(handle)?.text = text.to_owned();
        self.ops.push(Op::SetText(handle, text.to_owned()));
        Ok(())
    }

    fn set_placeholder(&mut self, handle: WidgetHandle, text: &str) -> Result<(), AdapterError> {
        self.get_mut(handle)?.placeholder = text.to_owned();
        self.ops.push(Op::SetPlaceholder(handle, text.to_owned()));
        Ok(())
    }

    fn set_style(&mut self, handle: WidgetHandle, style: &Style) -> Result<(), AdapterError> {
        self.get_mut(handle)?.style = style.clone();
        self.ops.push(Op::SetStyle(handle, style.clone()));
        Ok(())
    }

    fn set_enabled(&mut self, handle: WidgetHandle, enabled: bool) -> Result<(), AdapterError> {
        self.get_mut(handle)?.enabled = enabled;
        self.ops.push(Op::SetEnabled(handle, enabled));
        Ok(())
    }

    fn set_visible(&mut self, handle: WidgetHandle, visible: bool) -> Result<(), AdapterError> {
        self.get_mut(handle)?.visible = visible;
        self.ops.push(Op::SetVisible(handle, visible));
        Ok(())
    }

    fn set_checked(&mut self, handle: WidgetHandle, checked: bool) -> Result<(), AdapterError> {
        self.get_mut(handle)?.checked = checked;
        self.ops.push(Op::SetChecked(handle, checked));
        Ok(())
    }

    fn set_layout(&mut self, handle: WidgetHandle, layout: &Layout) -> Result<(), AdapterError> {
        let widget = self.get_mut(handle)?;
        if widget.kind != WidgetKind::Container {
            return Err(AdapterError::NotAContainer(handle));
        }
        widget.layout = *layout;
        self.ops.push(Op::SetLayout(handle, *layout));
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent: WidgetHandle,
        child: WidgetHandle,
        index: usize,
    ) -> Result<(), AdapterError> {
        if self.get_mut(parent)?.kind != WidgetKind::Container {
            return Err(AdapterError::NotAContainer(parent));
        }
        self.get_mut(child)?;
        self.detach(child);

        let siblings = &mut self.widgets[parent].children;
        let at = index.min(siblings.len());
        siblings.insert(at, child);
        self.widgets[child].parent = Some(parent);
        self.ops.push(Op::Insert(parent, child, index));
        Ok(())
    }

    fn remove_child(
        &mut self,
        parent: WidgetHandle,
        child: WidgetHandle,
    ) -> Result<(), AdapterError> {
        self.get_mut(parent)?;
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
        self.ops.push(Op::Remove(parent, child));
        Ok(())
    }

    fn has_focus(&self, handle: WidgetHandle) -> bool {
        self.focused == Some(handle)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
