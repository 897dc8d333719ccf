//! ElementState: the committed counterpart of an ElementNode.

use std::fmt;

use slotmap::new_key_type;

use crate::adapter::WidgetHandle;
use crate::element::{Attributes, ElementKind, ElementNode};
use crate::runtime::ComponentId;

new_key_type! {
    /// Key of an [`ElementState`] in a reconciler's arena.
    pub struct StateId;
}

/// One mounted node: what was last applied to its widget.
///
/// Exactly one exists per widget the reconciler created. Attribute and text
/// values are the ones actually committed; a focus-guarded input keeps its
/// previous value here so a later pass retries the update.
#[derive(Debug, Clone)]
pub struct ElementState {
    pub(crate) kind: ElementKind,
    pub(crate) tag: String,
    pub(crate) attributes: Attributes,
    pub(crate) text: String,
    pub(crate) children: Vec<StateId>,
    pub(crate) widget: WidgetHandle,
    pub(crate) component: Option<ComponentId>,
}

impl ElementState {
    pub(crate) fn from_node(
        node: &ElementNode,
        kind: ElementKind,
        widget: WidgetHandle,
        component: Option<ComponentId>,
    ) -> Self {
        Self {
            kind,
            tag: node.tag().to_owned(),
            attributes: node.attributes().clone(),
            text: node.text().to_owned(),
            children: Vec::new(),
            widget,
            component,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    /// The live widget. For an embedded component this is the component's
    /// main widget (or the marker shown in its place).
    pub fn widget(&self) -> WidgetHandle {
        self.widget
    }

    /// The mounted child component, for component nodes that resolved.
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    pub fn key(&self) -> ChildKey {
        ChildKey::new(self.attr("id"), &self.tag, &self.text)
    }
}

// ---------------------------------------------------------------------------
// ChildKey
// ---------------------------------------------------------------------------

/// Identity of a child among its siblings.
///
/// `id:<value>` when the node has a non-empty `id`, else `<tag>:<text>`.
/// Content keys are best-effort: identical id-less siblings share a key and
/// are matched in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Id(String),
    Content { tag: String, text: String },
}

impl ChildKey {
    fn new(id: Option<&str>, tag: &str, text: &str) -> Self {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => Self::Id(id.to_owned()),
            None => Self::Content {
                tag: tag.to_owned(),
                text: text.to_owned(),
            },
        }
    }

    pub fn of(node: &ElementNode) -> Self {
        Self::new(node.id(), node.tag(), node.text())
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Content { tag, text } => write!(f, "{tag}:{text}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RefTarget
// ---------------------------------------------------------------------------

/// What a `ref="name"` attribute points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Element(WidgetHandle),
    Component(ComponentId),
}

impl RefTarget {
    pub(crate) fn points_into(&self, widget: WidgetHandle, component: Option<ComponentId>) -> bool {
        match *self {
            Self::Element(w) => w == widget,
            Self::Component(c) => Some(c) == component,
        }
    }
}
