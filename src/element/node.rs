//! ElementNode: the immutable desired-state unit produced by every render pass.

use std::collections::BTreeMap;
use std::fmt;

use super::kind::ElementKind;

/// Attribute map of an element: lower-cased name → raw string value.
pub type Attributes = BTreeMap<String, String>;

/// Shared empty attribute map, used as the "previous" side when mounting.
pub(crate) static EMPTY_ATTRIBUTES: Attributes = BTreeMap::new();

/// One node of the desired UI tree.
///
/// Tag and attribute names are case-insensitive and stored lower-cased.
/// Nodes are built with the `with_*` builders and are not mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementNode {
    tag: String,
    attributes: Attributes,
    text: String,
    children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a node with the given tag and no attributes, text, or children.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: tag.as_ref().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Set an attribute (builder). Replaces an existing value.
    pub fn with_attr(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the text content (builder).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child node (builder).
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children (builder).
    pub fn with_children(mut self, children: impl IntoChildren) -> Self {
        self.children.extend(children.into_children());
        self
    }

    pub(crate) fn push_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// The lower-cased tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The widget kind this tag maps to, if any.
    pub fn kind(&self) -> Option<ElementKind> {
        ElementKind::from_tag(&self.tag)
    }

    /// All attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up a single attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// Iterate the space-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Whether the `class` attribute contains the given token.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Text content (may be empty).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child nodes in document order.
    pub fn children(&self) -> &[ElementNode] {
        &self.children
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ElementNode::subtree_len).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// IntoChildren
// ---------------------------------------------------------------------------

/// Anything that can be appended as children of an [`ElementNode`].
///
/// Implemented for single nodes and any iterator of nodes, so loops can be
/// spliced straight into a tree.
pub trait IntoChildren {
    fn into_children(self) -> Vec<ElementNode>;
}

impl IntoChildren for ElementNode {
    fn into_children(self) -> Vec<ElementNode> {
        vec![self]
    }
}

impl<I> IntoChildren for I
where
    I: IntoIterator<Item = ElementNode>,
{
    fn into_children(self) -> Vec<ElementNode> {
        self.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Display (compact markup)
// ---------------------------------------------------------------------------

impl fmt::Display for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"{}\"", crate::markup::escape(value))?;
        }
        if self.text.is_empty() && self.children.is_empty() {
            return write!(f, " />");
        }
        write!(f, ">{}", crate::markup::escape(&self.text))?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}
