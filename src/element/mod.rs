//! Element tree: desired-state nodes, element kinds and attribute semantics.

pub mod attrs;
pub mod kind;
pub mod node;

pub use attrs::{is_truthy, Alignment, Direction, Layout, Margins, Style, TRUTHY_TOKENS};
pub use kind::{ElementKind, PatchOptions, PatchReport};
pub use node::{Attributes, ElementNode, IntoChildren};
