//! Snapshot rendering helpers.
//!
//! Converts a headless widget tree into indented plain text suitable for
//! snapshot testing and assertions.

use std::fmt::Write;

use super::headless::{HeadlessAdapter, HeadlessWidget};
use crate::adapter::{WidgetHandle, WidgetKind};
use crate::element::Direction;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render the widget tree rooted at `root` as text.
///
/// One line per widget, indented two spaces per level:
/// `Kind "text" [flags]`. Text and placeholder are quoted; flags list the
/// non-default state (`horizontal`, `disabled`, `hidden`, `checked`,
/// `style=...`). Unknown handles render as an empty string.
///
/// ```
/// use gilt_reconcile::adapter::{WidgetAdapter, WidgetKind};
/// use gilt_reconcile::testing::{tree_to_string, HeadlessAdapter};
///
/// let mut adapter = HeadlessAdapter::new();
/// let root = adapter.create_widget(WidgetKind::Container).unwrap();
/// let label = adapter.create_widget(WidgetKind::Label).unwrap();
/// adapter.set_text(label, "Hi").unwrap();
/// adapter.insert_child(root, label, 0).unwrap();
///
/// assert_eq!(tree_to_string(&adapter, root), "Container\n  Label \"Hi\"");
/// ```
pub fn tree_to_string(adapter: &HeadlessAdapter, root: WidgetHandle) -> String {
    let mut lines = Vec::new();
    collect(adapter, root, 0, &mut lines);
    lines.join("\n")
}

/// One widget's line, without indentation or children.
pub fn widget_line(widget: &HeadlessWidget) -> String {
    let mut line = format!("{:?}", widget.kind);
    if !widget.text.is_empty() {
        let _ = write!(line, " {:?}", widget.text);
    }
    if !widget.placeholder.is_empty() {
        let _ = write!(line, " placeholder={:?}", widget.placeholder);
    }

    let mut flags = Vec::new();
    if widget.kind == WidgetKind::Container && widget.layout.direction == Direction::Horizontal {
        flags.push("horizontal".to_owned());
    }
    if !widget.enabled {
        flags.push("disabled".to_owned());
    }
    if !widget.visible {
        flags.push("hidden".to_owned());
    }
    if widget.checked {
        flags.push("checked".to_owned());
    }
    if !widget.style.is_empty() {
        flags.push(format!("style={:?}", widget.style.to_string()));
    }
    if !flags.is_empty() {
        let _ = write!(line, " [{}]", flags.join(" "));
    }
    line
}

fn collect(adapter: &HeadlessAdapter, handle: WidgetHandle, depth: usize, lines: &mut Vec<String>) {
    let Some(widget) = adapter.widget(handle) else {
        return;
    };
    lines.push(format!("{}{}", "  ".repeat(depth), widget_line(widget)));
    for child in &widget.children {
        collect(adapter, *child, depth + 1, lines);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
