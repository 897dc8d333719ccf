//! ElementKind: closed set of element variants and their attribute patching.
//!
//! Each variant owns the mapping from its attributes to adapter mutations.
//! Attributes shared by every widget (`style`, `disabled`, `hidden`) are
//! handled once; the per-variant functions cover the rest. Anything not
//! recognized here is ignored.

use super::attrs::{flag, Layout, Style};
use super::node::Attributes;
use crate::adapter::{AdapterError, WidgetAdapter, WidgetHandle, WidgetKind};

/// The element variants the reconciler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Button,
    Label,
    Input,
    Container,
    Checkbox,
    /// An embedded child component (`<component name="...">`).
    Component,
}

/// Knobs that influence how a patch is applied.
#[derive(Debug, Clone, Copy)]
pub struct PatchOptions<'a> {
    /// Skip overwriting the value of a focused text input.
    pub guard_focus: bool,
    /// Caption for buttons without text content.
    pub default_button_text: &'a str,
}

impl Default for PatchOptions<'_> {
    fn default() -> Self {
        Self {
            guard_focus: true,
            default_button_text: "Button",
        }
    }
}

/// What an attribute patch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Number of adapter mutation calls issued.
    pub mutations: usize,
    /// The `value` delta was withheld because the input had focus.
    pub value_guarded: bool,
}

impl ElementKind {
    /// Map a (case-insensitive) tag to a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "button" | "qpushbutton" => Self::Button,
            "label" | "qlabel" | "span" | "p" => Self::Label,
            "input" | "qlineedit" => Self::Input,
            "div" | "qwidget" | "container" => Self::Container,
            "checkbox" | "qcheckbox" => Self::Checkbox,
            "component" => Self::Component,
            _ => return None,
        };
        Some(kind)
    }

    /// The widget the adapter creates for this kind. Components have none;
    /// they are hosted by their own main widget.
    pub fn widget_kind(self) -> Option<WidgetKind> {
        match self {
            Self::Button => Some(WidgetKind::Button),
            Self::Label => Some(WidgetKind::Label),
            Self::Input => Some(WidgetKind::Input),
            Self::Container => Some(WidgetKind::Container),
            Self::Checkbox => Some(WidgetKind::Checkbox),
            Self::Component => None,
        }
    }

    /// Whether children of this node are reconciled.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Container)
    }

    /// Whether this kind takes text input from the user.
    pub fn is_text_input(self) -> bool {
        matches!(self, Self::Input)
    }

    /// Apply the attribute deltas between `old` and `new` to a widget.
    ///
    /// When mounting, pass an empty `old` map so every recognized attribute
    /// present in `new` is applied.
    pub fn apply_attributes(
        self,
        adapter: &mut dyn WidgetAdapter,
        handle: WidgetHandle,
        old: &Attributes,
        new: &Attributes,
        options: PatchOptions<'_>,
    ) -> Result<PatchReport, AdapterError> {
        let mut patch = Patch {
            adapter,
            handle,
            old,
            new,
            report: PatchReport::default(),
        };

        if self == Self::Component {
            return Ok(patch.report);
        }

        patch.common()?;
        match self {
            Self::Button => patch.button()?,
            Self::Label => {}
            Self::Input => patch.input(options)?,
            Self::Container => patch.container()?,
            Self::Checkbox => patch.checkbox()?,
            Self::Component => {}
        }
        Ok(patch.report)
    }

    /// Apply changed text content to a widget.
    ///
    /// Returns `false` when the update was withheld by the focus guard; the
    /// widget then still shows its previous text.
    pub fn apply_text(
        self,
        adapter: &mut dyn WidgetAdapter,
        handle: WidgetHandle,
        text: &str,
        options: PatchOptions<'_>,
    ) -> Result<bool, AdapterError> {
        match self {
            Self::Button => {
                let caption = if text.is_empty() {
                    options.default_button_text
                } else {
                    text
                };
                adapter.set_text(handle, caption)?;
            }
            Self::Label | Self::Checkbox => adapter.set_text(handle, text)?,
            Self::Input => {
                if options.guard_focus && adapter.has_focus(handle) {
                    tracing::debug!(?handle, "focus guard: keeping input text");
                    return Ok(false);
                }
                adapter.set_text(handle, text)?;
            }
            Self::Container | Self::Component => {}
        }
        Ok(true)
    }

    /// Initial text for a freshly created widget.
    pub fn mount_text(
        self,
        adapter: &mut dyn WidgetAdapter,
        handle: WidgetHandle,
        text: &str,
        options: PatchOptions<'_>,
    ) -> Result<(), AdapterError> {
        if self == Self::Button || !text.is_empty() {
            self.apply_text(adapter, handle, text, options)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

struct Patch<'a> {
    adapter: &'a mut dyn WidgetAdapter,
    handle: WidgetHandle,
    old: &'a Attributes,
    new: &'a Attributes,
    report: PatchReport,
}

impl<'a> Patch<'a> {
    /// `Some(new_value)` when the attribute differs between old and new.
    fn delta(&self, name: &str) -> Option<Option<&'a str>> {
        let before = self.old.get(name);
        let after = self.new.get(name);
        (before != after).then(|| after.map(String::as_str))
    }

    fn common(&mut self) -> Result<(), AdapterError> {
        if let Some(style) = self.delta("style") {
            let style = Style::parse(style.unwrap_or(""));
            self.adapter.set_style(self.handle, &style)?;
            self.report.mutations += 1;
        }
        if let Some(disabled) = self.delta("disabled") {
            self.adapter
                .set_enabled(self.handle, !disabled.is_some_and(|v| flag("disabled", v)))?;
            self.report.mutations += 1;
        }
        if let Some(hidden) = self.delta("hidden") {
            self.adapter
                .set_visible(self.handle, !hidden.is_some_and(|v| flag("hidden", v)))?;
            self.report.mutations += 1;
        }
        Ok(())
    }

    fn button(&mut self) -> Result<(), AdapterError> {
        if let Some(Some(text)) = self.delta("text") {
            self.adapter.set_text(self.handle, text)?;
            self.report.mutations += 1;
        }
        Ok(())
    }

    fn input(&mut self, options: PatchOptions<'_>) -> Result<(), AdapterError> {
        if let Some(placeholder) = self.delta("placeholder") {
            self.adapter
                .set_placeholder(self.handle, placeholder.unwrap_or(""))?;
            self.report.mutations += 1;
        }
        if let Some(value) = self.delta("value") {
            if options.guard_focus && self.adapter.has_focus(self.handle) {
                tracing::debug!(handle = ?self.handle, "focus guard: keeping input value");
                self.report.value_guarded = true;
            } else {
                self.adapter.set_text(self.handle, value.unwrap_or(""))?;
                self.report.mutations += 1;
            }
        }
        Ok(())
    }

    fn checkbox(&mut self) -> Result<(), AdapterError> {
        if let Some(checked) = self.delta("checked") {
            self.adapter
                .set_checked(self.handle, checked.is_some_and(|v| flag("checked", v)))?;
            self.report.mutations += 1;
        }
        Ok(())
    }

    fn container(&mut self) -> Result<(), AdapterError> {
        let before = Layout::from_attributes(self.old);
        let after = Layout::from_attributes(self.new);
        if before != after {
            self.adapter.set_layout(self.handle, &after)?;
            self.report.mutations += 1;
        }
        Ok(())
    }
}
