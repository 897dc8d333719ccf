//! Runtime configuration.

/// Configuration for the component runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Leave the text of a focused input alone during a re-render.
    pub guard_focused_inputs: bool,
    /// Inline style of diagnostic labels (template errors, bad components).
    pub diagnostic_style: String,
    /// Spacing of each component's main widget layout.
    pub host_spacing: i32,
    /// Uniform margin of each component's main widget layout.
    pub host_margin: i32,
    /// Caption of buttons without text content.
    pub default_button_text: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            guard_focused_inputs: true,
            diagnostic_style: "color: red;".to_owned(),
            host_spacing: 0,
            host_margin: 0,
            default_button_text: "Button".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the focus guard (builder).
    pub fn with_guard_focused_inputs(mut self, guard: bool) -> Self {
        self.guard_focused_inputs = guard;
        self
    }

    /// Set the diagnostic label style (builder).
    pub fn with_diagnostic_style(mut self, style: impl Into<String>) -> Self {
        self.diagnostic_style = style.into();
        self
    }

    /// Set main widget spacing and margin (builder).
    pub fn with_host_layout(mut self, spacing: i32, margin: i32) -> Self {
        self.host_spacing = spacing;
        self.host_margin = margin;
        self
    }

    /// Set the default button caption (builder).
    pub fn with_default_button_text(mut self, text: impl Into<String>) -> Self {
        self.default_button_text = text.into();
        self
    }
}
