//! Attribute interpretation: truthy tokens, inline styles, container layout.

use std::fmt;

use super::node::Attributes;

// ---------------------------------------------------------------------------
// Truthiness
// ---------------------------------------------------------------------------

/// Tokens accepted as `true`, compared case-insensitively.
pub const TRUTHY_TOKENS: &[&str] = &["true", "1", "t", "y", "yes"];

/// Whether `value` is one of [`TRUTHY_TOKENS`] (case-insensitive).
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    TRUTHY_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// Interpret a flag attribute such as `disabled`, `hidden` or `checked`.
///
/// A bare attribute (`<input disabled>`, empty value) and the HTML form that
/// repeats the name (`disabled="disabled"`) are set; otherwise the value
/// must be a truthy token.
pub fn flag(name: &str, value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(name) || is_truthy(value)
}

/// Flag lookup on an attribute map. Absent means unset.
pub fn flag_attr(attributes: &Attributes, name: &str) -> bool {
    attributes.get(name).is_some_and(|v| flag(name, v))
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Ordered inline style declarations parsed from `key: value;` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    declarations: Vec<(String, String)>,
}

impl Style {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute. Malformed pairs (no `:`) are dropped.
    ///
    /// camelCase property names are normalized to kebab-case, so
    /// `backgroundColor: red` and `background-color: red` are equivalent.
    pub fn parse(source: &str) -> Self {
        let mut style = Self::new();
        for pair in source.split(';') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                continue;
            }
            style.set(&kebab_case(key), value);
        }
        style
    }

    /// Set a declaration, replacing an earlier one for the same property.
    pub fn set(&mut self, property: &str, value: &str) {
        match self.declarations.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_owned(),
            None => self
                .declarations
                .push((property.to_owned(), value.to_owned())),
        }
    }

    /// Builder form of [`Style::set`].
    pub fn with(mut self, property: &str, value: &str) -> Self {
        self.set(property, value);
        self
    }

    /// Look up a property value.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Declarations in source order.
    pub fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (property, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{property}: {value};")?;
        }
        Ok(())
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Main axis of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

/// Child alignment inside a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
    #[default]
    Top,
    Bottom,
}

impl Alignment {
    /// Parse an `alignment` attribute value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Content margins in widget units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Margins {
    /// The same margin on every side.
    pub fn uniform(value: i32) -> Self {
        Self {
            left: value,
            right: value,
            top: value,
            bottom: value,
        }
    }
}

/// Layout of a container widget, derived from its attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub direction: Direction,
    pub margins: Margins,
    pub spacing: i32,
    pub alignment: Alignment,
}

impl Layout {
    /// Derive the layout from container attributes.
    ///
    /// `class` containing `horizontal` selects a horizontal axis. `margin` sets
    /// all sides and is overridden per side by `margin-left/right/top/bottom`.
    /// Values that fail to parse are ignored with a warning.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let mut layout = Self::default();

        let horizontal = attributes
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == "horizontal"));
        if horizontal {
            layout.direction = Direction::Horizontal;
        }

        if let Some(m) = int_attr(attributes, "margin") {
            layout.margins = Margins::uniform(m);
        }
        if let Some(m) = int_attr(attributes, "margin-left") {
            layout.margins.left = m;
        }
        if let Some(m) = int_attr(attributes, "margin-right") {
            layout.margins.right = m;
        }
        if let Some(m) = int_attr(attributes, "margin-top") {
            layout.margins.top = m;
        }
        if let Some(m) = int_attr(attributes, "margin-bottom") {
            layout.margins.bottom = m;
        }
        if let Some(s) = int_attr(attributes, "spacing") {
            layout.spacing = s;
        }
        if let Some(raw) = attributes.get("alignment") {
            match Alignment::parse(raw) {
                Some(a) => layout.alignment = a,
                None => tracing::warn!(value = %raw, "unknown alignment, using top"),
            }
        }

        layout
    }

    /// Builder: set spacing.
    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Builder: set margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }
}

fn int_attr(attributes: &Attributes, name: &str) -> Option<i32> {
    let raw = attributes.get(name)?;
    match raw.trim().parse::<i32>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(attribute = name, value = %raw, "ignoring non-integer layout attribute");
            None
        }
    }
}
