//! Template engine contract.
//!
//! Markup generation (loops, conditionals, substitution) belongs to an
//! external engine. The runtime hands it a [`TemplateContext`] and expects
//! markup text back. [`TemplateRegistry`] is a minimal engine backed by Rust
//! closures, enough for tests and for apps that build markup in code.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::markup::ParseError;
use crate::props::Props;
use crate::runtime::State;

/// Errors from producing a component's markup.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },
    #[error("template produced invalid markup: {0}")]
    Markup(#[from] ParseError),
}

/// Everything a template may read while rendering.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext<'a> {
    /// Name of the component being rendered.
    pub component: &'a str,
    pub state: &'a State,
    pub props: &'a Props,
    /// Computed values, evaluated against the current state.
    pub computed: Map<String, Value>,
    /// Names of the component's methods, for use in handler attributes.
    pub methods: Vec<&'a str>,
}

impl TemplateContext<'_> {
    /// Resolve a dotted path such as `todos.0.text`.
    ///
    /// The first segment is looked up in state, then props, then computed.
    /// Array elements are addressed by index.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut value = self
            .state
            .get(head)
            .or_else(|| self.props.get(head))
            .or_else(|| self.computed.get(head))?;
        for segment in segments {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Display form of a value: strings unquoted, absent as empty.
    pub fn text(&self, path: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Whether a method with this name exists.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| *m == name)
    }

    /// The whole context as JSON, for engines that consume serde values.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Produces markup for a named template.
pub trait TemplateEngine {
    fn render(&self, template: &str, context: &TemplateContext<'_>) -> Result<String, TemplateError>;
}

impl<F> TemplateEngine for F
where
    F: Fn(&str, &TemplateContext<'_>) -> Result<String, TemplateError>,
{
    fn render(&self, template: &str, context: &TemplateContext<'_>) -> Result<String, TemplateError> {
        self(template, context)
    }
}

/// A render function registered under a template name.
pub type TemplateFn = Box<dyn Fn(&TemplateContext<'_>) -> Result<String, TemplateError>>;

/// Name → closure template engine.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TemplateFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template (builder). Replaces an existing one.
    pub fn with<F>(mut self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&TemplateContext<'_>) -> Result<String, TemplateError> + 'static,
    {
        self.register(name, render);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, render: F)
    where
        F: Fn(&TemplateContext<'_>) -> Result<String, TemplateError> + 'static,
    {
        self.templates.insert(name.into(), Box::new(render));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.templates.keys().collect();
        names.sort();
        f.debug_struct("TemplateRegistry")
            .field("templates", &names)
            .finish()
    }
}

impl TemplateEngine for TemplateRegistry {
    fn render(&self, template: &str, context: &TemplateContext<'_>) -> Result<String, TemplateError> {
        let render = self
            .templates
            .get(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_owned()))?;
        render(context)
    }
}
