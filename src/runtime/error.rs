//! Runtime errors.

use serde_json::Value;

use super::ComponentId;
use crate::adapter::AdapterError;
use crate::props::PropError;
use crate::template::TemplateError;

/// Errors surfaced by the component runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Prop(#[from] PropError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("unknown component {0:?}")]
    UnknownComponent(ComponentId),
    #[error("component '{component}' has no method '{method}'")]
    UnknownMethod { component: String, method: String },
    #[error("state must be a JSON object, got {0}")]
    StateNotObject(Value),
    /// Raised by application method handlers.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl RuntimeError {
    /// Build a handler error from any displayable message.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }

    /// Whether this is a template failure (already shown inline).
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }
}
