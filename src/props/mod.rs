//! Component props: schemas and coercion of string attributes.

mod coerce;
mod schema;

pub use coerce::coerce;
pub use schema::{PropField, PropType, PropsSchema};

/// Typed props of a component instance.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// Errors raised while building a component's props.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropError {
    #[error("missing required prop '{field}'")]
    Missing { field: String },
    #[error("invalid value {value:?} for prop '{field}': {reason}")]
    Invalid {
        field: String,
        value: String,
        reason: String,
    },
}
