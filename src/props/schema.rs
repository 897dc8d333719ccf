//! Declarative props schemas.

use serde_json::Value;

/// The type a prop field is coerced to.
#[derive(Debug, Clone, PartialEq)]
pub enum PropType {
    Str,
    Bool,
    Int,
    Float,
    /// A list of values: a JSON array, or a comma-separated string.
    List,
    /// A JSON object validated against a nested schema.
    Nested(PropsSchema),
}

/// One declared prop.
#[derive(Debug, Clone, PartialEq)]
pub struct PropField {
    pub name: String,
    pub ty: PropType,
    pub required: bool,
    /// Used when the attribute is absent. Only meaningful for optional fields.
    pub default: Option<Value>,
}

/// Schema of the props a component accepts.
///
/// ```
/// use gilt_reconcile::props::{PropType, PropsSchema};
/// use serde_json::json;
///
/// let schema = PropsSchema::new("TodoItem")
///     .required("text", PropType::Str)
///     .with_default("completed", PropType::Bool, json!(false))
///     .required("id", PropType::Int);
/// assert_eq!(schema.fields().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropsSchema {
    name: String,
    fields: Vec<PropField>,
}

impl PropsSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// A field that must be present.
    pub fn required(self, name: &str, ty: PropType) -> Self {
        self.field(PropField {
            name: name.to_ascii_lowercase(),
            ty,
            required: true,
            default: None,
        })
    }

    /// A field that may be absent; absent fields are left out of the props.
    pub fn optional(self, name: &str, ty: PropType) -> Self {
        self.field(PropField {
            name: name.to_ascii_lowercase(),
            ty,
            required: false,
            default: None,
        })
    }

    /// An optional field with a default value.
    pub fn with_default(self, name: &str, ty: PropType, default: Value) -> Self {
        self.field(PropField {
            name: name.to_ascii_lowercase(),
            ty,
            required: false,
            default: Some(default),
        })
    }

    /// Add a field, replacing an earlier declaration of the same name.
    pub fn field(mut self, field: PropField) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[PropField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&PropField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
