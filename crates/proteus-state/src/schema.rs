//! State schema and field capability descriptors.
//!
//! Every state field is declared up front with a [`FieldKind`] that fixes
//! which dispatcher operations it supports. The kind is part of the
//! declaration, not re-derived from the current value, so a field keeps
//! its operations even if a raw protocol assignment changes the value's
//! JSON type.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// The capability category of a state field.
///
/// Determines which operations the generated dispatcher exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value; supports `set` only.
    Scalar,
    /// JSON number; supports `set`, `increment`, `decrement`.
    Numeric,
    /// JSON array; supports `set`, `push`, `pop`, `insert`.
    Collection,
    /// JSON object; supports `set` and shallow `update`.
    Object,
}

impl FieldKind {
    /// Classifies a JSON value into the kind its dispatcher would carry.
    #[must_use]
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Number(_) => Self::Numeric,
            Value::Array(_) => Self::Collection,
            Value::Object(_) => Self::Object,
            _ => Self::Scalar,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::Numeric => "numeric",
            Self::Collection => "collection",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A single field declaration: kind plus initial value.
#[derive(Debug, Clone)]
pub(crate) struct FieldSpec {
    pub(crate) kind: FieldKind,
    pub(crate) initial: Value,
}

/// Declares the fields of a [`crate::SharedState`].
///
/// Fields keep their declaration order; snapshots serialize in the same
/// order. Re-declaring a field replaces the earlier declaration.
///
/// # Example
///
/// ```
/// use proteus_state::{FieldKind, StateSchema};
///
/// let schema = StateSchema::new()
///     .field("count", FieldKind::Numeric, serde_json::json!(0))
///     .field("profile", FieldKind::Object, serde_json::json!({}));
///
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    pub(crate) fields: IndexMap<String, FieldSpec>,
}

impl StateSchema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field with an explicit kind and initial value.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, initial: Value) -> Self {
        self.fields.insert(name.into(), FieldSpec { kind, initial });
        self
    }

    /// Builds a schema by classifying each top-level field of a JSON object.
    ///
    /// Convenience constructor for callers that already hold their initial
    /// state as one JSON object. Non-object values produce an empty schema.
    #[must_use]
    pub fn from_value(initial: &Value) -> Self {
        let mut schema = Self::new();
        if let Value::Object(map) = initial {
            for (name, value) in map {
                schema = schema.field(name.clone(), FieldKind::classify(value), value.clone());
            }
        }
        schema
    }

    /// Returns the declared kind of a field.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).map(|spec| spec.kind)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
