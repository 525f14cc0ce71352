//! Generated per-field dispatchers.
//!
//! A [`Dispatcher`] is generated from a field's declared
//! [`FieldKind`](crate::FieldKind) and exposes exactly the operations that
//! kind supports. Every operation funnels through the store's atomic
//! mutate/observe/broadcast sequence, so a dispatcher call is all a caller
//! needs to make a change visible to every connected client.

use crate::error::StateError;
use crate::schema::FieldKind;
use crate::store::SharedState;
use serde_json::Value;

/// Default step for `increment` / `decrement`.
pub const DEFAULT_STEP: f64 = 1.0;

/// Kind-specific handle for mutating one state field.
#[derive(Clone, Debug)]
pub enum Dispatcher {
    /// Operations for a scalar field.
    Scalar(ScalarOps),
    /// Operations for a numeric field.
    Numeric(NumericOps),
    /// Operations for a collection field.
    Collection(CollectionOps),
    /// Operations for an object field.
    Object(ObjectOps),
}

impl Dispatcher {
    /// Returns the kind this dispatcher was generated for.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar(_) => FieldKind::Scalar,
            Self::Numeric(_) => FieldKind::Numeric,
            Self::Collection(_) => FieldKind::Collection,
            Self::Object(_) => FieldKind::Object,
        }
    }

    /// Replaces the field's value. Supported by every kind.
    pub fn set(&self, value: Value) {
        match self {
            Self::Scalar(ops) => ops.set(value),
            Self::Numeric(ops) => ops.set(value),
            Self::Collection(ops) => ops.set(value),
            Self::Object(ops) => ops.set(value),
        }
    }

    /// Returns the name of the field this dispatcher mutates.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Scalar(ops) => &ops.key,
            Self::Numeric(ops) => &ops.key,
            Self::Collection(ops) => &ops.key,
            Self::Object(ops) => &ops.key,
        }
    }

    /// Returns the numeric operations, if this field is numeric.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&NumericOps> {
        match self {
            Self::Numeric(ops) => Some(ops),
            _ => None,
        }
    }

    /// Returns the collection operations, if this field is a collection.
    #[must_use]
    pub fn as_collection(&self) -> Option<&CollectionOps> {
        match self {
            Self::Collection(ops) => Some(ops),
            _ => None,
        }
    }

    /// Returns the object operations, if this field is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectOps> {
        match self {
            Self::Object(ops) => Some(ops),
            _ => None,
        }
    }

    /// Returns the numeric operations.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KindMismatch`] if the field was declared as
    /// a different kind.
    pub fn try_numeric(&self) -> Result<&NumericOps, StateError> {
        self.as_numeric()
            .ok_or_else(|| self.mismatch(FieldKind::Numeric))
    }

    /// Returns the collection operations.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KindMismatch`] if the field was declared as
    /// a different kind.
    pub fn try_collection(&self) -> Result<&CollectionOps, StateError> {
        self.as_collection()
            .ok_or_else(|| self.mismatch(FieldKind::Collection))
    }

    /// Returns the object operations.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::KindMismatch`] if the field was declared as
    /// a different kind.
    pub fn try_object(&self) -> Result<&ObjectOps, StateError> {
        self.as_object()
            .ok_or_else(|| self.mismatch(FieldKind::Object))
    }

    fn mismatch(&self, expected: FieldKind) -> StateError {
        StateError::KindMismatch {
            key: self.key().to_string(),
            expected,
            actual: self.kind(),
        }
    }
}

impl SharedState {
    /// Generates the dispatcher for a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownField`] if the field is not declared.
    pub fn dispatcher(&self, key: &str) -> Result<Dispatcher, StateError> {
        let kind = self
            .kind(key)
            .ok_or_else(|| StateError::UnknownField(key.to_string()))?;

        let state = self.clone();
        let key = key.to_string();

        Ok(match kind {
            FieldKind::Scalar => Dispatcher::Scalar(ScalarOps { state, key }),
            FieldKind::Numeric => Dispatcher::Numeric(NumericOps { state, key }),
            FieldKind::Collection => Dispatcher::Collection(CollectionOps { state, key }),
            FieldKind::Object => Dispatcher::Object(ObjectOps { state, key }),
        })
    }
}

/// Operations for a scalar field.
#[derive(Clone, Debug)]
pub struct ScalarOps {
    state: SharedState,
    key: String,
}

impl ScalarOps {
    /// Replaces the field's value.
    pub fn set(&self, value: Value) {
        let _ = self.state.apply(&self.key, |current| *current = value);
    }
}

/// Operations for a numeric field.
///
/// Arithmetic preserves integers: adding a whole-number amount to an
/// integer value yields an integer, not a float.
#[derive(Clone, Debug)]
pub struct NumericOps {
    state: SharedState,
    key: String,
}

impl NumericOps {
    /// Replaces the field's value.
    pub fn set(&self, value: Value) {
        let _ = self.state.apply(&self.key, |current| *current = value);
    }

    /// Adds the default step (1) to the field.
    pub fn increment(&self) {
        self.increment_by(DEFAULT_STEP);
    }

    /// Adds `amount` to the field.
    pub fn increment_by(&self, amount: f64) {
        let key = self.key.clone();
        let _ = self.state.apply(&self.key, move |current| {
            *current = numeric_add(&key, current, amount);
        });
    }

    /// Subtracts the default step (1) from the field.
    pub fn decrement(&self) {
        self.decrement_by(DEFAULT_STEP);
    }

    /// Subtracts `amount` from the field.
    pub fn decrement_by(&self, amount: f64) {
        self.increment_by(-amount);
    }
}

/// Adds `amount` to a JSON value, preserving integer representation.
///
/// A non-numeric current value (possible after a raw protocol assignment)
/// is treated as zero.
fn numeric_add(key: &str, current: &Value, amount: f64) -> Value {
    let is_integral = amount.fract() == 0.0 && amount.abs() < 9_007_199_254_740_992.0;

    if let Value::Number(n) = current {
        if let Some(i) = n.as_i64() {
            if is_integral {
                #[allow(clippy::cast_possible_truncation)]
                return Value::from(i.saturating_add(amount as i64));
            }
        }
        let base = n.as_f64().unwrap_or(0.0);
        return serde_json::Number::from_f64(base + amount)
            .map_or_else(|| current.clone(), Value::Number);
    }

    tracing::warn!(key, "numeric operation on non-numeric value, treating as zero");
    if is_integral {
        #[allow(clippy::cast_possible_truncation)]
        return Value::from(amount as i64);
    }
    serde_json::Number::from_f64(amount).map_or(Value::Null, Value::Number)
}

/// Operations for a collection field.
#[derive(Clone, Debug)]
pub struct CollectionOps {
    state: SharedState,
    key: String,
}

impl CollectionOps {
    /// Replaces the field's value.
    pub fn set(&self, value: Value) {
        let _ = self.state.apply(&self.key, |current| *current = value);
    }

    /// Appends an item to the collection.
    pub fn push(&self, item: Value) {
        let key = self.key.clone();
        let _ = self.state.apply(&self.key, move |current| {
            ensure_array(&key, current).push(item);
        });
    }

    /// Removes and returns the last item.
    ///
    /// Popping an empty collection returns `None` but still counts as an
    /// accepted mutation: observers fire and the unchanged snapshot is
    /// broadcast.
    pub fn pop(&self) -> Option<Value> {
        let key = self.key.clone();
        self.state
            .apply(&self.key, move |current| ensure_array(&key, current).pop())
            .flatten()
    }

    /// Inserts an item at `index`, clamped to the collection length.
    pub fn insert(&self, index: usize, item: Value) {
        let key = self.key.clone();
        let _ = self.state.apply(&self.key, move |current| {
            let array = ensure_array(&key, current);
            let index = index.min(array.len());
            array.insert(index, item);
        });
    }
}

/// Returns the value as a mutable array, resetting non-arrays to empty.
fn ensure_array<'a>(key: &str, value: &'a mut Value) -> &'a mut Vec<Value> {
    if !value.is_array() {
        tracing::warn!(key, "collection operation on non-array value, resetting");
        *value = Value::Array(Vec::new());
    }
    value
        .as_array_mut()
        .expect("value was just set to an array")
}

/// Operations for an object field.
#[derive(Clone, Debug)]
pub struct ObjectOps {
    state: SharedState,
    key: String,
}

impl ObjectOps {
    /// Replaces the field's value.
    pub fn set(&self, value: Value) {
        let _ = self.state.apply(&self.key, |current| *current = value);
    }

    /// Shallow-merges `partial` into the object.
    ///
    /// Keys in `partial` overwrite existing keys; other keys are kept.
    /// A non-object partial contributes nothing but the mutation still
    /// counts as accepted.
    pub fn update(&self, partial: Value) {
        let key = self.key.clone();
        let _ = self.state.apply(&self.key, move |current| {
            let Value::Object(partial) = partial else {
                tracing::warn!(key, "object update with non-object partial, ignoring");
                return;
            };

            if !current.is_object() {
                tracing::warn!(key, "object update on non-object value, resetting");
                *current = Value::Object(serde_json::Map::new());
            }
            if let Some(object) = current.as_object_mut() {
                for (name, value) in partial {
                    object.insert(name, value);
                }
            }
        });
    }
}
