//! The shared state store.
//!
//! [`SharedState`] is a cloneable handle over the single mutex-guarded
//! store. Every accepted mutation runs under the lock as one unit: the
//! field is mutated in place, that key's observers fire in registration
//! order with the new value, and a full snapshot is handed to the
//! [`StateSink`]. Two concurrent mutations therefore never interleave
//! their observer or broadcast phases.
//!
//! Because observers and the sink run while the lock is held, they must
//! not block and must not call back into the state.

use crate::error::StateError;
use crate::schema::{FieldKind, StateSchema};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Receives the full state snapshot after every accepted mutation.
///
/// The WebSocket broadcaster implements this; the call happens under the
/// store lock, so implementations must be non-blocking.
pub trait StateSink: Send + Sync {
    /// Called with the post-mutation snapshot of the whole state.
    fn state_changed(&self, snapshot: &Value);
}

/// Per-key change observer.
type Observer = Box<dyn Fn(&Value) + Send + Sync>;

/// One live field: declared kind, current value, registered observers.
struct Field {
    kind: FieldKind,
    value: Value,
    observers: Vec<Observer>,
}

/// The store behind the [`SharedState`] handle.
struct StoreInner {
    fields: indexmap::IndexMap<String, Field>,
    sink: Option<Arc<dyn StateSink>>,
}

/// Cloneable handle to the single shared state store.
///
/// # Example
///
/// ```
/// use proteus_state::{FieldKind, SharedState, StateSchema};
///
/// let state = SharedState::new(
///     StateSchema::new().field("count", FieldKind::Numeric, serde_json::json!(0)),
/// );
///
/// assert!(state.assign("count", serde_json::json!(5)));
/// assert_eq!(state.get("count"), Some(serde_json::json!(5)));
/// assert!(!state.assign("unknown", serde_json::json!(1)));
/// ```
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<StoreInner>>,
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState").finish_non_exhaustive()
    }
}

impl SharedState {
    /// Creates a new state store from a schema.
    #[must_use]
    pub fn new(schema: StateSchema) -> Self {
        let fields = schema
            .fields
            .into_iter()
            .map(|(name, spec)| {
                (
                    name,
                    Field {
                        kind: spec.kind,
                        value: spec.initial,
                        observers: Vec::new(),
                    },
                )
            })
            .collect();

        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                fields,
                sink: None,
            })),
        }
    }

    /// Installs the sink that receives post-mutation snapshots.
    ///
    /// Replaces any previously installed sink.
    pub fn set_sink(&self, sink: Arc<dyn StateSink>) {
        self.inner.lock().sink = Some(sink);
    }

    /// Returns a full snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        Self::snapshot_locked(&self.inner.lock())
    }

    /// Returns the declared field names in declaration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().fields.keys().cloned().collect()
    }

    /// Returns true if the field is declared.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().fields.contains_key(key)
    }

    /// Returns the current value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().fields.get(key).map(|f| f.value.clone())
    }

    /// Returns the declared kind of a field.
    #[must_use]
    pub fn kind(&self, key: &str) -> Option<FieldKind> {
        self.inner.lock().fields.get(key).map(|f| f.kind)
    }

    /// Registers an observer for a field.
    ///
    /// Observers fire in registration order with the field's new value,
    /// under the store lock.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownField`] if the field is not declared.
    pub fn on_change<F>(&self, key: &str, observer: F) -> Result<(), StateError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let field = inner
            .fields
            .get_mut(key)
            .ok_or_else(|| StateError::UnknownField(key.to_string()))?;
        field.observers.push(Box::new(observer));
        Ok(())
    }

    /// Assigns a raw value to a field, as the inbound wire protocol does.
    ///
    /// No kind validation is applied. Returns false for an unknown key,
    /// which is dropped with a debug log and no observable effect.
    pub fn assign(&self, key: &str, value: Value) -> bool {
        let accepted = self.apply(key, |current| *current = value).is_some();
        if !accepted {
            tracing::debug!(key, "dropping assignment to unknown state field");
        }
        accepted
    }

    /// Runs a mutation on a field as one atomic unit.
    ///
    /// Returns `None` for an unknown key. On success the mutation result
    /// is returned after observers and the sink have run.
    pub(crate) fn apply<R>(&self, key: &str, mutate: impl FnOnce(&mut Value) -> R) -> Option<R> {
        let mut inner = self.inner.lock();

        let (result, new_value) = {
            let field = inner.fields.get_mut(key)?;
            let result = mutate(&mut field.value);
            (result, field.value.clone())
        };

        if let Some(field) = inner.fields.get(key) {
            for observer in &field.observers {
                observer(&new_value);
            }
        }

        let snapshot = Self::snapshot_locked(&inner);
        if let Some(sink) = &inner.sink {
            sink.state_changed(&snapshot);
        }

        Some(result)
    }

    /// Serializes the full state in field declaration order.
    fn snapshot_locked(inner: &StoreInner) -> Value {
        let mut map = serde_json::Map::new();
        for (name, field) in &inner.fields {
            map.insert(name.clone(), field.value.clone());
        }
        Value::Object(map)
    }
}
