//! State store error types.

use crate::schema::FieldKind;
use thiserror::Error;

/// Errors from the state store and dispatcher generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The named field is not declared in the schema.
    #[error("unknown state field: {0}")]
    UnknownField(String),

    /// A dispatcher was requested as the wrong kind.
    #[error("state field '{key}' is {actual}, not {expected}")]
    KindMismatch {
        /// The field name.
        key: String,
        /// The kind that was requested.
        expected: FieldKind,
        /// The kind the field was declared with.
        actual: FieldKind,
    },
}
