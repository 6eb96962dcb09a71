use thiserror::Error;

use crate::type_key::TypeKey;

/// Errors that can occur when inserting into a polymorphic store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A type-erased value was inserted under a concrete type that is not its
    /// most-derived runtime type. Storing it would slice the value.
    #[error(
        "the concrete type of the value is {actual}, but it was inserted as {expected}; \
         the insertion type must match the value's concrete type"
    )]
    DerivedTypeMismatch {
        /// The type the caller asked to store the value as.
        expected: TypeKey,
        /// The runtime concrete type of the value.
        actual: TypeKey,
    },
    /// The segment registered for a type key is not of the requested segment type
    #[error("segment registered for {key} is not a {segment}")]
    SegmentMismatch {
        /// The key whose segment failed to downcast.
        key: TypeKey,
        /// The segment type that was requested.
        segment: &'static str,
    },
}
