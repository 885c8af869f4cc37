//! Error types and result types for document store operations.
//!
//! Every fallible operation in the store returns [`StoreResult<T>`]. Nothing in
//! the core recovers from or suppresses an error: I/O and parse failures from the
//! backend surface unchanged to the caller.

use serde_json::Error as SerdeJsonError;
use std::{convert::Infallible, io::Error as IoError};
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The collection's on-disk structure does not exist.
    ///
    /// Collections must be created with `create_collection` before first use;
    /// data operations never create them implicitly.
    #[error("Collection \"{0}\" does not exist")]
    CollectionNotFound(String),
    /// A filter used an operator tag outside the recognized set.
    ///
    /// This fails the whole query, not just the clause that carries it.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// A schema definition named a type marker that is not one of the four primitives.
    #[error("Unsupported schema type for field \"{0}\"")]
    UnsupportedSchemaType(String),
    /// A `$regex` pattern or its `$options` flags could not be compiled.
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),
    /// A filter or sort specification was not shaped as expected.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// A document could not be represented as a record (it was not a JSON object).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Serialization/deserialization error, including malformed data files.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    /// An error from the underlying file system.
    #[error(transparent)]
    Io(#[from] IoError),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<Infallible> for StoreError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
