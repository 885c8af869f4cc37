//! Convenient re-exports of commonly used types from filedb.
//!
//! ```ignore
//! use filedb::prelude::*;
//! ```
//!
//! This provides access to:
//! - The database handle and collection handles
//! - Records, documents and schemas
//! - Filter, operator and sort construction
//! - Backends and builders
//! - Error types

pub use filedb_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::{Collection, DeleteResult, Find, TypedCollection, UpdateResult},
    error::{StoreError, StoreResult},
    query::{Filter, FilterValue, IntoFilter, Operator, OperatorSet, QueryPlan, Sort, SortDirection, SortSpec},
    record::{CREATED_AT_FIELD, Document, ID_FIELD, Record, Stored},
    schema::{FieldType, SchemaDefinition},
    store::Database,
};

pub use filedb_json::{JsonFileStore, JsonFileStoreBuilder};
