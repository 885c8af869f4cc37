//! Storage backend abstraction for the document store.
//!
//! A backend persists whole collections: every operation on a
//! [`Collection`](crate::collection::Collection) loads the complete record set,
//! changes it in memory and hands the complete set back. Backends do no matching
//! of their own.
//!
//! # Concurrency
//!
//! The load/save pair is not atomic. Two operations that interleave between a
//! load and the following save on the same collection race: the later save wins
//! and silently discards the earlier one's change. Backends must not hide this
//! with implicit locking; the store assumes a single logical writer.
//!
//! Saves that overlap in time are a second hazard. A backend that overwrites its
//! storage in place can interleave the bytes of two saves and leave a collection
//! that no longer parses. `JsonFileStore` does this unless `atomic_writes` is
//! enabled, in which case each save lands whole and only the lost update remains.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::StoreResult, record::Record, schema::SchemaDefinition};

/// Abstract interface for collection storage.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns `true` if the collection has been created.
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool>;

    /// Loads every record of a collection, in stored order.
    ///
    /// A collection that was created but has no data yet is initialized to an
    /// empty record set as a side effect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CollectionNotFound`](crate::error::StoreError::CollectionNotFound)
    /// if the collection was never created. Read and parse failures propagate unchanged.
    async fn load_records(&self, collection: &str) -> StoreResult<Vec<Record>>;

    /// Replaces the stored contents of a collection with `records`.
    async fn save_records(&self, collection: &str, records: &[Record]) -> StoreResult<()>;

    /// Creates a collection and records its schema.
    ///
    /// Idempotent: an existing collection is left in place, and an existing schema
    /// is never overwritten, even if `schema` differs from it.
    async fn create_collection(&self, collection: &str, schema: &SchemaDefinition) -> StoreResult<()>;

    /// Reads the schema recorded for a collection, if there is one.
    async fn read_schema(&self, collection: &str) -> StoreResult<Option<SchemaDefinition>>;

    /// Lists the names of all created collections, sorted.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;
}

/// Factory trait for creating backend instances.
///
/// Builders carry a backend's configuration and perform any setup it needs
/// (creating a base directory, for example) in [`build`](StoreBackendBuilder::build).
#[async_trait]
pub trait StoreBackendBuilder: Send {
    /// The type of backend this builder creates.
    type Backend: StoreBackend;

    /// Builds and initializes the backend.
    async fn build(self) -> StoreResult<Self::Backend>;
}
