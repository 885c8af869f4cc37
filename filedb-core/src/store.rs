//! The database handle.
//!
//! [`Database`] owns a backend and hands out collection handles by name. Handles
//! are created on demand and cached; asking for a collection never touches the
//! backend. Only [`Database::create_collection`] creates on-disk structure.

use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::info;

use crate::{
    backend::StoreBackend,
    collection::{Collection, TypedCollection},
    error::{StoreError, StoreResult},
    record::Document,
    schema::SchemaDefinition,
};

/// A document database bound to a specific backend implementation.
///
/// # Example
///
/// ```ignore
/// use filedb::prelude::*;
/// use serde_json::json;
///
/// let db = filedb::connect(Some("./.data")).await?;
/// db.create_collection("users", json!({"name": "String", "age": "Number"})).await?;
///
/// let users = db.collection("users").await;
/// users.insert_one(&json!({"name": "Ada", "age": 36})).await?;
/// ```
#[derive(Debug)]
pub struct Database<B: StoreBackend> {
    backend: Arc<B>,
    collections: RwLock<HashMap<String, Collection<B>>>,
}

impl<B: StoreBackend> Database<B> {
    /// Creates a database over `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates a collection and records its schema.
    ///
    /// Idempotent. The schema is write-once: calling this again for an existing
    /// collection with a different schema leaves the recorded schema unchanged.
    ///
    /// `schema` may be a [`SchemaDefinition`] or a JSON declaration such as
    /// `{"name": "String", "age": "Number"}`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedSchemaType`] if a JSON declaration names a
    /// type marker other than string, number, boolean or date.
    pub async fn create_collection<S>(&self, name: &str, schema: S) -> StoreResult<()>
    where
        S: TryInto<SchemaDefinition>,
        S::Error: Into<StoreError>,
    {
        let schema: SchemaDefinition = schema
            .try_into()
            .map_err(Into::<StoreError>::into)?;

        self.backend
            .create_collection(name, &schema)
            .await?;

        info!(collection = name, fields = schema.len(), "created collection");
        Ok(())
    }

    /// Returns the handle for the collection called `name`.
    ///
    /// No existence check happens here; operations on a collection that was never
    /// created fail with [`StoreError::CollectionNotFound`].
    pub async fn collection(&self, name: &str) -> Collection<B> {
        if let Some(collection) = self.collections.read().await.get(name) {
            return collection.clone();
        }

        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(name, Arc::clone(&self.backend)))
            .clone()
    }

    /// Returns a typed handle for the collection named by `D::collection_name()`.
    pub async fn typed_collection<D: Document>(&self) -> TypedCollection<B, D> {
        TypedCollection::new(self.collection(D::collection_name()).await)
    }

    /// Reads the schema recorded for `name`, if any.
    pub async fn schema(&self, name: &str) -> StoreResult<Option<SchemaDefinition>> {
        self.backend.read_schema(name).await
    }

    /// Lists all created collections.
    pub async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.backend.list_collections().await
    }
}
