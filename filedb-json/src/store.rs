//! JSON file storage implementation for document stores.
//!
//! Every collection is a directory under the base path:
//!
//! ```text
//! <base>/<collection>/data.json    pretty-printed JSON array of records
//! <base>/<collection>/schema.json  field name -> type marker, written once
//! ```
//!
//! The directory's existence is what makes a collection exist. `data.json` is
//! created lazily, holding `[]`, the first time a collection is read.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use filedb_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    record::Record,
    schema::SchemaDefinition,
};

use crate::fs::{ensure_dir, ensure_json_file, exists, read_json, write_json, write_json_atomic};

/// Base directory used when none is configured.
pub const DEFAULT_BASE_PATH: &str = ".data";

const DATA_FILE: &str = "data.json";
const SCHEMA_FILE: &str = "schema.json";

/// Document storage backend keeping one JSON file per collection.
///
/// Reads and writes go straight to disk with no caching, so two stores over the
/// same base path see each other's writes. Nothing serializes concurrent
/// operations; see the [`backend`](filedb_core::backend) module docs.
///
/// # Example
///
/// ```ignore
/// use filedb_json::JsonFileStore;
/// use filedb_core::backend::StoreBackendBuilder;
///
/// let store = JsonFileStore::builder()
///     .base_path("./.data")
///     .atomic_writes(true)
///     .build()
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    base_path: PathBuf,
    atomic_writes: bool,
}

impl JsonFileStore {
    /// Creates a builder with the default configuration.
    pub fn builder() -> JsonFileStoreBuilder {
        JsonFileStoreBuilder::default()
    }

    /// The directory holding all collections.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Whether saves go through a temp file and rename.
    pub fn atomic_writes(&self) -> bool {
        self.atomic_writes
    }

    /// Directory of the collection called `name`.
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Path of the collection's record file.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.collection_path(name).join(DATA_FILE)
    }

    /// Path of the collection's schema file.
    pub fn schema_file(&self, name: &str) -> PathBuf {
        self.collection_path(name).join(SCHEMA_FILE)
    }

    /// Checks the collection exists and makes sure its data file does too.
    async fn ensure_data_file(&self, collection: &str) -> StoreResult<PathBuf> {
        if !self.collection_exists(collection).await? {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        let path = self.data_file(collection);
        if ensure_json_file(&path, &Value::Array(Vec::new())).await? {
            debug!(collection, path = %path.display(), "initialized data file");
        }

        Ok(path)
    }
}

#[async_trait]
impl StoreBackend for JsonFileStore {
    async fn collection_exists(&self, collection: &str) -> StoreResult<bool> {
        exists(self.collection_path(collection)).await
    }

    async fn load_records(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let path = self.ensure_data_file(collection).await?;
        let records: Vec<Record> = read_json(&path).await?;

        debug!(collection, count = records.len(), "loaded records");
        Ok(records)
    }

    async fn save_records(&self, collection: &str, records: &[Record]) -> StoreResult<()> {
        let path = self.data_file(collection);

        if self.atomic_writes {
            write_json_atomic(&path, records).await?;
        } else {
            write_json(&path, records).await?;
        }

        debug!(collection, count = records.len(), "saved records");
        Ok(())
    }

    async fn create_collection(&self, collection: &str, schema: &SchemaDefinition) -> StoreResult<()> {
        ensure_dir(self.collection_path(collection)).await?;

        let path = self.schema_file(collection);
        if exists(&path).await? {
            debug!(collection, "schema already recorded, leaving it unchanged");
        } else {
            write_json(&path, &schema.to_json()).await?;
            info!(collection, path = %path.display(), "recorded schema");
        }

        Ok(())
    }

    async fn read_schema(&self, collection: &str) -> StoreResult<Option<SchemaDefinition>> {
        let path = self.schema_file(collection);
        if !exists(&path).await? {
            return Ok(None);
        }

        let raw: Value = read_json(&path).await?;
        Ok(Some(SchemaDefinition::try_from(raw)?))
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        if !exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Builder for constructing [`JsonFileStore`] instances.
///
/// # Example
///
/// ```ignore
/// use filedb_json::JsonFileStore;
/// use filedb_core::backend::StoreBackendBuilder;
///
/// let store = JsonFileStore::builder().base_path("/var/lib/app").build().await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct JsonFileStoreBuilder {
    base_path: Option<PathBuf>,
    atomic_writes: bool,
}

impl JsonFileStoreBuilder {
    /// Sets the base directory. A blank path falls back to [`DEFAULT_BASE_PATH`].
    pub fn base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Writes data files through a temp file and rename instead of in place.
    /// Off by default.
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    fn resolve_base_path(&self) -> PathBuf {
        match &self.base_path {
            Some(path) if !path.as_os_str().to_string_lossy().trim().is_empty() => path.clone(),
            _ => PathBuf::from(DEFAULT_BASE_PATH),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for JsonFileStoreBuilder {
    type Backend = JsonFileStore;

    /// Creates the base directory if needed and returns the store.
    async fn build(self) -> StoreResult<Self::Backend> {
        let base_path = self.resolve_base_path();
        ensure_dir(&base_path).await?;

        info!(base_path = %base_path.display(), atomic_writes = self.atomic_writes, "opened json file store");

        Ok(JsonFileStore {
            base_path,
            atomic_writes: self.atomic_writes,
        })
    }
}
