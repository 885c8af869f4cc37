//! Main filedb crate providing a single entry point to the document store.
//!
//! This crate re-exports the core types from `filedb-core` together with the JSON
//! file backend from `filedb-json`, and provides [`connect`] to open a database
//! over a directory.
//!
//! # Features
//!
//! - **One file per collection** - records live in `<base>/<collection>/data.json`
//! - **Write-once schemas** - field types declared at creation, kept in `schema.json`
//! - **Mongo-flavored queries** - `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in` and `$regex`
//!   with sort, skip and limit
//! - **Typed access** - store any Serde type implementing [`Document`](record::Document)
//!
//! # Quick Start
//!
//! ```ignore
//! use filedb::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let db = filedb::connect(Some("./.data")).await?;
//!     db.create_collection("users", json!({"name": "String", "age": "Number"})).await?;
//!
//!     let users = db.collection("users").await;
//!     users.insert_one(&json!({"name": "Alice", "age": 30})).await?;
//!     users.insert_one(&json!({"name": "Bob", "age": 25})).await?;
//!
//!     let adults = users
//!         .find(json!({"age": {"$gte": 18}}))
//!         .sort(("age", SortDirection::Desc))
//!         .limit(10)
//!         .exec()
//!         .await?;
//!
//!     users.update_one(json!({"name": "Bob"}), &json!({"age": 26})).await?;
//!     users.delete_many(json!({"name": "Alice"})).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Typed Collections
//!
//! ```ignore
//! use filedb::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub name: String,
//!     pub age: u32,
//! }
//!
//! impl Document for User {
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! let users = db.typed_collection::<User>().await;
//! let stored = users.insert_one(&User { name: "Alice".into(), age: 30 }).await?;
//! println!("{} created at {}", stored.id, stored.created_at);
//! ```
//!
//! # Backends
//!
//! - [`json`] - JSON file storage, one directory per collection

use std::path::Path;

pub mod prelude;

pub use filedb_core::{backend, collection, error, evaluator, pipeline, query, record, schema, store};

pub use async_trait::async_trait;
pub use serde_json;

/// JSON file storage backend implementations.
pub mod json {
    pub use filedb_json::{DEFAULT_BASE_PATH, JsonFileStore, JsonFileStoreBuilder, fs};
}

use backend::StoreBackendBuilder;
use error::StoreResult;
use json::JsonFileStore;
use store::Database;

/// Opens a database stored under `base_path`.
///
/// `None`, or a blank path, uses [`DEFAULT_BASE_PATH`](json::DEFAULT_BASE_PATH)
/// relative to the process's working directory. The base directory is created if
/// it does not exist; collections are not.
///
/// # Errors
///
/// Returns [`StoreError::Io`](error::StoreError::Io) if the base directory cannot
/// be created.
pub async fn connect<P: AsRef<Path>>(base_path: Option<P>) -> StoreResult<Database<JsonFileStore>> {
    let mut builder = JsonFileStore::builder();
    if let Some(path) = base_path {
        builder = builder.base_path(path);
    }

    Ok(Database::new(builder.build().await?))
}
