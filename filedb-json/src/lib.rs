//! JSON file storage backend for filedb.
//!
//! This crate provides an implementation of the `StoreBackend` trait that keeps
//! each collection as a directory holding a `data.json` record array and a
//! `schema.json` type declaration. There is no caching: every operation reads
//! from disk and every change writes the whole collection back.
//!
//! # Features
//!
//! - **Human-readable files** - records are written as two-space-indented JSON
//! - **Lazy initialization** - a collection's data file is created on first read
//! - **Optional atomic writes** - temp file, fsync and rename instead of overwriting in place
//!
//! # Quick Start
//!
//! ```ignore
//! use filedb_core::{backend::StoreBackendBuilder, store::Database};
//! use filedb_json::JsonFileStore;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = JsonFileStore::builder().base_path("./.data").build().await?;
//!     let db = Database::new(backend);
//!
//!     db.create_collection("users", json!({"name": "String"})).await?;
//!     db.collection("users").await.insert_one(&json!({"name": "Ada"})).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as filedb_json;

pub mod fs;
pub mod store;

pub use store::{DEFAULT_BASE_PATH, JsonFileStore, JsonFileStoreBuilder};
