//! Core of a minimal embedded document store.
//!
//! Each named collection is persisted as one JSON array, with a companion schema
//! recording declared field types. This crate provides:
//!
//! - **Records** ([`record`]) - the stored document shape, system fields and typed access
//! - **Filters** ([`query`]) - filter documents, operator sets and sort specifications
//! - **Predicate evaluation** ([`evaluator`]) - deciding whether a record matches a filter
//! - **Query pipeline** ([`pipeline`]) - filter, sort, skip and limit over a record set
//! - **Schemas** ([`schema`]) - write-once field type declarations
//! - **Backends** ([`backend`]) - the storage seam a collection reads and writes through
//! - **Collections** ([`collection`]) - insert/find/update/delete and the query builder
//! - **Database handle** ([`store`]) - collection creation and by-name access
//! - **Errors** ([`error`])
//!
//! Storage itself lives in backend crates such as `filedb-json`.

#[allow(unused_extern_crates)]
extern crate self as filedb_core;

pub mod backend;
pub mod collection;
pub mod error;
pub mod evaluator;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;
