//! Collection handles and the query builder.
//!
//! - [`Collection`] - untyped handle working with [`Record`]s
//! - [`TypedCollection`] - handle for a specific [`Document`] type
//! - [`Find`] - lazily executed query returned by `find`
//!
//! Every operation is one read-modify-write cycle against the backend: load the
//! whole collection, apply the change in memory, and save the whole collection
//! back. Operations that change nothing do not save.
//!
//! `find` understands the full operator set. `find_one`, the update operations
//! and the delete operations match on plain equality only: a field given an
//! operator set never matches in those paths.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//!
//! let users = db.collection("users").await;
//! users.insert_one(&json!({"name": "Ada", "age": 36})).await?;
//!
//! let adults = users
//!     .find(json!({"age": {"$gte": 18}}))
//!     .sort(("age", SortDirection::Asc))
//!     .limit(10)
//!     .exec()
//!     .await?;
//! ```

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{marker::PhantomData, sync::Arc};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    evaluator::matches_equality,
    pipeline,
    query::{Filter, IntoFilter, QueryPlan, SortSpec},
    record::{Document, ID_FIELD, Record, Stored, from_record, stamp, to_record},
};

/// Outcome of an update operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    /// Records that satisfied the filter.
    pub matched: usize,
    /// Records that were rewritten. Every matched record is rewritten.
    pub modified: usize,
}

/// Outcome of a delete operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Records removed from the collection.
    pub deleted: usize,
}

/// An untyped collection bound to a backend.
///
/// Handles are cheap to clone. Creating one performs no I/O and no existence
/// check; a missing collection is reported by the first data operation.
#[derive(Debug)]
pub struct Collection<B: StoreBackend> {
    name: Arc<str>,
    backend: Arc<B>,
}

impl<B: StoreBackend> Clone for Collection<B> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StoreBackend> Collection<B> {
    pub(crate) fn new(name: &str, backend: Arc<B>) -> Self {
        Self { name: Arc::from(name), backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loads every record in stored order.
    pub async fn all(&self) -> StoreResult<Vec<Record>> {
        self.backend
            .load_records(&self.name)
            .await
    }

    /// Inserts one document and returns it as stored, with `_id` and `createdAt`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocument`] if `doc` is not a JSON object, and
    /// [`StoreError::CollectionNotFound`] if the collection was never created.
    pub async fn insert_one<T: Serialize + ?Sized>(&self, doc: &T) -> StoreResult<Record> {
        let record = stamp(to_record(doc)?);
        let mut records = self.all().await?;

        records.push(record.clone());
        self.backend
            .save_records(&self.name, &records)
            .await?;

        debug!(collection = %self.name, id = ?record.get(ID_FIELD), "inserted record");
        Ok(record)
    }

    /// Alias for [`insert_one`](Self::insert_one).
    pub async fn create<T: Serialize + ?Sized>(&self, doc: &T) -> StoreResult<Record> {
        self.insert_one(doc).await
    }

    /// Inserts several documents in one write, preserving their order.
    pub async fn insert_many<T: Serialize>(
        &self,
        docs: impl IntoIterator<Item = T>,
    ) -> StoreResult<Vec<Record>> {
        let stamped = docs
            .into_iter()
            .map(|doc| to_record(&doc).map(stamp))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut records = self.all().await?;

        if stamped.is_empty() {
            return Ok(stamped);
        }

        records.extend(stamped.iter().cloned());
        self.backend
            .save_records(&self.name, &records)
            .await?;

        debug!(collection = %self.name, inserted = stamped.len(), "inserted records");
        Ok(stamped)
    }

    /// Returns the first record, in stored order, whose fields strictly equal
    /// every field of `filter`.
    pub async fn find_one(&self, filter: impl IntoFilter) -> StoreResult<Option<Record>> {
        let filter = filter.into_filter()?;

        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|record| matches_equality(record, &filter)))
    }

    /// Starts a query. Nothing is read until [`Find::exec`] is called.
    pub fn find(&self, filter: impl IntoFilter) -> Find<B> {
        Find::new(self.clone(), filter.into_filter())
    }

    /// Shallow-merges `patch` into the first matching record.
    ///
    /// Patch fields overwrite existing ones, unlisted fields are kept. `_id` and
    /// `createdAt` are not protected from the patch.
    pub async fn update_one<T: Serialize + ?Sized>(
        &self,
        filter: impl IntoFilter,
        patch: &T,
    ) -> StoreResult<UpdateResult> {
        self.update(filter.into_filter()?, to_record(patch)?, false)
            .await
    }

    /// Shallow-merges `patch` into every matching record.
    pub async fn update_many<T: Serialize + ?Sized>(
        &self,
        filter: impl IntoFilter,
        patch: &T,
    ) -> StoreResult<UpdateResult> {
        self.update(filter.into_filter()?, to_record(patch)?, true)
            .await
    }

    async fn update(&self, filter: Filter, patch: Record, many: bool) -> StoreResult<UpdateResult> {
        let mut records = self.all().await?;
        let mut result = UpdateResult::default();

        for record in records
            .iter_mut()
            .filter(|record| matches_equality(record, &filter))
        {
            result.matched += 1;
            for (key, value) in &patch {
                record.insert(key.clone(), value.clone());
            }
            result.modified += 1;

            if !many {
                break;
            }
        }

        if result.modified > 0 {
            self.backend
                .save_records(&self.name, &records)
                .await?;
        }

        debug!(
            collection = %self.name,
            matched = result.matched,
            modified = result.modified,
            "updated records"
        );
        Ok(result)
    }

    /// Removes the first matching record.
    pub async fn delete_one(&self, filter: impl IntoFilter) -> StoreResult<DeleteResult> {
        let filter = filter.into_filter()?;
        let mut records = self.all().await?;

        let Some(index) = records
            .iter()
            .position(|record| matches_equality(record, &filter))
        else {
            return Ok(DeleteResult { deleted: 0 });
        };

        records.remove(index);
        self.backend
            .save_records(&self.name, &records)
            .await?;

        debug!(collection = %self.name, deleted = 1, "deleted records");
        Ok(DeleteResult { deleted: 1 })
    }

    /// Removes every matching record. Survivors keep their relative order.
    pub async fn delete_many(&self, filter: impl IntoFilter) -> StoreResult<DeleteResult> {
        let filter = filter.into_filter()?;
        let mut records = self.all().await?;
        let before = records.len();

        records.retain(|record| !matches_equality(record, &filter));
        let deleted = before - records.len();

        if deleted > 0 {
            self.backend
                .save_records(&self.name, &records)
                .await?;
        }

        debug!(collection = %self.name, deleted, "deleted records");
        Ok(DeleteResult { deleted })
    }
}

/// A lazily executed query over one collection.
///
/// The builder methods only record the plan; no I/O, filtering or sorting
/// happens until [`exec`](Find::exec) is awaited. Execution loads the collection,
/// filters, sorts on the first sort key, then applies skip and limit.
#[must_use = "a query does nothing until `exec` is awaited"]
#[derive(Debug)]
pub struct Find<B: StoreBackend, T = Record> {
    collection: Collection<B>,
    plan: QueryPlan,
    error: Option<StoreError>,
    _marker: PhantomData<fn() -> T>,
}

impl<B: StoreBackend, T: DeserializeOwned> Find<B, T> {
    fn new(collection: Collection<B>, filter: StoreResult<Filter>) -> Self {
        let (filter, error) = match filter {
            Ok(filter) => (filter, None),
            Err(err) => (Filter::new(), Some(err)),
        };

        Self {
            collection,
            plan: QueryPlan::new(filter),
            error,
            _marker: PhantomData,
        }
    }

    /// Drops the first `n` matched and sorted records. Defaults to 0.
    pub fn skip(mut self, n: usize) -> Self {
        self.plan.skip = n;
        self
    }

    /// Returns at most `n` records after skipping. Unbounded by default.
    pub fn limit(mut self, n: usize) -> Self {
        self.plan.limit = Some(n);
        self
    }

    /// Sorts by the first key of `spec`; further keys are ignored.
    pub fn sort(mut self, spec: impl Into<SortSpec>) -> Self {
        self.plan.sort = Some(spec.into());
        self
    }

    /// Sorts using a sort document such as `{"age": -1}`.
    pub fn sort_json(mut self, spec: Value) -> Self {
        match SortSpec::from_json(spec) {
            Ok(spec) => self.plan.sort = Some(spec),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// The plan as built so far.
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Consumes the builder and returns its plan without running it.
    ///
    /// Fails with the first filter or sort conversion error, if any.
    pub fn into_plan(self) -> StoreResult<QueryPlan> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.plan),
        }
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::CollectionNotFound`] for a collection that was never
    /// created, [`StoreError::UnsupportedOperator`] or [`StoreError::InvalidRegex`]
    /// for a filter that cannot be evaluated, and [`StoreError::InvalidFilter`] for a
    /// malformed filter or sort document.
    pub async fn exec(self) -> StoreResult<Vec<T>> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let records = self.collection.all().await?;
        let scanned = records.len();
        let results = pipeline::apply(&self.plan, records)?;

        debug!(
            collection = %self.collection.name(),
            scanned,
            returned = results.len(),
            "executed query"
        );

        results
            .into_iter()
            .map(from_record)
            .collect()
    }

    /// Runs the query and returns only its first result.
    pub async fn first(self) -> StoreResult<Option<T>> {
        let limit = self.plan.limit.map_or(1, |n| n.min(1));

        Ok(self
            .limit(limit)
            .exec()
            .await?
            .into_iter()
            .next())
    }
}

/// A collection handle for one [`Document`] type.
///
/// Inserted documents come back as [`Stored<D>`], carrying the generated `_id`
/// and `createdAt` next to the document itself.
#[derive(Debug)]
pub struct TypedCollection<B: StoreBackend, D: Document> {
    inner: Collection<B>,
    _marker: PhantomData<fn() -> D>,
}

impl<B: StoreBackend, D: Document> Clone for TypedCollection<B, D> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<B: StoreBackend, D: Document> TypedCollection<B, D> {
    pub(crate) fn new(inner: Collection<B>) -> Self {
        Self { inner, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The untyped handle for the same collection.
    pub fn untyped(&self) -> &Collection<B> {
        &self.inner
    }

    pub async fn insert_one(&self, doc: &D) -> StoreResult<Stored<D>> {
        from_record(self.inner.insert_one(doc).await?)
    }

    /// Alias for [`insert_one`](Self::insert_one).
    pub async fn create(&self, doc: &D) -> StoreResult<Stored<D>> {
        self.insert_one(doc).await
    }

    pub async fn insert_many(&self, docs: impl IntoIterator<Item = D>) -> StoreResult<Vec<Stored<D>>> {
        self.inner
            .insert_many(docs)
            .await?
            .into_iter()
            .map(from_record)
            .collect()
    }

    pub async fn find_one(&self, filter: impl IntoFilter) -> StoreResult<Option<Stored<D>>> {
        self.inner
            .find_one(filter)
            .await?
            .map(from_record)
            .transpose()
    }

    pub fn find(&self, filter: impl IntoFilter) -> Find<B, Stored<D>> {
        Find::new(self.inner.clone(), filter.into_filter())
    }

    pub async fn update_one<T: Serialize + ?Sized>(
        &self,
        filter: impl IntoFilter,
        patch: &T,
    ) -> StoreResult<UpdateResult> {
        self.inner.update_one(filter, patch).await
    }

    pub async fn update_many<T: Serialize + ?Sized>(
        &self,
        filter: impl IntoFilter,
        patch: &T,
    ) -> StoreResult<UpdateResult> {
        self.inner.update_many(filter, patch).await
    }

    pub async fn delete_one(&self, filter: impl IntoFilter) -> StoreResult<DeleteResult> {
        self.inner.delete_one(filter).await
    }

    pub async fn delete_many(&self, filter: impl IntoFilter) -> StoreResult<DeleteResult> {
        self.inner.delete_many(filter).await
    }
}
