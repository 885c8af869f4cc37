//! Records, system fields and typed document access.
//!
//! A [`Record`] is one stored document: an ordered JSON object. Every record
//! written through an insert operation carries two system fields, [`ID_FIELD`]
//! and [`CREATED_AT_FIELD`], placed ahead of the caller's own fields.
//!
//! Typed access goes through the [`Document`] trait and the [`Stored`] wrapper,
//! which exposes the system fields next to the user's own type.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// One stored document.
///
/// Key order is preserved, so a record reads back from disk exactly as it was written.
pub type Record = Map<String, Value>;

/// Name of the system-assigned identifier field.
pub const ID_FIELD: &str = "_id";

/// Name of the system-assigned creation timestamp field.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Trait for types stored through a [`TypedCollection`](crate::collection::TypedCollection).
///
/// # Example
///
/// ```ignore
/// use filedb::record::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub name: String,
///     pub age: u32,
/// }
///
/// impl Document for User {
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// A typed document as persisted, together with its system fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<D> {
    /// The opaque identifier assigned at insertion.
    #[serde(rename = "_id")]
    pub id: String,
    /// ISO-8601 timestamp assigned at insertion.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// The user's own fields.
    #[serde(flatten)]
    pub document: D,
}

/// Generates a new opaque record identifier.
pub fn generate_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
}

/// Current UTC time as an ISO-8601 string with millisecond precision, e.g.
/// `2024-05-01T12:30:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Builds the record that an insert persists.
///
/// `_id` and `createdAt` come first and are always freshly generated; a value the
/// caller supplied for either field is replaced rather than preserved.
pub fn stamp(record: Record) -> Record {
    let mut stamped = Record::with_capacity(record.len() + 2);
    stamped.insert(ID_FIELD.to_string(), Value::String(generate_id()));
    stamped.insert(CREATED_AT_FIELD.to_string(), Value::String(timestamp()));

    for (key, value) in record {
        if key == ID_FIELD || key == CREATED_AT_FIELD {
            continue;
        }
        stamped.insert(key, value);
    }

    stamped
}

/// Serializes any value into a record.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDocument`] if the value does not serialize to a JSON object.
pub fn to_record<T: Serialize + ?Sized>(value: &T) -> StoreResult<Record> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, found {}",
            kind_of(&other)
        ))),
    }
}

/// Deserializes a record into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(from_value(Value::Object(record))?)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
