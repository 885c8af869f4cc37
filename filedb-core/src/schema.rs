//! Schema declarations for collections.
//!
//! A schema records the primitive type expected for each field. It is written
//! once, when a collection is created, and is never checked against the data:
//! inserts and updates do not consult it, and a missing schema file does not
//! block any data operation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{StoreError, StoreResult},
    record::kind_of,
};

/// One of the four primitive field types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
}

impl FieldType {
    /// The tag persisted in the schema file.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ();

    /// Accepts the persisted tag (`"string"`) or the type name (`"String"`).
    fn from_str(marker: &str) -> Result<Self, Self::Err> {
        match marker {
            "string" | "String" => Ok(FieldType::String),
            "number" | "Number" => Ok(FieldType::Number),
            "boolean" | "Boolean" => Ok(FieldType::Boolean),
            "date" | "Date" => Ok(FieldType::Date),
            _ => Err(()),
        }
    }
}

/// Ordered mapping from field name to its declared [`FieldType`].
///
/// # Example
///
/// ```ignore
/// use filedb::schema::{FieldType, SchemaDefinition};
///
/// let schema = SchemaDefinition::new()
///     .field("name", FieldType::String)
///     .field("age", FieldType::Number);
///
/// // or from a JSON declaration
/// let same = SchemaDefinition::try_from(serde_json::json!({
///     "name": "String",
///     "age": "Number",
/// }))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    fields: Vec<(String, FieldType)>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with type `field_type`, replacing an earlier declaration.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = field_type,
            None => self.fields.push((name, field_type)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, field_type)| *field_type)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields
            .iter()
            .map(|(name, field_type)| (name.as_str(), *field_type))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The schema file's JSON form: `{"field": "string", ...}`.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, field_type)| (name.clone(), Value::String(field_type.as_str().to_string())))
                .collect::<Map<_, _>>(),
        )
    }
}

impl TryFrom<Value> for SchemaDefinition {
    type Error = StoreError;

    /// Parses a schema declaration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedSchemaType`] naming the first field whose
    /// marker is not one of the four primitive types.
    fn try_from(value: Value) -> StoreResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidDocument(format!(
                    "schema must be an object, found {}",
                    kind_of(&other)
                )));
            }
        };

        map.into_iter()
            .try_fold(SchemaDefinition::new(), |schema, (name, marker)| {
                match marker.as_str().map(FieldType::from_str) {
                    Some(Ok(field_type)) => Ok(schema.field(name, field_type)),
                    _ => Err(StoreError::UnsupportedSchemaType(name)),
                }
            })
    }
}

impl FromIterator<(String, FieldType)> for SchemaDefinition {
    fn from_iter<I: IntoIterator<Item = (String, FieldType)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(SchemaDefinition::new(), |schema, (name, field_type)| {
                schema.field(name, field_type)
            })
    }
}
