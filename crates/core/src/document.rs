//! Document model
//!
//! A document is any serde-serializable value identified by a primary key.
//! Documents are stored in their serialized JSON form; the key lives under
//! the [`ID_FIELD`] field, so implementors annotate their key field with
//! `#[serde(rename = "_id")]`. Field-name conventions (case, null
//! inclusion) are owned by serde attributes on the document type.
//!
//! # Partitioning
//!
//! A document type opts into partitioning by setting
//! [`Document::PARTITIONED`] and returning its tenant tag from
//! [`Document::partition_key`]. The capability is a per-type constant;
//! instances are only consulted for the key value itself.
//!
//! # Example
//!
//! ```
//! use docrepo_core::Document;
//! use serde::{Deserialize, Serialize};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Invoice {
//!     #[serde(rename = "_id")]
//!     id: Uuid,
//!     tenant: String,
//!     total: i64,
//! }
//!
//! impl Document for Invoice {
//!     type Key = Uuid;
//!     const PARTITIONED: bool = true;
//!
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn set_id(&mut self, id: Uuid) { self.id = id; }
//!     fn partition_key(&self) -> Option<&str> { Some(&self.tenant) }
//! }
//!
//! assert_eq!(Invoice::collection_name(), "Invoice");
//! ```

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::key::DocumentKey;

/// Stored field holding the primary key
pub const ID_FIELD: &str = "_id";

/// A storable document
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary-key type
    type Key: DocumentKey;

    /// True if instances are routed to per-partition collections
    const PARTITIONED: bool = false;

    /// Primary key of this instance
    fn id(&self) -> &Self::Key;

    /// Assign the primary key
    fn set_id(&mut self, id: Self::Key);

    /// Partition key of this instance
    ///
    /// Only consulted when [`Self::PARTITIONED`] is true.
    fn partition_key(&self) -> Option<&str> {
        None
    }

    /// Base name of the collection holding this type
    ///
    /// Defaults to the bare type name.
    fn collection_name() -> Cow<'static, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

/// Bare name of a type, without module path or generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Partition key used to route `document`
///
/// Returns `None` for unpartitioned types.
///
/// # Errors
///
/// Returns [`Error::MissingPartitionKey`] when a partitioned document has
/// no (or an empty) partition key.
pub fn routing_partition<D: Document>(document: &D) -> Result<Option<&str>> {
    if !D::PARTITIONED {
        return Ok(None);
    }
    match document.partition_key() {
        Some(pk) if !pk.is_empty() => Ok(Some(pk)),
        _ => Err(Error::MissingPartitionKey {
            document_type: short_type_name::<D>().to_string(),
        }),
    }
}

/// Serialize a document into its stored form
pub fn to_stored<D: Document>(document: &D) -> Result<JsonValue> {
    let value = serde_json::to_value(document)?;
    if !value.is_object() {
        return Err(Error::Serialization(format!(
            "document type '{}' must serialize to an object",
            short_type_name::<D>()
        )));
    }
    Ok(value)
}

/// Deserialize a document from its stored form
pub fn from_stored<D: Document>(value: JsonValue) -> Result<D> {
    Ok(serde_json::from_value(value)?)
}

/// Stored form of a primary key
pub fn key_to_stored<K: DocumentKey>(key: &K) -> Result<JsonValue> {
    Ok(serde_json::to_value(key)?)
}

/// Value at a dotted path of a stored document
///
/// Numeric segments index into arrays: `lines.0.amount`.
pub fn field_value<'a>(stored: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = stored;
    for segment in path.split('.') {
        current = match current {
            JsonValue::Object(obj) => obj.get(segment)?,
            JsonValue::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
