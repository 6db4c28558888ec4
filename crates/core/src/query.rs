//! Driver-native query expressions
//!
//! These are the predicate, selector, sort, projection and update shapes the
//! database client understands. The repository engine never inspects or
//! rewrites them; it only routes them to the right collection.
//!
//! Field names are storage names (after serde renames) and may be dotted
//! paths into nested objects (`"address.city"`).
//!
//! ```
//! use docrepo_core::query::{Field, Filter, SortDefinition, UpdateDefinition};
//!
//! let amount: Field<i64> = Field::new("some_amount");
//! let filter = Filter::eq("content", "T").and(amount.gte(20));
//! let sort = SortDefinition::descending("some_amount").then_ascending("_id");
//! let update = UpdateDefinition::new().set("status", "paid").inc("attempts", 1);
//! assert_eq!(sort.keys().len(), 2);
//! assert_eq!(update.ops().len(), 2);
//! # let _ = filter;
//! ```

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default number of documents returned by one page
pub const DEFAULT_PAGE_SIZE: u64 = 50;

// ============================================================================
// Field selector
// ============================================================================

/// Typed selector for one stored field
///
/// `T` is the Rust type the field's value deserializes into.
pub struct Field<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    /// Selector for a field with a static name
    pub const fn new(name: &'static str) -> Self {
        Field {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Selector for a field with a computed name
    pub fn named(name: impl Into<String>) -> Self {
        Field {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    /// Storage name of the field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `field == value`
    pub fn eq(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::eq(self.name(), value)
    }

    /// `field != value`
    pub fn ne(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::ne(self.name(), value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::gt(self.name(), value)
    }

    /// `field >= value`
    pub fn gte(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::gte(self.name(), value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::lt(self.name(), value)
    }

    /// `field <= value`
    pub fn lte(&self, value: impl Into<JsonValue>) -> Filter {
        Filter::lte(self.name(), value)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Field {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

impl<T> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Predicate over stored documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Filter {
    /// Matches every document
    #[default]
    All,
    /// Field equals value
    Eq(String, JsonValue),
    /// Field differs from value (or is missing)
    Ne(String, JsonValue),
    /// Field greater than value
    Gt(String, JsonValue),
    /// Field greater than or equal to value
    Gte(String, JsonValue),
    /// Field less than value
    Lt(String, JsonValue),
    /// Field less than or equal to value
    Lte(String, JsonValue),
    /// Field equals one of the values
    In(String, Vec<JsonValue>),
    /// Field equals none of the values
    Nin(String, Vec<JsonValue>),
    /// Field presence (`true`) or absence (`false`)
    Exists(String, bool),
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
    /// Sub-filter does not match
    Not(Box<Filter>),
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Filter::All
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Gte(field.into(), value.into())
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Lte(field.into(), value.into())
    }

    /// `field in values`
    pub fn is_in<V: Into<JsonValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// `field not in values`
    pub fn not_in<V: Into<JsonValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::Nin(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Field is present
    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), true)
    }

    /// Field is absent
    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), false)
    }

    /// Conjunction, flattening nested `And`s and dropping `All`
    pub fn and(self, other: Filter) -> Self {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                f => parts.push(f),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.pop().unwrap_or_default(),
            _ => Filter::And(parts),
        }
    }

    /// Disjunction
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut inner) => {
                inner.push(other);
                Filter::Or(inner)
            }
            f => Filter::Or(vec![f, other]),
        }
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// True for the match-everything filter
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

// ============================================================================
// Sort
// ============================================================================

/// Sort order of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// Direction from an ascending flag
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

/// Multi-key sort specification, applied key by key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SortDefinition {
    keys: Vec<(String, SortDirection)>,
}

impl SortDefinition {
    /// Sort by `field`, smallest first
    pub fn ascending(field: impl Into<String>) -> Self {
        SortDefinition {
            keys: vec![(field.into(), SortDirection::Ascending)],
        }
    }

    /// Sort by `field`, largest first
    pub fn descending(field: impl Into<String>) -> Self {
        SortDefinition {
            keys: vec![(field.into(), SortDirection::Descending)],
        }
    }

    /// Sort by `field` in `direction`
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        SortDefinition {
            keys: vec![(field.into(), direction)],
        }
    }

    /// Add an ascending tie-breaker
    pub fn then_ascending(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortDirection::Ascending));
        self
    }

    /// Add a descending tie-breaker
    pub fn then_descending(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortDirection::Descending));
        self
    }

    /// Sort keys in priority order
    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    /// True if no key is set
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Fields to return from matched documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    fields: Vec<String>,
    include_id: bool,
}

impl Projection {
    /// Return only `fields` (plus `_id`)
    pub fn include<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Projection {
            fields: fields.into_iter().map(Into::into).collect(),
            include_id: true,
        }
    }

    /// Do not return `_id`
    pub fn without_id(mut self) -> Self {
        self.include_id = false;
        self
    }

    /// Included fields
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// True if `_id` is returned
    pub fn includes_id(&self) -> bool {
        self.include_id
    }
}

// ============================================================================
// Update definition
// ============================================================================

/// One mutation of an update definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateOp {
    /// Set field to value, creating intermediate objects
    Set(String, JsonValue),
    /// Remove field
    Unset(String),
    /// Add a number to the field (missing counts as zero)
    Inc(String, JsonValue),
    /// Append value to the array field (missing counts as empty)
    Push(String, JsonValue),
}

/// Driver-native description of a mutation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateDefinition {
    ops: Vec<UpdateOp>,
}

impl UpdateDefinition {
    /// Empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`
    pub fn set(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.ops.push(UpdateOp::Set(field.into(), value.into()));
        self
    }

    /// Remove `field`
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push(UpdateOp::Unset(field.into()));
        self
    }

    /// Increment `field` by `amount`
    pub fn inc(mut self, field: impl Into<String>, amount: impl Into<JsonValue>) -> Self {
        self.ops.push(UpdateOp::Inc(field.into(), amount.into()));
        self
    }

    /// Append `value` to the array `field`
    pub fn push(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.ops.push(UpdateOp::Push(field.into(), value.into()));
        self
    }

    /// Mutations in application order
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    /// True if the definition carries no mutation
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ============================================================================
// Find options and results
// ============================================================================

/// Shaping applied to a find
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindOptions {
    /// Sort applied before skip/limit
    pub sort: Option<SortDefinition>,
    /// Number of sorted matches to skip
    pub skip: u64,
    /// Maximum number of documents returned
    pub limit: Option<u64>,
    /// Fields returned
    pub projection: Option<Projection>,
}

impl FindOptions {
    /// No sort, skip, limit or projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort
    pub fn sort(mut self, sort: SortDefinition) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the skip count
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the projection
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Zero-based window over a filtered, sorted result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Documents skipped
    pub skip: u64,
    /// Documents returned at most
    pub take: u64,
}

impl Page {
    /// Window of `take` documents after `skip`
    pub fn new(skip: u64, take: u64) -> Self {
        Page { skip, take }
    }

    /// First `take` documents
    pub fn first(take: u64) -> Self {
        Page { skip: 0, take }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            skip: 0,
            take: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Outcome of an update as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Documents matched by the filter
    pub matched: u64,
    /// Documents actually changed
    pub modified: u64,
}

/// Documents sharing a group key, as returned by the driver
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGroup {
    /// Stored value of the group key (`null` when missing)
    pub key: JsonValue,
    /// Members in natural order
    pub documents: Vec<JsonValue>,
}

/// Typed group handed to group projections
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping<K, D> {
    /// Group key
    pub key: K,
    /// Members in natural order
    pub documents: Vec<D>,
}

impl<K, D> Grouping<K, D> {
    /// Number of members
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True if the group has no members
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
