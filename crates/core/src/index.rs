//! Index definitions and naming
//!
//! Auto-named indexes follow a deterministic rule so callers can predict
//! names without reading index metadata:
//!
//! | Kind | Key name |
//! |------|----------|
//! | Ascending | `<field>_1` |
//! | Descending | `<field>_-1` |
//! | Hashed | `<field>_hashed` |
//! | Text | `<field>_text` |
//!
//! Compound indexes join their key names with `_`, so a combined text index
//! over `title` and `body` is named `title_text_body_text`.

use std::time::Duration;

/// Name of the implicit primary-key index
pub const ID_INDEX_NAME: &str = "_id_";

/// Kind of one index key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Ascending b-tree key
    Ascending,
    /// Descending b-tree key
    Descending,
    /// Hashed key
    Hashed,
    /// Full-text key
    Text,
}

impl IndexKind {
    /// Suffix used in generated names
    pub fn suffix(&self) -> &'static str {
        match self {
            IndexKind::Ascending => "1",
            IndexKind::Descending => "-1",
            IndexKind::Hashed => "hashed",
            IndexKind::Text => "text",
        }
    }

    /// True for kinds that can enforce uniqueness
    pub fn supports_unique(&self) -> bool {
        matches!(self, IndexKind::Ascending | IndexKind::Descending)
    }
}

/// Options for index creation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexOptions {
    /// Explicit name; generated from the keys when absent
    pub name: Option<String>,
    /// Reject documents whose key values collide
    pub unique: bool,
    /// Skip documents missing the indexed field
    pub sparse: bool,
    /// Expire documents this long after the indexed time value
    ///
    /// `MemoryClient` stores this but never expires anything.
    pub expire_after: Option<Duration>,
}

impl IndexOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enforce uniqueness
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Skip documents missing the field
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Expire documents after `ttl`
    ///
    /// Forwarded to the driver as part of the model. The in-memory driver
    /// records and compares it but never expires documents.
    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }
}

/// Full definition of an index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexModel {
    keys: Vec<(String, IndexKind)>,
    options: IndexOptions,
}

impl IndexModel {
    /// Single-key index
    pub fn single(field: impl Into<String>, kind: IndexKind, options: IndexOptions) -> Self {
        IndexModel {
            keys: vec![(field.into(), kind)],
            options,
        }
    }

    /// Compound index over `keys` in order
    pub fn compound(keys: Vec<(String, IndexKind)>, options: IndexOptions) -> Self {
        IndexModel { keys, options }
    }

    /// Indexed keys in order
    pub fn keys(&self) -> &[(String, IndexKind)] {
        &self.keys
    }

    /// Creation options
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// True if uniqueness is enforced
    pub fn is_unique(&self) -> bool {
        self.options.unique
    }

    /// Name derived from the keys
    pub fn generated_name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, kind)| format!("{}_{}", field, kind.suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Explicit name, or the generated one
    pub fn name(&self) -> String {
        self.options
            .name
            .clone()
            .unwrap_or_else(|| self.generated_name())
    }

    /// True if both models index the same keys
    pub fn same_keys(&self, other: &IndexModel) -> bool {
        self.keys == other.keys
    }
}
