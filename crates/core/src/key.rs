//! Primary-key types and key generation
//!
//! Every document carries a primary key of some type implementing
//! [`DocumentKey`]. Each key type declares, at compile time, how fresh
//! values are produced:
//!
//! | Key type | Strategy | Fresh value |
//! |----------|----------|-------------|
//! | `uuid::Uuid` | `Random` | v4 UUID |
//! | `bson::oid::ObjectId` | `TimeOrdered` | database-native object id |
//! | `String`, integers | `CallerSupplied` | none, caller must set the key |
//!
//! [`KeyGenerator`] is the strategy table: a `match` on the declared
//! strategy, resolved per key type without runtime type inspection.
//! Key types defined outside this crate default to `CallerSupplied`.

use std::fmt::Debug;

use bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// How fresh values of a key type are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStrategy {
    /// Random, collision-resistant value
    Random,
    /// Time-ordered value from the database's native id format
    TimeOrdered,
    /// No generator; the caller must supply the key
    CallerSupplied,
}

impl KeyStrategy {
    /// True if values can be generated without the caller
    pub fn is_generated(&self) -> bool {
        !matches!(self, KeyStrategy::CallerSupplied)
    }
}

/// A primary-key type
///
/// The key is compared for equality and, once persisted, must not change.
pub trait DocumentKey:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// Generation strategy for this key type
    const STRATEGY: KeyStrategy = KeyStrategy::CallerSupplied;

    /// True if this value is the default (unset) value of the type
    fn is_default(&self) -> bool;

    /// Produce a fresh value
    ///
    /// Only called when [`Self::STRATEGY`] is not `CallerSupplied`.
    fn generate() -> Option<Self> {
        None
    }
}

impl DocumentKey for Uuid {
    const STRATEGY: KeyStrategy = KeyStrategy::Random;

    fn is_default(&self) -> bool {
        self.is_nil()
    }

    fn generate() -> Option<Self> {
        Some(Uuid::new_v4())
    }
}

impl DocumentKey for ObjectId {
    const STRATEGY: KeyStrategy = KeyStrategy::TimeOrdered;

    fn is_default(&self) -> bool {
        self.bytes() == [0u8; 12]
    }

    fn generate() -> Option<Self> {
        Some(ObjectId::new())
    }
}

impl DocumentKey for String {
    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! caller_supplied_integer_key {
    ($($ty:ty),*) => {
        $(
            impl DocumentKey for $ty {
                fn is_default(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

caller_supplied_integer_key!(i32, i64, u32, u64);

/// Key generation dispatch
pub struct KeyGenerator;

impl KeyGenerator {
    /// Strategy declared by key type `K`
    pub fn strategy<K: DocumentKey>() -> KeyStrategy {
        K::STRATEGY
    }

    /// True if `current` is the default value and a key must be assigned
    pub fn needs_key<K: DocumentKey>(current: &K) -> bool {
        current.is_default()
    }

    /// Fail with [`Error::UnsupportedKeyType`] if `K` cannot be generated
    pub fn ensure_supported<K: DocumentKey>() -> Result<()> {
        if K::STRATEGY.is_generated() {
            Ok(())
        } else {
            Err(unsupported::<K>())
        }
    }

    /// Produce a fresh key of type `K`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKeyType`] for caller-supplied key types.
    pub fn new_key<K: DocumentKey>() -> Result<K> {
        match K::STRATEGY {
            KeyStrategy::Random | KeyStrategy::TimeOrdered => {
                K::generate().ok_or_else(unsupported::<K>)
            }
            KeyStrategy::CallerSupplied => Err(unsupported::<K>()),
        }
    }
}

fn unsupported<K>() -> Error {
    Error::UnsupportedKeyType {
        key_type: std::any::type_name::<K>().to_string(),
    }
}
