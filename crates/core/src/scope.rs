//! Per-call routing scope
//!
//! [`Scope`] is the uniform final parameter of every predicate-based
//! operation: the partition key selecting the physical collection, and the
//! cancellation token forwarded to the driver call.

use tokio_util::sync::CancellationToken;

/// Partition key and cancellation token of one call
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    partition_key: Option<&'a str>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> Scope<'a> {
    /// No partition key, no cancellation
    pub fn none() -> Self {
        Scope::default()
    }

    /// Route to the collection of `partition_key`
    pub fn partition(partition_key: &'a str) -> Self {
        Scope {
            partition_key: Some(partition_key),
            cancel: None,
        }
    }

    /// Replace the partition key
    pub fn with_partition(mut self, partition_key: Option<&'a str>) -> Self {
        self.partition_key = partition_key;
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Partition key, if any
    pub fn partition_key(&self) -> Option<&'a str> {
        self.partition_key
    }

    /// Cancellation token, if any
    pub fn cancel(&self) -> Option<&'a CancellationToken> {
        self.cancel
    }
}

impl<'a> From<&'a str> for Scope<'a> {
    fn from(partition_key: &'a str) -> Self {
        Scope::partition(partition_key)
    }
}

impl<'a> From<Option<&'a str>> for Scope<'a> {
    fn from(partition_key: Option<&'a str>) -> Self {
        Scope::none().with_partition(partition_key)
    }
}
