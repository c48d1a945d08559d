//! Sharding-client collaborator seam
//!
//! The component that actually maps keys to cluster members and performs
//! cache operations is external to this crate. It is expressed here as a
//! pair of traits so `ClusterAwareCache` can rebuild it from a fresh
//! member list after every invalidation, and so tests can substitute
//! fakes without patching internals.

use std::collections::HashMap;

use super::options::CacheOptions;
use crate::cluster::Address;
use crate::utils::Result;

/// Raw cache value at the sharding seam. Serialization is the host's
/// concern; an empty byte string is a legitimate stored value, distinct
/// from "not found".
pub type Value = Vec<u8>;

/// Cache operations against a fixed set of cluster members
///
/// Implementations perform their own per-key shard selection. Built over
/// zero members, every operation should miss or no-op rather than panic.
pub trait ShardClient: Send {
    /// Fetch a value. `None` is the not-found sentinel.
    fn get(&mut self, key: &str) -> Result<Option<Value>>;

    /// Store a value, returning whether the store succeeded.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<bool>;

    /// Store only if absent. False when the key already exists or the
    /// cluster is unreachable.
    fn add(&mut self, key: &str, value: &[u8]) -> Result<bool>;

    /// Delete a key. Absent-key semantics are the implementation's and are
    /// passed through unchanged by the cache wrapper.
    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Increment a numeric value. `None` when the key is missing or its
    /// contents are not numeric.
    fn incr(&mut self, key: &str, delta: u64) -> Result<Option<u64>>;

    /// Decrement a numeric value. `None` on the same failures as `incr`.
    fn decr(&mut self, key: &str, delta: u64) -> Result<Option<u64>>;

    /// Fetch many keys. Keys with no entry are absent from the map;
    /// present-but-empty values are included.
    fn get_many(&mut self, keys: &[String]) -> Result<HashMap<String, Value>>;

    /// Store many entries, returning the keys that failed in order.
    fn set_many(&mut self, entries: &[(String, Value)]) -> Result<Vec<String>>;

    /// Delete many keys, fire-and-forget.
    fn delete_many(&mut self, keys: &[String]) -> Result<()>;
}

/// Builds a `ShardClient` over a discovered member list
///
/// The cache's pass-through options ride along so implementations can pick
/// up timeouts, key prefixing, serialization settings and the like.
pub trait ShardClientFactory: Send + Sync {
    fn create(&self, nodes: &[Address], options: &CacheOptions) -> Box<dyn ShardClient>;
}

/// Any closure over the node list works as a factory
impl<F> ShardClientFactory for F
where
    F: Fn(&[Address], &CacheOptions) -> Box<dyn ShardClient> + Send + Sync,
{
    fn create(&self, nodes: &[Address], options: &CacheOptions) -> Box<dyn ShardClient> {
        self(nodes, options)
    }
}
