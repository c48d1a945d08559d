//! Cluster-aware cache wrapper
//!
//! Presents a stable cache operation surface over a cluster whose
//! membership changes over time. The underlying sharding client is
//! resolved lazily from the configuration endpoint, memoized, and thrown
//! away whenever a delegated operation fails so the next call rediscovers
//! the membership. The failing call itself is never retried.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::options::CacheOptions;
use super::shard_client::{ShardClient, ShardClientFactory, Value};
use crate::client::{ConfigurationEndpointClient, Discovery};
use crate::cluster::Address;
use crate::utils::{Error, Result};

/// The memoized sharding client plus the member list it was built from
struct ResolvedClient {
    client: Box<dyn ShardClient>,
    nodes: Vec<Address>,
}

/// Self-healing cache client over an auto-discovered cluster
///
/// Construction validates the bootstrap spec and performs no network I/O;
/// discovery happens on first use and after every invalidation. The
/// memoized client slot is mutex-guarded so concurrent first-accesses
/// single-flight discovery instead of racing it.
pub struct ClusterAwareCache {
    bootstrap: Address,
    options: CacheOptions,
    discovery: Box<dyn Discovery + Send + Sync>,
    factory: Box<dyn ShardClientFactory>,
    resolved: Mutex<Option<ResolvedClient>>,
}

impl ClusterAwareCache {
    /// Create a cache resolving membership through the real configuration
    /// endpoint at `bootstrap` (a single `host:port` string).
    pub fn new(
        bootstrap: &str,
        options: CacheOptions,
        factory: Box<dyn ShardClientFactory>,
    ) -> Result<Self> {
        let bootstrap = parse_bootstrap(bootstrap)?;
        let discovery = ConfigurationEndpointClient::new(bootstrap.clone())
            .ignore_cluster_errors(options.ignore_cluster_errors)
            .timeouts(options.connect_timeout(), options.read_timeout());
        Ok(Self {
            bootstrap,
            options,
            discovery: Box::new(discovery),
            factory,
            resolved: Mutex::new(None),
        })
    }

    /// Create a cache with an injected discoverer. This is the seam tests
    /// use to substitute a fake endpoint client.
    pub fn with_discovery(
        bootstrap: &str,
        options: CacheOptions,
        discovery: Box<dyn Discovery + Send + Sync>,
        factory: Box<dyn ShardClientFactory>,
    ) -> Result<Self> {
        let bootstrap = parse_bootstrap(bootstrap)?;
        Ok(Self {
            bootstrap,
            options,
            discovery,
            factory,
            resolved: Mutex::new(None),
        })
    }

    pub fn bootstrap(&self) -> &Address {
        &self.bootstrap
    }

    /// Member list the current client was built from, if one is resolved
    pub fn nodes(&self) -> Option<Vec<Address>> {
        self.resolved.lock().as_ref().map(|r| r.nodes.clone())
    }

    /// Drop the memoized client; the next operation rediscovers membership
    pub fn invalidate(&self) {
        *self.resolved.lock() = None;
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.with_client(|c| c.get(key))
    }

    pub fn set(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.with_client(|c| c.set(key, value))
    }

    pub fn add(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.with_client(|c| c.add(key, value))
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        self.with_client(|c| c.delete(key))
    }

    pub fn incr(&self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.with_client(|c| c.incr(key, delta))
    }

    pub fn decr(&self, key: &str, delta: u64) -> Result<Option<u64>> {
        self.with_client(|c| c.decr(key, delta))
    }

    pub fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        self.with_client(|c| c.get_many(keys))
    }

    pub fn set_many(&self, entries: &[(String, Value)]) -> Result<Vec<String>> {
        self.with_client(|c| c.set_many(entries))
    }

    pub fn delete_many(&self, keys: &[String]) -> Result<()> {
        self.with_client(|c| c.delete_many(keys))
    }

    /// Run one operation against the resolved client.
    ///
    /// The slot is taken for the duration of the call; it is only put back
    /// on success, so a failing operation leaves the slot empty and the
    /// next call re-triggers discovery. The error propagates unchanged.
    fn with_client<T>(&self, op: impl FnOnce(&mut dyn ShardClient) -> Result<T>) -> Result<T> {
        let mut slot = self.resolved.lock();
        let mut resolved = match slot.take() {
            Some(resolved) => resolved,
            None => self.resolve()?,
        };
        match op(resolved.client.as_mut()) {
            Ok(value) => {
                *slot = Some(resolved);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "cache operation failed, discarding client over {} nodes: {}",
                    resolved.nodes.len(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Discover membership and build a fresh sharding client.
    ///
    /// Transport-level discovery failures degrade to an empty member list
    /// so a connectivity blip cannot crash application startup; protocol
    /// and parse errors propagate.
    fn resolve(&self) -> Result<ResolvedClient> {
        let nodes = match self.discovery.get_cluster_info() {
            Ok(cluster_info) => {
                info!(
                    "resolved cluster membership: {} nodes at generation {}",
                    cluster_info.num_nodes(),
                    cluster_info.version
                );
                cluster_info.nodes
            }
            Err(err) if err.is_connectivity() => {
                warn!(
                    "configuration endpoint {} unreachable ({}); continuing with no members",
                    self.bootstrap, err
                );
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        let client = self.factory.create(&nodes, &self.options);
        Ok(ResolvedClient { client, nodes })
    }
}

/// Validate the bootstrap spec: exactly one well-formed `host:port` pair
fn parse_bootstrap(spec: &str) -> Result<Address> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(Error::Config("bootstrap spec is empty".to_string()));
    }
    if spec.contains(',') {
        return Err(Error::Config(format!(
            "expected exactly one configuration endpoint, got {:?}",
            spec
        )));
    }
    spec.parse().map_err(Error::Config)
}
