//! Cache configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options for `ClusterAwareCache`
///
/// Timeouts and `ignore_cluster_errors` drive the discovery exchange; the
/// `passthrough` map is opaque to this crate and is handed to the
/// `ShardClientFactory` unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheOptions {
    /// TCP connect timeout for the configuration endpoint, in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout for the discovery exchange, in milliseconds
    pub read_timeout_ms: u64,
    /// Degrade malformed discovery replies to a single-member fallback
    /// instead of raising a parse error
    pub ignore_cluster_errors: bool,
    /// Settings forwarded verbatim to the underlying sharding client
    pub passthrough: HashMap<String, String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3_000,
            read_timeout_ms: 5_000,
            ignore_cluster_errors: false,
            passthrough: HashMap::new(),
        }
    }
}

impl CacheOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
