//! Cluster-aware cache layer
//!
//! This module provides:
//! - The self-healing cache wrapper with lazy client memoization
//! - The sharding-client collaborator traits
//! - Cache configuration

pub mod cluster_cache;
pub mod options;
pub mod shard_client;

pub use cluster_cache::ClusterAwareCache;
pub use options::CacheOptions;
pub use shard_client::{ShardClient, ShardClientFactory, Value};
