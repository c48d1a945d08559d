//! elasticache-discovery library
//!
//! Client for managed, horizontally-sharded memcached-style cache clusters
//! that expose an auto-discovery configuration endpoint (AWS ElastiCache).
//! Instead of hardcoding cluster member addresses, callers supply one
//! bootstrap `host:port`; the crate queries it for the live member list,
//! builds a sharding client over it, and rediscovers the membership
//! whenever that client fails.
//!
//! The two cooperating pieces are [`ConfigurationEndpointClient`], which
//! speaks the versioned discovery protocol, and [`ClusterAwareCache`],
//! which memoizes a sharding client built from the discovered members and
//! invalidates it on operation errors. The sharding client itself is an
//! external collaborator injected through [`ShardClientFactory`].

pub mod cache;
pub mod client;
pub mod cluster;
pub mod utils;

pub use cache::{CacheOptions, ClusterAwareCache, ShardClient, ShardClientFactory, Value};
pub use client::{ConfigurationEndpointClient, Discovery};
pub use cluster::{Address, ClusterInfo, ServerVersion};
pub use utils::{ConnectionError, Error, ProtocolError, Result};
