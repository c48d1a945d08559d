//! Cluster membership model
//!
//! This module provides:
//! - Member and bootstrap addresses
//! - The membership snapshot returned by discovery
//! - Numeric server version comparison for dialect selection

pub mod info;
pub mod version;

pub use info::{Address, ClusterInfo};
pub use version::{ServerVersion, CONFIG_COMMAND_MIN_VERSION};
