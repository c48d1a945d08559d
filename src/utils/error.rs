//! Error types for elasticache-discovery

use std::io;
use thiserror::Error;

/// Top-level client error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Shard client error: {0}")]
    Shard(String),
}

impl Error {
    /// Transport-level failure (refused, timeout, DNS, dropped connection).
    ///
    /// `ClusterAwareCache` degrades discovery to an empty member set on
    /// these instead of surfacing them to the caller.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("Connection closed unexpectedly")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-endpoint protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The endpoint rejected a command it was expected to understand.
    /// Never suppressed by `ignore_cluster_errors`.
    #[error("Server rejected command: {reply}")]
    UnknownCommand { reply: String },

    /// The version string or cluster config block did not match the
    /// expected grammar.
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
