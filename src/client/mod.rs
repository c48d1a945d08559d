//! Configuration-endpoint client layer

pub mod config_endpoint;
pub mod connection;

pub use config_endpoint::{ConfigurationEndpointClient, Discovery};
pub use connection::Connection;
