//! Utility modules

pub mod error;

pub use error::{ConnectionError, Error, ProtocolError, Result};
