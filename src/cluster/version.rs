//! Endpoint server version parsing and comparison
//!
//! ElastiCache changed the cluster-configuration command at server version
//! 1.4.14. Versions are compared component-wise as numbers, never as
//! strings, so `1.4.9` sorts below `1.4.14`.

use std::fmt;
use std::str::FromStr;

use crate::utils::ProtocolError;

/// Numeric server version reported by the `version` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// First version that understands `config get cluster`
pub const CONFIG_COMMAND_MIN_VERSION: ServerVersion = ServerVersion {
    major: 1,
    minor: 4,
    patch: 14,
};

impl ServerVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this server speaks the modern `config get cluster` dialect
    pub fn supports_config_command(&self) -> bool {
        *self >= CONFIG_COMMAND_MIN_VERSION
    }
}

impl FromStr for ServerVersion {
    type Err = ProtocolError;

    /// Parse a dot-separated version string.
    ///
    /// Major and minor must parse as integers. The patch component may
    /// carry a non-numeric suffix (e.g. `14-beta`); only its leading
    /// digits count. Components past the third are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ProtocolError::Parse(format!("invalid version string: {:?}", s)))?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ProtocolError::Parse(format!("invalid version string: {:?}", s)))?;
        let patch = parts
            .next()
            .map(|p| {
                let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .unwrap_or(0);

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
