//! Configuration-endpoint protocol client
//!
//! A configuration endpoint is a stable bootstrap address that answers
//! cluster-membership queries even as member nodes come and go. The
//! exchange is two request/response steps over one TCP connection:
//!
//! 1. `version` -> `VERSION <v>` selects the command dialect.
//! 2. `config get cluster` (v >= 1.4.14) or `get AmazonElastiCache:cluster`
//!    (older servers) -> a framed block carrying the generation counter and
//!    the member list. The response framing is identical in both dialects.

use std::time::Duration;

use tracing::{debug, warn};

use super::connection::Connection;
use crate::cluster::{Address, ClusterInfo, ServerVersion};
use crate::utils::{Error, ProtocolError, Result};

const VERSION_COMMAND: &str = "version";
const CONFIG_COMMAND: &str = "config get cluster";
const LEGACY_CONFIG_COMMAND: &str = "get AmazonElastiCache:cluster";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Cluster membership discovery seam
///
/// `ConfigurationEndpointClient` is the real implementation;
/// `ClusterAwareCache` accepts any implementor so tests can inject fakes.
pub trait Discovery {
    /// Fetch a fresh membership snapshot
    fn get_cluster_info(&self) -> Result<ClusterInfo>;
}

/// Client for the configuration-endpoint discovery protocol
pub struct ConfigurationEndpointClient {
    target: Address,
    ignore_cluster_errors: bool,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl ConfigurationEndpointClient {
    /// Create a client with default timeouts and strict error handling
    pub fn new(target: Address) -> Self {
        Self {
            target,
            ignore_cluster_errors: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// When set, a malformed version string or config block degrades to a
    /// single-member result (the bootstrap address itself) instead of a
    /// parse error. Command rejections and transport failures still
    /// propagate.
    pub fn ignore_cluster_errors(mut self, ignore: bool) -> Self {
        self.ignore_cluster_errors = ignore;
        self
    }

    pub fn timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    pub fn target(&self) -> &Address {
        &self.target
    }

    /// One full discovery exchange over a fresh connection
    fn exchange(&self) -> Result<ClusterInfo> {
        let mut conn = Connection::connect(
            &self.target.host,
            self.target.port,
            self.connect_timeout,
            self.read_timeout,
        )?;

        conn.send_command(VERSION_COMMAND)?;
        let reply = conn.read_line()?;
        let version_str = reply
            .strip_prefix("VERSION ")
            .ok_or_else(|| ProtocolError::UnknownCommand {
                reply: reply.clone(),
            })?;
        let version: ServerVersion = version_str.parse()?;

        let command = if version.supports_config_command() {
            CONFIG_COMMAND
        } else {
            LEGACY_CONFIG_COMMAND
        };
        conn.send_command(command)?;

        let header = conn.read_line()?;
        check_config_header(&header)?;

        let mut body = Vec::new();
        loop {
            let line = conn.read_line()?;
            if line == "END" {
                break;
            }
            body.push(line);
        }

        let info = ClusterInfo::from_config_body(&body)?;
        debug!(
            "configuration endpoint {} reported {} nodes at generation {}",
            self.target,
            info.num_nodes(),
            info.version
        );
        Ok(info)
    }
}

impl Discovery for ConfigurationEndpointClient {
    fn get_cluster_info(&self) -> Result<ClusterInfo> {
        match self.exchange() {
            Err(Error::Protocol(ProtocolError::Parse(reason))) if self.ignore_cluster_errors => {
                warn!(
                    "ignoring malformed cluster configuration from {} ({}); \
                     treating the endpoint as the sole member",
                    self.target, reason
                );
                Ok(ClusterInfo::fallback(self.target.clone()))
            }
            other => other,
        }
    }
}

/// Validate the framing header of the config response.
///
/// Accepts `CONFIG cluster <flags> <byte-length>` and the legacy
/// `VALUE AmazonElastiCache:cluster <flags> <byte-length>`. The byte-length
/// field must be present but is not checked against the body. An
/// `ERROR`-class reply is a command rejection, not a parse failure.
fn check_config_header(header: &str) -> std::result::Result<(), ProtocolError> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    match tokens.first().copied() {
        Some("ERROR" | "CLIENT_ERROR" | "SERVER_ERROR") => Err(ProtocolError::UnknownCommand {
            reply: header.to_string(),
        }),
        Some("CONFIG") if tokens.len() == 4 && tokens[1] == "cluster" => Ok(()),
        Some("VALUE") if tokens.len() == 4 && tokens[1] == "AmazonElastiCache:cluster" => Ok(()),
        _ => Err(ProtocolError::Parse(format!(
            "unrecognized config header: {:?}",
            header
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const EXAMPLE_CONFIG_RESPONSE: &str = "CONFIG cluster 0 147\r\n\
        12\n\
        myCluster.pc4ldq.0001.use1.cache.amazonaws.com|10.82.235.120|11211 \
        myCluster.pc4ldq.0002.use1.cache.amazonaws.com|10.80.249.27|11211\n\r\n\
        END\r\n";

    /// Spawn a one-shot fake endpoint. Replies with `version_reply` to the
    /// first command and `config_reply` to the second; received command
    /// lines are reported through the channel.
    fn spawn_endpoint(
        version_reply: &'static str,
        config_reply: &'static str,
    ) -> (Address, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            tx.send(line.trim_end().to_string()).unwrap();
            stream.write_all(version_reply.as_bytes()).unwrap();

            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) > 0 {
                tx.send(line.trim_end().to_string()).ok();
                stream.write_all(config_reply.as_bytes()).unwrap();
            }
        });

        (Address::new("127.0.0.1", port), rx)
    }

    fn received(rx: &mpsc::Receiver<String>) -> Vec<String> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_get_cluster_info() {
        let (target, rx) = spawn_endpoint("VERSION 1.4.14\r\n", EXAMPLE_CONFIG_RESPONSE);
        let info = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap();

        assert_eq!(info.version, 12);
        assert_eq!(
            info.nodes,
            vec![
                Address::new("10.82.235.120", 11211),
                Address::new("10.80.249.27", 11211),
            ]
        );
        assert_eq!(received(&rx), vec!["version", "config get cluster"]);
    }

    #[test]
    fn test_legacy_dialect_before_1_4_14() {
        let (target, rx) = spawn_endpoint("VERSION 1.4.13\r\n", EXAMPLE_CONFIG_RESPONSE);
        let info = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap();

        assert_eq!(info.num_nodes(), 2);
        assert_eq!(received(&rx), vec!["version", "get AmazonElastiCache:cluster"]);
    }

    #[test]
    fn test_modern_dialect_past_threshold() {
        let (target, rx) = spawn_endpoint("VERSION 1.4.34\r\n", EXAMPLE_CONFIG_RESPONSE);
        ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap();

        assert_eq!(received(&rx), vec!["version", "config get cluster"]);
    }

    #[test]
    fn test_legacy_value_header_accepted() {
        let (target, _rx) = spawn_endpoint(
            "VERSION 1.4.13\r\n",
            "VALUE AmazonElastiCache:cluster 0 33\r\n1\nn1|10.0.0.1|11211\n\r\nEND\r\n",
        );
        let info = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap();
        assert_eq!(info.nodes, vec![Address::new("10.0.0.1", 11211)]);
    }

    #[test]
    fn test_version_rejection_is_unknown_command() {
        let (target, _rx) = spawn_endpoint("ERROR\r\n", "");
        let err = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_config_rejection_is_unknown_command() {
        let (target, _rx) = spawn_endpoint("VERSION 1.4.13\r\n", "ERROR\r\n");
        let err = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_unknown_command_not_suppressed_by_ignore_flag() {
        let (target, _rx) = spawn_endpoint("VERSION 1.4.13\r\n", "ERROR\r\n");
        let err = ConfigurationEndpointClient::new(target)
            .ignore_cluster_errors(true)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_unparsable_version_is_parse_error() {
        let (target, _rx) = spawn_endpoint("VERSION fail\r\n", "");
        let err = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Parse(_))));
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let (target, _rx) = spawn_endpoint(
            "VERSION 1.4.34\r\n",
            "CONFIG cluster 0 147\r\nfail\nhost|ip|11211 host|ip|11211\n\r\nEND\r\n",
        );
        let err = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Parse(_))));
    }

    #[test]
    fn test_malformed_nodes_is_parse_error() {
        let (target, _rx) = spawn_endpoint(
            "VERSION 1.4.34\r\n",
            "CONFIG cluster 0 147\r\n1\nfail\n\r\nEND\r\n",
        );
        let err = ConfigurationEndpointClient::new(target)
            .get_cluster_info()
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Parse(_))));
    }

    #[test]
    fn test_ignore_errors_falls_back_to_bootstrap() {
        // No header at all; the whole reply is garbage
        let (target, _rx) = spawn_endpoint("VERSION 1.4.34\r\n", "fail\nfail\n\r\nEND\r\n");
        let bootstrap = target.clone();
        let info = ConfigurationEndpointClient::new(target)
            .ignore_cluster_errors(true)
            .get_cluster_info()
            .unwrap();

        assert_eq!(info.version, 0);
        assert_eq!(info.nodes, vec![bootstrap]);
    }

    #[test]
    fn test_connect_failure_propagates_despite_ignore_flag() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = ConfigurationEndpointClient::new(Address::new("127.0.0.1", port))
            .ignore_cluster_errors(true)
            .get_cluster_info()
            .unwrap_err();
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_check_config_header() {
        assert!(check_config_header("CONFIG cluster 0 147").is_ok());
        assert!(check_config_header("VALUE AmazonElastiCache:cluster 0 147").is_ok());
        assert!(matches!(
            check_config_header("ERROR"),
            Err(ProtocolError::UnknownCommand { .. })
        ));
        assert!(matches!(
            check_config_header("CONFIG cluster 0"),
            Err(ProtocolError::Parse(_))
        ));
        assert!(matches!(
            check_config_header("fail"),
            Err(ProtocolError::Parse(_))
        ));
    }
}
