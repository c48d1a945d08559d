//! Raw TCP connection to the configuration endpoint
//!
//! The discovery protocol is a blocking line-based text exchange: one
//! command out, one or more `\r\n`-terminated lines back. The connection
//! splits into separate buffered reader/writer halves over the same
//! stream.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::utils::ConnectionError;

/// Buffered TCP connection speaking `\r\n`-terminated text lines
pub struct Connection {
    writer: BufWriter<TcpStream>,
    reader: BufReader<TcpStream>,
}

impl Connection {
    /// Open a connection with connect and read timeouts applied.
    ///
    /// Timeouts are the only cancellation mechanism; a timed-out read
    /// abandons the whole connection.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        use std::net::ToSocketAddrs;

        let addr_str = format!("{}:{}", host, port);

        // Resolve hostname to socket address
        let addr = addr_str
            .to_socket_addrs()
            .map_err(|e| ConnectionError::ConnectFailed {
                host: host.to_string(),
                port,
                source: e,
            })?
            .next()
            .ok_or_else(|| ConnectionError::ConnectFailed {
                host: host.to_string(),
                port,
                source: io::Error::new(io::ErrorKind::NotFound, "No addresses found"),
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| {
            ConnectionError::ConnectFailed {
                host: host.to_string(),
                port,
                source: e,
            }
        })?;

        // Configure socket
        stream.set_nodelay(true).ok();
        stream.set_read_timeout(Some(read_timeout)).ok();
        stream.set_write_timeout(Some(read_timeout)).ok();

        let writer = BufWriter::new(stream.try_clone().map_err(|e| {
            ConnectionError::ConnectFailed {
                host: host.to_string(),
                port,
                source: e,
            }
        })?);
        let reader = BufReader::new(stream);

        Ok(Self { writer, reader })
    }

    /// Send a command line, appending the `\r\n` terminator
    pub fn send_command(&mut self, command: &str) -> Result<(), ConnectionError> {
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read one `\n`-terminated line, stripping the trailing `\r\n`.
    ///
    /// Returns `Closed` if the server hung up before sending a line.
    pub fn read_line(&mut self) -> Result<String, ConnectionError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(ConnectionError::Closed);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}
